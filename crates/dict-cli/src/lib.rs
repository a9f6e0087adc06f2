//! Library side of the `dictionaria` binary: the submission pipeline, the
//! maintenance commands and logging setup.

pub mod commands;
pub mod logging;
pub mod pipeline;
pub mod types;
