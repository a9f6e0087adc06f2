//! Link processing settings.

use std::collections::BTreeSet;

use dict_model::Properties;
use regex::Regex;

use crate::error::{Result, SpecError};

pub const DEFAULT_LINK_DISPLAY_LABEL: &str = "lx";
/// Markers whose rewritten links carry the bare target ID.
pub const LINKS_WITH_NO_LABEL: &[&str] = &["mn", "cf", "cont"];

/// Settings for rewriting entry labels into links.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Markers whose values are scanned for entry labels.
    pub markers: BTreeSet<String>,
    /// Entry marker used as link text.
    pub display_label: String,
    /// Pattern matching an entry label inside a value.
    pub regex: Regex,
}

/// Link settings for a submission, or `None` when no markers are configured.
///
/// Requesting link processing without `entry_label_as_regex_for_link` is a
/// configuration error.
pub fn link_settings(properties: &Properties) -> Result<Option<LinkSettings>> {
    let markers: BTreeSet<String> = properties.process_links_in_labels.iter().cloned().collect();
    if markers.is_empty() {
        return Ok(None);
    }
    let pattern = properties
        .entry_label_as_regex_for_link
        .as_deref()
        .ok_or(SpecError::MissingProperty {
            property: "entry_label_as_regex_for_link",
        })?;
    let regex = Regex::new(pattern).map_err(|source| SpecError::InvalidRegex {
        property: "entry_label_as_regex_for_link",
        source,
    })?;
    Ok(Some(LinkSettings {
        markers,
        display_label: properties
            .link_display_label
            .clone()
            .unwrap_or_else(|| DEFAULT_LINK_DISPLAY_LABEL.to_string()),
        regex,
    }))
}
