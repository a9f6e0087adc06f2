/// Prefix for generated entry identifiers.
pub const ENTRY_ID_PREFIX: &str = "LX";
/// Prefix for generated sense identifiers.
pub const SENSE_ID_PREFIX: &str = "SN";
/// Prefix for generated example identifiers.
pub const EXAMPLE_ID_PREFIX: &str = "XV";

/// Sequential identifier source: `{prefix}000001`, `{prefix}000002`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    prefix: String,
    last: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.last
    }

    pub fn next_id(&mut self) -> String {
        self.last += 1;
        format!("{}{:06}", self.prefix, self.last)
    }
}
