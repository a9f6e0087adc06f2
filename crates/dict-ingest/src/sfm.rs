//! SFM (Standard Format Marker) reading and writing.
//!
//! An SFM file is a sequence of `\marker value` lines. Records start at every
//! line carrying the entry separator marker; anything before the first
//! separator is a file header and is skipped.

use std::collections::BTreeMap;
use std::path::Path;

use dict_model::{Category, Diagnostics, MarkerRecord, Properties};
use tracing::debug;

use crate::encoding::{DEFAULT_ENCODING, decode};
use crate::error::{IngestError, Result};

/// Default entry separator.
pub const DEFAULT_ENTRY_SEP: &str = "\\lx ";

/// Marker renames applied to every submission unless overridden.
pub const DEFAULT_MARKER_MAP: &[(&str, &str)] = &[
    ("d_Eng", "de"),
    ("g_Eng", "ge"),
    ("ps_Eng", "ps"),
    ("sc_Eng", "sc"),
    ("sd_Eng", "sd"),
    ("x_Eng", "xe"),
];

/// What to do with a non-blank line that carries no marker and does not
/// continue a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineMode {
    /// Drop the line and record a parse warning.
    #[default]
    Lenient,
    /// Fail with [`IngestError::MalformedLine`].
    Strict,
}

/// Options for [`read_sfm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Separator written like `\lx ` (leading backslash, trailing space optional).
    pub entry_sep: String,
    /// Marker renames applied at read time.
    pub marker_map: BTreeMap<String, String>,
    pub encoding: String,
    pub line_mode: LineMode,
    /// Keep fields whose trimmed value is empty.
    pub keep_empty: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            entry_sep: DEFAULT_ENTRY_SEP.to_string(),
            marker_map: BTreeMap::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            line_mode: LineMode::Lenient,
            keep_empty: false,
        }
    }
}

impl ReadOptions {
    /// Options for a submission's main dictionary file.
    ///
    /// The default marker map is applied first; the submission's own
    /// `marker_map` wins on conflicts.
    pub fn from_properties(properties: &Properties) -> Self {
        let mut marker_map: BTreeMap<String, String> = DEFAULT_MARKER_MAP
            .iter()
            .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
            .collect();
        marker_map.extend(properties.marker_map.clone());
        Self {
            entry_sep: properties
                .entry_sep
                .clone()
                .unwrap_or_else(|| DEFAULT_ENTRY_SEP.to_string()),
            marker_map,
            encoding: properties
                .encoding
                .clone()
                .unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
            line_mode: if properties.strict {
                LineMode::Strict
            } else {
                LineMode::Lenient
            },
            keep_empty: false,
        }
    }

    #[must_use]
    pub fn with_entry_sep(mut self, entry_sep: impl Into<String>) -> Self {
        self.entry_sep = entry_sep.into();
        self
    }

    #[must_use]
    pub fn with_marker_map<I, K, V>(mut self, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.marker_map = map
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    #[must_use]
    pub fn with_line_mode(mut self, line_mode: LineMode) -> Self {
        self.line_mode = line_mode;
        self
    }

    #[must_use]
    pub fn with_keep_empty(mut self, keep_empty: bool) -> Self {
        self.keep_empty = keep_empty;
        self
    }

    /// Separator marker name without backslash and whitespace.
    pub fn separator_marker(&self) -> &str {
        self.entry_sep.trim().trim_start_matches('\\')
    }

    fn map_marker(&self, marker: &str) -> String {
        self.marker_map
            .get(marker)
            .cloned()
            .unwrap_or_else(|| marker.to_string())
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Split a line into `(marker, value)` if it starts with a marker.
fn split_marker_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('\\')?;
    let first = rest.chars().next()?;
    if !first.is_alphanumeric() {
        return None;
    }
    match rest.find(char::is_whitespace) {
        Some(end) => Some((&rest[..end], &rest[end..])),
        None => Some((rest, "")),
    }
}

struct OpenField {
    marker: String,
    lines: Vec<String>,
}

struct RecordBuilder<'a> {
    options: &'a ReadOptions,
    records: Vec<MarkerRecord>,
    current: Option<MarkerRecord>,
    field: Option<OpenField>,
}

impl<'a> RecordBuilder<'a> {
    fn new(options: &'a ReadOptions) -> Self {
        Self {
            options,
            records: Vec::new(),
            current: None,
            field: None,
        }
    }

    fn close_field(&mut self) {
        let (Some(field), Some(record)) = (self.field.take(), self.current.as_mut()) else {
            return;
        };
        let value = field.lines.join("\n").trim().to_string();
        if value.is_empty() && !self.options.keep_empty {
            return;
        }
        record.push(field.marker, value);
    }

    fn start_record(&mut self) {
        self.close_field();
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
        self.current = Some(MarkerRecord::new());
    }

    fn open_field(&mut self, marker: &str, value: &str) {
        self.close_field();
        if self.current.is_some() {
            self.field = Some(OpenField {
                marker: self.options.map_marker(marker),
                lines: vec![value.trim_end().to_string()],
            });
        }
    }

    fn finish(mut self) -> Vec<MarkerRecord> {
        self.close_field();
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
        self.records
    }
}

/// Parse SFM text into records.
///
/// Lines directly following a field without a marker continue that field and
/// are joined with `\n`. Any other line without a marker is handled according
/// to [`ReadOptions::line_mode`].
pub fn read_sfm(
    text: &str,
    options: &ReadOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<MarkerRecord>> {
    let separator = options.separator_marker().to_string();
    let mut builder = RecordBuilder::new(options);
    let mut after_blank = false;
    let mut header_lines = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.starts_with("\\_") {
            builder.close_field();
            after_blank = false;
            continue;
        }
        if let Some((marker, value)) = split_marker_line(line) {
            if marker == separator {
                builder.start_record();
            }
            if builder.current.is_none() {
                header_lines += 1;
            } else {
                builder.open_field(marker, value);
            }
            after_blank = false;
            continue;
        }
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        if builder.current.is_none() {
            header_lines += 1;
            continue;
        }
        match builder.field.as_mut() {
            Some(field) if !after_blank => field.lines.push(line.trim_end().to_string()),
            _ => match options.line_mode {
                LineMode::Strict => {
                    return Err(IngestError::MalformedLine {
                        line: line_number,
                        text: line.to_string(),
                    });
                }
                LineMode::Lenient => {
                    diagnostics.warning(
                        Category::Parse,
                        Some(&format!("line {line_number}")),
                        format!("skipping line without marker: {:?}", line.trim()),
                    );
                }
            },
        }
    }

    if header_lines > 0 {
        debug!(lines = header_lines, "skipped SFM header");
    }
    Ok(builder.finish())
}

/// Read and decode an SFM file.
pub fn read_sfm_file(
    path: &Path,
    options: &ReadOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<MarkerRecord>> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let text = decode(&bytes, &options.encoding)?;
    let records = read_sfm(&text, options, diagnostics)?;
    debug!(path = %path.display(), records = records.len(), "read SFM file");
    Ok(records)
}

// =============================================================================
// Writing
// =============================================================================

/// Serialize records as SFM text, separated by blank lines.
pub fn write_records(records: &[MarkerRecord]) -> Result<String> {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        record
            .validate_markers()
            .map_err(|source| IngestError::InvalidRecord { source })?;
        if index > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&record.to_string());
    }
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

/// Write records to `path` as UTF-8 SFM.
pub fn write_sfm_file(path: &Path, records: &[MarkerRecord]) -> Result<()> {
    let text = write_records(records)?;
    std::fs::write(path, text).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
