//! Submission metadata (`md.json`) and processing properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Submission metadata as stored in `md.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub authors: Vec<Author>,
    pub language: Language,
    #[serde(default)]
    pub date_published: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub properties: Properties,
}

impl Metadata {
    /// Comma-separated author names.
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(Author::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Language identifier used in output rows: ISO code, else Glottocode.
    pub fn language_id(&self) -> &str {
        self.language
            .isocode
            .as_deref()
            .filter(|code| !code.is_empty())
            .or(self.language.glottocode.as_deref())
            .unwrap_or_default()
    }
}

/// An author, either a bare name or an object with a `name` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Detailed { name: String },
}

impl Author {
    pub fn name(&self) -> &str {
        match self {
            Author::Name(name) | Author::Detailed { name } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    #[serde(default)]
    pub glottocode: Option<String>,
    #[serde(default)]
    pub isocode: Option<String>,
}

/// Per-submission processing properties.
///
/// Every field is optional; defaults are applied where the properties are
/// consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    /// Input encoding label (e.g. `utf-8`, `windows-1252`).
    pub encoding: Option<String>,
    /// Entry separator, written like `\lx `.
    pub entry_sep: Option<String>,
    /// Marker renames applied while reading.
    pub marker_map: BTreeMap<String, String>,
    pub entry_map: BTreeMap<String, String>,
    pub sense_map: BTreeMap<String, String>,
    pub example_map: BTreeMap<String, String>,
    pub entry_id: Option<String>,
    pub sense_sep: Option<String>,
    pub example_id: Option<String>,
    /// Source markers: marker -> marker whose column they cite.
    pub references: BTreeMap<String, String>,
    /// Markers whose values are entry references.
    pub cross_references: Option<Vec<String>>,
    pub process_links_in_labels: Vec<String>,
    pub link_display_label: Option<String>,
    pub entry_label_as_regex_for_link: Option<String>,
    /// Marker holding the `text segnum` reference into the gloss file.
    pub gloss_ref: Option<String>,
    /// Additional catalog submission ids whose media may be referenced.
    pub media_sids: Vec<String>,
    /// Display titles: marker -> label.
    pub labels: BTreeMap<String, String>,
    /// Fail on lines without a marker instead of skipping them.
    pub strict: bool,
    pub caption_marker: Option<String>,
    pub marker_fallbacks: Vec<MarkerFallbackRule>,
    pub merge_markers: Vec<MergeMarkersRule>,
    /// Drop entries with missing or conflicting `\ps`.
    pub required_parts_of_speech: bool,
}

/// Fill an empty `target` marker from `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerFallbackRule {
    pub target: String,
    pub source: String,
    #[serde(default)]
    pub scope: FallbackScope,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackScope {
    #[default]
    Entry,
    Sense,
}

/// Merge adjacent runs of `markers` into one `into` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMarkersRule {
    pub markers: Vec<String>,
    pub into: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_metadata() {
        let md: Metadata = serde_json::from_str(
            r#"{
                "authors": ["A. Author", {"name": "B. Author", "affiliation": "X"}],
                "language": {"name": "Teop", "glottocode": "teop1238"},
                "date_published": "2018-01-01",
                "properties": {"entry_map": {"xx": "Custom"}, "strict": true}
            }"#,
        )
        .expect("parse md.json");
        assert_eq!(md.author_names(), "A. Author, B. Author");
        assert_eq!(md.language_id(), "teop1238");
        assert_eq!(md.properties.entry_map.get("xx").map(String::as_str), Some("Custom"));
        assert!(md.properties.strict);
        assert!(md.properties.gloss_ref.is_none());
    }

    #[test]
    fn isocode_wins_over_glottocode() {
        let language = Language {
            name: "Teop".to_string(),
            glottocode: Some("teop1238".to_string()),
            isocode: Some("tio".to_string()),
        };
        let md = Metadata {
            language,
            ..Metadata::default()
        };
        assert_eq!(md.language_id(), "tio");
    }

    #[test]
    fn parses_fallback_rules() {
        let props: Properties = serde_json::from_str(
            r#"{"marker_fallbacks": [{"target": "de", "source": "ge", "scope": "sense"}],
                "merge_markers": [{"markers": ["pc", "cap"], "into": "pc"}]}"#,
        )
        .expect("parse properties");
        assert_eq!(props.marker_fallbacks[0].scope, FallbackScope::Sense);
        assert_eq!(props.merge_markers[0].into, "pc");
    }
}
