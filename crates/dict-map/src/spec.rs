//! Marker-to-column specification.
//!
//! [`make_spec`] resolves, per output table, which markers of a submission
//! map to which columns. Precedence is explicit: the submission's own maps
//! come first, the defaults below fill in markers whose column is not
//! already claimed.

use std::collections::{BTreeMap, BTreeSet};

use dict_model::Properties;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SpecError};

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_ENTRY_ID: &str = "lx";
pub const DEFAULT_SENSE_SEP: &str = "sn";
pub const DEFAULT_EXAMPLE_ID: &str = "ref";
/// Marker inserted into senses to cite an example.
pub const EXAMPLE_REF_MARKER: &str = "xref";
/// Separator used when joining multiple values into one cell.
pub const DEFAULT_SEPARATOR: &str = " ; ";

pub const DEFAULT_ENTRY_MAP: &[(&str, &str)] = &[
    ("lx", "Headword"),
    ("ps", "Part_Of_Speech"),
    ("al", "Alternative_Form"),
    ("et", "Etymology"),
    ("hm", "Homonym"),
    ("lc", "Citation_Form"),
    ("mn", "Main_Entry"),
    ("cf", "Entry_IDs"),
    ("cont", "Contains"),
    ("va", "Variant_Form"),
];

pub const DEFAULT_SENSE_MAP: &[(&str, &str)] = &[
    ("de", "Description"),
    ("nt", "Comment"),
    ("sc", "Scientific_Name"),
    ("sd", "Semantic_Domain"),
    ("sy", "Synonym"),
    ("zcom1", "Concepticon_ID"),
];

pub const DEFAULT_EXAMPLE_MAP: &[(&str, &str)] = &[
    ("rf", "Corpus_Reference"),
    ("tx", "Primary_Text"),
    ("mb", "Analyzed_Word"),
    ("gl", "Gloss"),
    ("ft", "Translated_Text"),
];

/// Cross-reference markers; link rewriting gives them bare IDs.
pub const DEFAULT_CROSS_REFERENCES: &[&str] = &["mn", "cf", "cont"];

/// Media markers per table.
pub const ENTRY_MEDIA_MARKER: &str = "sf";
pub const SENSE_MEDIA_MARKER: &str = "pc";
pub const EXAMPLE_MEDIA_MARKER: &str = "sfx";
pub const DEFAULT_CAPTION_MARKER: &str = "cap";

/// Which output table a mapping belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TableKind {
    Entry,
    Sense,
    Example,
}

impl TableKind {
    /// Dataset component name.
    pub fn component(self) -> &'static str {
        match self {
            TableKind::Entry => "EntryTable",
            TableKind::Sense => "SenseTable",
            TableKind::Example => "ExampleTable",
        }
    }
}

// =============================================================================
// Spec types
// =============================================================================

/// Column mapping of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSpec {
    /// Marker -> column.
    pub map: BTreeMap<String, String>,
    /// Markers that belong to this table.
    pub markers: BTreeSet<String>,
    /// Columns this table declares.
    pub columns: BTreeSet<String>,
    /// Source marker -> column whose value it cites.
    pub refs: BTreeMap<String, String>,
}

impl TableSpec {
    pub fn column(&self, marker: &str) -> Option<&str> {
        self.map.get(marker).map(String::as_str)
    }

    pub fn contains_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }
}

/// Resolved per-submission specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spec {
    pub entry: TableSpec,
    /// Separator marker name (`lx` for `\lx `).
    pub entry_sep: String,
    pub entry_id: String,
    pub sense: TableSpec,
    pub sense_sep: String,
    pub example: TableSpec,
    pub example_id: String,
    pub gloss_ref: Option<String>,
    /// Markers whose values are entry identifiers.
    pub cross_references: BTreeSet<String>,
    pub caption_marker: String,
}

impl Spec {
    pub fn table(&self, kind: TableKind) -> &TableSpec {
        match kind {
            TableKind::Entry => &self.entry,
            TableKind::Sense => &self.sense,
            TableKind::Example => &self.example,
        }
    }

    /// Whether any table cites sources.
    pub fn has_refs(&self) -> bool {
        !(self.entry.refs.is_empty() && self.sense.refs.is_empty() && self.example.refs.is_empty())
    }
}

// =============================================================================
// Derivation
// =============================================================================

fn to_owned_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(marker, column)| ((*marker).to_string(), (*column).to_string()))
        .collect()
}

fn check_injective(table: TableKind, mapping: &BTreeMap<String, String>) -> Result<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for (marker, column) in mapping {
        if let Some(first) = seen.insert(column.as_str(), marker.as_str()) {
            return Err(SpecError::DuplicateColumn {
                table: table.component(),
                column: column.clone(),
                first: first.to_string(),
                second: marker.clone(),
            });
        }
    }
    Ok(())
}

/// Merge the submission's mapping over the defaults for one table.
///
/// A default is dropped when its column is already claimed by the
/// submission's mapping. Only markers found in `marker_set` are kept. Source
/// markers (`ref_mapping`) cite the column of their target marker.
pub fn local_mapping(
    table: TableKind,
    json_mapping: &BTreeMap<String, String>,
    default_mapping: &BTreeMap<String, String>,
    marker_set: &BTreeSet<String>,
    ref_mapping: &BTreeMap<String, String>,
) -> Result<TableSpec> {
    check_injective(table, json_mapping)?;
    let claimed: BTreeSet<&String> = json_mapping.values().collect();

    let mut merged: BTreeMap<String, String> = default_mapping
        .iter()
        .filter(|(_, column)| !claimed.contains(column))
        .map(|(marker, column)| (marker.clone(), column.clone()))
        .collect();
    merged.extend(json_mapping.clone());

    let map: BTreeMap<String, String> = merged
        .into_iter()
        .filter(|(marker, _)| marker_set.contains(marker))
        .collect();

    let mut markers: BTreeSet<String> = map.keys().cloned().collect();
    let columns: BTreeSet<String> = map.values().cloned().collect();
    let refs: BTreeMap<String, String> = ref_mapping
        .iter()
        .filter(|(marker, _)| marker_set.contains(*marker))
        .filter_map(|(marker, target)| Some((marker.clone(), map.get(target)?.clone())))
        .collect();
    markers.extend(refs.keys().cloned());

    Ok(TableSpec {
        map,
        markers,
        columns,
        refs,
    })
}

/// Derive the specification for a submission whose records use `marker_set`.
pub fn make_spec(properties: &Properties, marker_set: &BTreeSet<String>) -> Result<Spec> {
    let refs = &properties.references;

    let mut entry = local_mapping(
        TableKind::Entry,
        &properties.entry_map,
        &to_owned_map(DEFAULT_ENTRY_MAP),
        marker_set,
        refs,
    )?;
    let entry_sep = properties
        .entry_sep
        .as_deref()
        .unwrap_or("\\lx ")
        .trim()
        .trim_start_matches('\\')
        .to_string();
    let entry_id = properties
        .entry_id
        .clone()
        .unwrap_or_else(|| DEFAULT_ENTRY_ID.to_string());
    entry.markers.insert(entry_sep.clone());
    entry.markers.insert(entry_id.clone());
    entry.markers.insert(ENTRY_MEDIA_MARKER.to_string());
    entry.columns.insert("Media_IDs".to_string());

    let mut sense = local_mapping(
        TableKind::Sense,
        &properties.sense_map,
        &to_owned_map(DEFAULT_SENSE_MAP),
        marker_set,
        refs,
    )?;
    let sense_sep = properties
        .sense_sep
        .clone()
        .unwrap_or_else(|| DEFAULT_SENSE_SEP.to_string());
    let caption_marker = properties
        .caption_marker
        .clone()
        .unwrap_or_else(|| DEFAULT_CAPTION_MARKER.to_string());
    sense.markers.insert(sense_sep.clone());
    sense.markers.insert(EXAMPLE_REF_MARKER.to_string());
    sense.markers.insert(SENSE_MEDIA_MARKER.to_string());
    if marker_set.contains(&caption_marker) {
        sense.markers.insert(caption_marker.clone());
    }
    sense.columns.insert("Media_IDs".to_string());

    let mut example = local_mapping(
        TableKind::Example,
        &properties.example_map,
        &to_owned_map(DEFAULT_EXAMPLE_MAP),
        marker_set,
        refs,
    )?;
    let example_id = properties
        .example_id
        .clone()
        .unwrap_or_else(|| DEFAULT_EXAMPLE_ID.to_string());
    example.markers.insert(example_id.clone());
    example.markers.insert(EXAMPLE_MEDIA_MARKER.to_string());
    example.columns.insert("Sense_IDs".to_string());
    example.columns.insert("Media_IDs".to_string());

    let gloss_ref = properties.gloss_ref.clone().filter(|m| !m.is_empty());
    if let Some(marker) = &gloss_ref {
        example.markers.insert(marker.clone());
    }

    let cross_references = resolve_cross_references(properties, marker_set, &entry, &sense)?;

    let spec = Spec {
        entry,
        entry_sep,
        entry_id,
        sense,
        sense_sep,
        example,
        example_id,
        gloss_ref,
        cross_references,
        caption_marker,
    };
    debug!(
        entry_columns = spec.entry.columns.len(),
        sense_columns = spec.sense.columns.len(),
        example_columns = spec.example.columns.len(),
        "derived specification"
    );
    Ok(spec)
}

/// Cross-reference markers that occur in the data.
///
/// Explicitly configured markers must belong to the entry or sense table;
/// defaults that are not mapped are dropped.
fn resolve_cross_references(
    properties: &Properties,
    marker_set: &BTreeSet<String>,
    entry: &TableSpec,
    sense: &TableSpec,
) -> Result<BTreeSet<String>> {
    let mapped = |marker: &str| entry.contains_marker(marker) || sense.contains_marker(marker);
    match &properties.cross_references {
        Some(configured) => {
            let mut markers = BTreeSet::new();
            for marker in configured {
                if !marker_set.contains(marker) {
                    continue;
                }
                if !mapped(marker.as_str()) {
                    return Err(SpecError::UnmappedCrossReference {
                        marker: marker.clone(),
                    });
                }
                markers.insert(marker.clone());
            }
            Ok(markers)
        }
        None => Ok(DEFAULT_CROSS_REFERENCES
            .iter()
            .copied()
            .filter(|marker| mapped(*marker))
            .map(str::to_string)
            .collect()),
    }
}
