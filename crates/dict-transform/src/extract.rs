//! Extraction of in-line examples from entries.
//!
//! Entries carry examples as runs of markers (`\rf`, `\xv`, `\xvm`, `\xeg`,
//! `\xe`, ...). [`ExampleExtractionStateMachine`] walks an entry once,
//! cuts these runs into [`Example`]s and leaves an `\xref` marker in the
//! entry where each example was. Entry markers that show up while an
//! example is still open are held back until the example is finished, so
//! that the `\xref` lands in front of them.
//!
//! An example is complete once it has both a text (`\tx`) and a translation
//! (`\ft`). Incomplete examples are reported and dropped.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use dict_model::{Category, Diagnostics, HEADWORD_MARKER, MarkerRecord};
use tracing::debug;

use crate::corpus::{Corpus, Examples};
use crate::example::{Example, LEMMA_MARKER, REF_MARKER, slug};
use crate::visit::{Outcome, Visitor};

/// Entry markers of in-line examples and their example marker.
pub const EXAMPLE_MARKER_MAP: &[(&str, &str)] = &[
    ("rf", "rf"),
    ("xv", "tx"),
    ("xvm", "mb"),
    ("xeg", "gl"),
    ("xo", "ot"),
    ("xn", "ot"),
    ("xr", "ota"),
    ("xe", "ft"),
    ("sfx", "sfx"),
];

/// Markers that may open an example.
pub const EXAMPLE_START_MARKERS: &[&str] = &["lemma", "ref", "rf", "tx"];

/// Markers that close an example.
pub const EXAMPLE_END_MARKERS: &[&str] = &["ft"];

/// Marker left in the entry for each extracted example.
pub const XREF_MARKER: &str = "xref";

/// Markers compared when two examples are merged.
const MERGE_MARKERS: &[&str] = &["rf", "tx", "mb", "gl", "ft", "ot"];

fn map_example_marker(marker: &str) -> &str {
    EXAMPLE_MARKER_MAP
        .iter()
        .find(|(from, _)| *from == marker)
        .map_or(marker, |(_, to)| *to)
}

/// Receives the examples and problems found by the state machine.
pub trait ExampleSink {
    /// Store a finished example and return the id it is stored under.
    fn store(&mut self, example: Example) -> String;

    /// Record an example that was dropped.
    fn incomplete(&mut self, headword: &str, problem: &str, example: &Example);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Beginning,
    Middle,
    End,
}

/// Splits the markers of one entry into entry markers and examples.
pub struct ExampleExtractionStateMachine<'a, S: ExampleSink> {
    markers: &'a BTreeSet<String>,
    sink: &'a mut S,
    entry: MarkerRecord,
    example: Example,
    buffer: Vec<(String, String)>,
    state: State,
}

impl<'a, S: ExampleSink> ExampleExtractionStateMachine<'a, S> {
    /// `markers` are the entry markers treated as example markers.
    pub fn new(markers: &'a BTreeSet<String>, sink: &'a mut S) -> Self {
        Self {
            markers,
            sink,
            entry: MarkerRecord::new(),
            example: Example::new(),
            buffer: Vec::new(),
            state: State::Beginning,
        }
    }

    pub fn process_marker(&mut self, marker: &str, value: &str) {
        if self.markers.contains(marker) {
            let mapped = map_example_marker(marker);
            match self.state {
                State::Beginning => self.beginning(mapped, value),
                State::Middle => self.middle(mapped, value),
                State::End => self.end(mapped, value),
            }
        } else if !self.example.is_empty() {
            self.buffer.push((marker.to_string(), value.to_string()));
        } else {
            self.entry.push(marker, value);
        }
    }

    fn beginning(&mut self, marker: &str, value: &str) {
        if marker == "tx" && self.example.contains("tx") {
            self.report("missing xe");
            self.drop_example();
        }
        self.example.push(marker, value);
        if EXAMPLE_END_MARKERS.contains(&marker) {
            self.state = State::End;
        } else if !EXAMPLE_START_MARKERS.contains(&marker) {
            self.state = State::Middle;
        }
    }

    fn middle(&mut self, marker: &str, value: &str) {
        if marker != "tx" && EXAMPLE_START_MARKERS.contains(&marker) {
            self.finish_example();
            self.state = State::Beginning;
        }
        self.example.push(marker, value);
        if EXAMPLE_END_MARKERS.contains(&marker) {
            self.state = State::End;
        }
    }

    fn end(&mut self, marker: &str, value: &str) {
        if EXAMPLE_START_MARKERS.contains(&marker) {
            self.finish_example();
            self.example.push(marker, value);
        } else if marker == "ft" && self.example.get_non_empty("ft").is_some() {
            // A second translation: the open example is finished and the
            // translation starts one that has no text.
            self.finish_example();
            self.example.push(marker, value);
            self.report("missing xv");
            self.drop_example();
        } else {
            self.example.push(marker, value);
        }
    }

    fn report(&mut self, problem: &str) {
        let headword = self.entry.get(HEADWORD_MARKER).unwrap_or_default().to_string();
        self.sink.incomplete(&headword, problem, &self.example);
    }

    fn drop_example(&mut self) {
        self.example = Example::new();
        self.state = State::Beginning;
    }

    /// Close the open example and flush held-back entry markers.
    pub fn finish_example(&mut self) {
        if !self.example.is_empty() {
            if self.example.get_non_empty("tx").is_none() {
                self.report("missing xv");
            } else if self.example.get_non_empty("ft").is_none() {
                self.report("missing xe");
            } else {
                let mut example = std::mem::take(&mut self.example);
                if let Some(lx) = self.entry.get_non_empty(HEADWORD_MARKER) {
                    example.set(LEMMA_MARKER, lx);
                }
                example.concat_multilines();
                let id = self.sink.store(example);
                self.entry.push(XREF_MARKER, id);
            }
        }
        self.drop_example();
        self.entry.extend(self.buffer.drain(..));
    }

    /// Finish the last example and return the entry markers.
    pub fn into_entry(mut self) -> MarkerRecord {
        self.finish_example();
        self.entry
    }
}

// =============================================================================
// Example store
// =============================================================================

/// Why two examples could not be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub marker: &'static str,
}

/// Fill gaps of `first` from `second`.
///
/// Fails when both have a value for one of `rf tx mb gl ft ot` and the
/// values differ beyond case, punctuation and spacing. Lemmas of `second`
/// missing from `first` are added in sorted order.
pub fn merge(first: &Example, second: &Example) -> Result<Example, MergeConflict> {
    let mut merged = first.clone();
    for &marker in MERGE_MARKERS {
        let ours = merged.get_non_empty(marker).map(str::to_string);
        let theirs = second.get_non_empty(marker);
        match (ours, theirs) {
            (Some(ours), Some(theirs)) => {
                if slug(&ours) != slug(theirs) {
                    return Err(MergeConflict { marker });
                }
            }
            (None, Some(theirs)) => merged.set(marker, theirs),
            _ => {}
        }
    }
    let known: BTreeSet<String> = merged.lemmas().into_iter().collect();
    let added: BTreeSet<String> = second
        .lemmas()
        .into_iter()
        .filter(|lemma| !known.contains(lemma))
        .collect();
    merged.set(
        LEMMA_MARKER,
        added.into_iter().collect::<Vec<_>>().join(" ; "),
    );
    Ok(merged)
}

/// Collects extracted examples, merging duplicates and corpus data, and
/// writes the text of `examples.log`.
#[derive(Debug, Default)]
pub struct ExampleStore {
    examples: Examples,
    corpus: Corpus,
    log: String,
    incomplete: usize,
}

impl ExampleStore {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus,
            ..Self::default()
        }
    }

    pub fn examples(&self) -> &Examples {
        &self.examples
    }

    /// Text of `examples.log`.
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Number of dropped examples.
    pub fn incomplete(&self) -> usize {
        self.incomplete
    }

    pub fn into_parts(self) -> (Examples, String) {
        (self.examples, self.log)
    }

    fn merge_logged(&mut self, first: &Example, second: &Example) -> Option<Example> {
        match merge(first, second) {
            Ok(merged) => Some(merged),
            Err(MergeConflict { marker }) => {
                let _ = write!(
                    self.log,
                    "# cannot merge \\{marker}:\n{first}\n# and\n{second}\n\n"
                );
                None
            }
        }
    }

    /// Store `example` and return its id.
    ///
    /// An example citing a corpus utterance (`\rf`) is completed from the
    /// corpus. An example whose id is taken is merged into the stored one,
    /// or renamed to `{id}---{n}` when the two conflict.
    pub fn xref(&mut self, example: Example) -> String {
        let mut example = example;
        if let Some(reference) = example.corpus_ref().filter(|r| !r.trim().is_empty())
            && let Some(from_corpus) = self.corpus.get(reference).cloned()
            && let Some(merged) = self.merge_logged(&example, &from_corpus)
        {
            example = merged;
        }

        let original = example.ensure_id();
        let mut count = 0;
        loop {
            let id = example.ensure_id();
            let Some(stored) = self.examples.get(&id).cloned() else {
                break;
            };
            if let Some(merged) = self.merge_logged(&stored, &example) {
                example = merged;
                break;
            }
            count += 1;
            example.set(REF_MARKER, format!("{original}---{count}"));
        }

        let id = example.ensure_id();
        self.examples.insert(example);
        id
    }
}

/// [`ExampleSink`] of one visit: stores into an [`ExampleStore`] and reports
/// into [`Diagnostics`].
struct VisitSink<'a> {
    store: &'a mut ExampleStore,
    diagnostics: &'a mut Diagnostics,
}

impl ExampleSink for VisitSink<'_> {
    fn store(&mut self, example: Example) -> String {
        self.store.xref(example)
    }

    fn incomplete(&mut self, headword: &str, problem: &str, example: &Example) {
        let _ = write!(
            self.store.log,
            "# incomplete example in lx: {headword} - {problem}:\n{example}\n\n"
        );
        self.store.incomplete += 1;
        self.diagnostics.warning(
            Category::Example,
            Some(&format!("\\lx {headword}")),
            format!("incomplete example: {problem}"),
        );
    }
}

// =============================================================================
// Visitor
// =============================================================================

/// Extracts in-line examples from every entry.
#[derive(Debug)]
pub struct ExampleExtractor {
    markers: BTreeSet<String>,
    store: ExampleStore,
}

impl ExampleExtractor {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            markers: EXAMPLE_MARKER_MAP
                .iter()
                .map(|(from, _)| (*from).to_string())
                .collect(),
            store: ExampleStore::new(corpus),
        }
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn into_store(self) -> ExampleStore {
        self.store
    }

    /// Run the state machine over one entry.
    pub fn extract(&mut self, record: &MarkerRecord, diagnostics: &mut Diagnostics) -> MarkerRecord {
        let mut sink = VisitSink {
            store: &mut self.store,
            diagnostics,
        };
        let mut machine = ExampleExtractionStateMachine::new(&self.markers, &mut sink);
        for (marker, value) in record.iter() {
            machine.process_marker(marker, value);
        }
        machine.into_entry()
    }
}

impl Visitor for ExampleExtractor {
    fn visit(&mut self, record: &MarkerRecord, diagnostics: &mut Diagnostics) -> Outcome {
        let before = self.store.examples().len();
        let entry = self.extract(record, diagnostics);
        debug!(
            headword = record.get(HEADWORD_MARKER).unwrap_or_default(),
            examples = self.store.examples().len() - before,
            "extracted examples"
        );
        if entry == *record {
            Outcome::Keep
        } else {
            Outcome::Replace(entry)
        }
    }

    fn visitor_name(&self) -> &str {
        "example_extractor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MarkerRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn extracts_example_and_leaves_xref() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(
            &record(&[
                ("lx", "cat"),
                ("hm", "1"),
                ("xv", "The cat sat."),
                ("xe", "The cat sat."),
                ("ps", "N"),
            ]),
            &mut diagnostics,
        );

        let examples = extractor.store().examples();
        assert_eq!(examples.len(), 1);
        let example = examples.iter().next().unwrap();
        assert_eq!(example.text(), Some("The cat sat."));
        assert_eq!(example.translation(), Some("The cat sat."));
        assert_eq!(example.lemmas(), vec!["cat"]);

        let markers: Vec<_> = entry.iter().map(|(m, _)| m).collect();
        assert_eq!(markers, vec!["lx", "hm", "xref", "ps"]);
        assert_eq!(entry.get("xref"), Some(example.id().as_str()));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn entry_markers_inside_example_follow_the_xref() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(
            &record(&[
                ("lx", "a"),
                ("xv", "t"),
                ("nt", "note"),
                ("xe", "f"),
                ("de", "d"),
            ]),
            &mut diagnostics,
        );
        let markers: Vec<_> = entry.iter().map(|(m, _)| m).collect();
        assert_eq!(markers, vec!["lx", "xref", "nt", "de"]);
    }

    #[test]
    fn text_without_translation_is_dropped_and_logged() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(
            &record(&[("lx", "a"), ("xv", "lonely"), ("xv", "t"), ("xe", "f")]),
            &mut diagnostics,
        );
        assert_eq!(entry.count("xref"), 1);
        assert_eq!(extractor.store().incomplete(), 1);
        insta::assert_snapshot!(extractor.store().log(), @r"
        # incomplete example in lx: a - missing xe:
        \ref
        \lemma
        \rf
        \tx lonely
        \mb
        \gl
        \ft
        \ot
        \ota
        \sfx
        ");
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn trailing_text_at_end_of_entry_is_dropped() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(
            &record(&[("lx", "a"), ("xv", "t"), ("xe", "f"), ("xv", "open")]),
            &mut diagnostics,
        );
        assert_eq!(entry.count("xref"), 1);
        assert_eq!(extractor.store().examples().len(), 1);
        assert!(extractor.store().log().contains("missing xe"));
    }

    #[test]
    fn second_translation_is_reported_as_missing_text() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(
            &record(&[("lx", "a"), ("xv", "t"), ("xe", "f"), ("xe", "g")]),
            &mut diagnostics,
        );
        assert_eq!(entry.count("xref"), 1);
        assert!(extractor.store().log().contains("a - missing xv"));
    }

    #[test]
    fn duplicate_examples_are_merged_with_lemmas() {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let first = extractor.extract(
            &record(&[("lx", "cat"), ("xv", "The cat."), ("xe", "Cat.")]),
            &mut diagnostics,
        );
        let second = extractor.extract(
            &record(&[("lx", "the"), ("xv", "the cat"), ("xe", "cat")]),
            &mut diagnostics,
        );
        assert_eq!(first.get("xref"), second.get("xref"));
        let examples = extractor.store().examples();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples.iter().next().unwrap().lemmas(), vec!["cat", "the"]);
    }

    #[test]
    fn conflicting_examples_with_same_ref_are_renamed() {
        let mut store = ExampleStore::default();
        let a = Example::from(record(&[("ref", "X.1"), ("tx", "one"), ("ft", "f")]));
        let b = Example::from(record(&[("ref", "X.1"), ("tx", "two"), ("ft", "f")]));
        assert_eq!(store.xref(a), "X.1");
        assert_eq!(store.xref(b), "X.1---1");
        assert!(store.log().starts_with("# cannot merge \\tx:"));
    }

    #[test]
    fn corpus_fills_missing_analysis() {
        let corpus = Corpus::new(
            [Example::from(record(&[
                ("ref", "Abc.034"),
                ("tx", "The cat sat."),
                ("mb", "the cat sat"),
                ("gl", "DET cat sit"),
            ]))]
            .into_iter()
            .collect(),
        );
        let mut store = ExampleStore::new(corpus);
        let id = store.xref(Example::from(record(&[
            ("rf", "Abc.34"),
            ("tx", "The cat sat"),
            ("ft", "Le chat."),
        ])));
        let stored = store.examples().get(&id).unwrap();
        assert_eq!(stored.get("gl"), Some("DET cat sit"));
        assert_eq!(stored.get("mb"), Some("the cat sat"));
    }
}
