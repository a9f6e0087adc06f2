//! Marker reordering within an entry.
//!
//! Some submissions put a bracketed `\rf [source]` after the translation of
//! an example, and `\xsf`/`\xo`/`\xr` after `\xe`. These are moved back into
//! the example block they belong to. A backward search never crosses the
//! previous occurrence of the moved marker, so one example's markers cannot
//! be pulled into an earlier example.

use std::sync::LazyLock;

use dict_model::{Diagnostics, MarkerRecord};
use regex::Regex;

use crate::visit::{Outcome, Visitor};

/// Bracketed source reference: `[text]`, `[[ text ]]`.
static IN_BRACKETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[+\s*(?P<text>[^\]]+)\s*\]+$").expect("Invalid bracket regex")
});

/// Markers moved in front of the preceding `\xe` of their span.
pub const TRAILING_EXAMPLE_MARKERS: &[&str] = &["xsf", "xo", "xr"];

/// A pending move: delete at `from`, insert at `to` with `value`.
struct Move {
    to: usize,
    from: usize,
    value: String,
}

fn apply_moves(record: &mut MarkerRecord, marker: &str, moves: Vec<Move>) {
    // `to < from` for every move and moves are collected in index order, so
    // each delete-insert pair leaves later indices untouched.
    for Move { to, from, value } in moves {
        record.remove(from);
        record.insert(to, marker, value);
    }
}

/// Search backward from `start` down to, but excluding, `floor` for `marker`.
fn find_back(record: &MarkerRecord, start: usize, floor: usize, marker: &str) -> Option<usize> {
    (floor + 1..=start)
        .rev()
        .find(|&i| record.marker_at(i) == Some(marker))
}

/// Move each `marker` in front of the nearest preceding `before`.
pub fn move_marker(record: &mut MarkerRecord, marker: &str, before: &str) {
    let mut moves = Vec::new();
    let mut last = 0;
    for (index, (name, value)) in record.iter().enumerate() {
        if name != marker {
            continue;
        }
        if index > 0
            && let Some(to) = find_back(record, index - 1, last, before)
        {
            moves.push(Move {
                to,
                from: index,
                value: value.to_string(),
            });
        }
        last = index;
    }
    apply_moves(record, marker, moves);
}

/// Relocate bracketed `\rf` values and trailing example markers.
pub fn rearrange(record: &MarkerRecord) -> MarkerRecord {
    let mut out = record.clone();
    let mut moves = Vec::new();
    let mut last_rf = 0;
    for (index, (marker, value)) in record.iter().enumerate() {
        if marker != "rf" {
            continue;
        }
        if let Some(caps) = IN_BRACKETS.captures(value.trim()) {
            let text = caps["text"].trim().to_string();
            let after_translation = index > 0 && record.marker_at(index - 1) == Some("xe");
            if after_translation {
                if index >= 2
                    && let Some(to) = find_back(record, index - 2, last_rf, "xv")
                {
                    moves.push(Move {
                        to,
                        from: index,
                        value: text,
                    });
                }
            } else {
                out.replace_at(index, text);
            }
        }
        last_rf = index;
    }
    apply_moves(&mut out, "rf", moves);
    for marker in TRAILING_EXAMPLE_MARKERS {
        move_marker(&mut out, marker, "xe");
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rearrange;

impl Visitor for Rearrange {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        let rearranged = rearrange(record);
        if rearranged == *record {
            Outcome::Keep
        } else {
            Outcome::Replace(rearranged)
        }
    }

    fn visitor_name(&self) -> &str {
        "rearrange"
    }
}
