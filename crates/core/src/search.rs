//! Cyclic find and replace over entry translations.
//!
//! Searching is case-insensitive and matches substrings. Replacement builds a
//! case-insensitive pattern from the search term verbatim, so pattern
//! metacharacters in the term keep their meaning; a term that does not
//! compile is reported instead of applied.

use crate::document::Document;
use regex::{Regex, RegexBuilder};
use tracing::trace;

/// Where a find session currently stands. The last matched position doubles
/// as the highlight: it is the one entry a replace will touch.
#[derive(Debug, Default)]
pub struct SearchState {
    term: String,
    last_match: Option<usize>,
}

/// Result of one find step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOutcome {
    /// The term was empty; nothing was searched.
    EmptyTerm,
    /// A match. `position` is the entry's place in the document, `index` its
    /// sequence number.
    Found { position: usize, index: u32 },
    /// A full cycle found nothing; the next find starts from the top again.
    NoMore,
}

/// Result of replacing in the highlighted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// There is no highlighted entry yet, or the term is empty.
    MustFindFirst,
    /// The term does not compile as a pattern.
    BadPattern(String),
    /// The highlighted entry no longer contains the term; nothing changed.
    NotInCurrent,
    /// One occurrence replaced at `position`; `then` is the automatic
    /// follow-up find.
    Replaced { position: usize, then: FindOutcome },
}

/// Result of replacing across the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceAllOutcome {
    EmptyTerm,
    BadPattern(String),
    /// `count` occurrences were substituted; `positions` lists the entries
    /// whose text actually changed.
    Done { count: usize, positions: Vec<usize> },
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry highlighted by the last successful find, if any.
    pub fn highlighted(&self) -> Option<usize> {
        self.last_match
    }

    /// The term the session last searched for.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Find the next entry whose translation contains `term`, starting just
    /// after the previous match and wrapping around the end. Changing the
    /// term restarts the session from the top. When a full cycle finds
    /// nothing the highlight is cleared, so the find after that starts from
    /// the top again.
    pub fn find_next(&mut self, doc: &Document, term: &str) -> FindOutcome {
        if term.is_empty() {
            return FindOutcome::EmptyTerm;
        }
        if self.term != term {
            trace!("search term changed to {term:?}, restarting from the top");
            self.term = term.to_string();
            self.last_match = None;
        }
        let entries = doc.entries();
        let total = entries.len();
        let needle = term.to_lowercase();
        let first = self.last_match.map_or(0, |p| p + 1);
        for offset in 0..total {
            let position = (first + offset) % total;
            if entries[position].translation.to_lowercase().contains(&needle) {
                self.last_match = Some(position);
                return FindOutcome::Found {
                    position,
                    index: entries[position].index,
                };
            }
        }
        self.last_match = None;
        FindOutcome::NoMore
    }

    /// Replace the first occurrence of `term` in the highlighted entry, then
    /// advance to the next match. Requires a successful find first.
    pub fn replace_current(
        &mut self,
        doc: &mut Document,
        term: &str,
        replacement: &str,
    ) -> ReplaceOutcome {
        let position = match self.last_match {
            Some(position) if !term.is_empty() => position,
            _ => return ReplaceOutcome::MustFindFirst,
        };
        let pattern = match compile_term(term) {
            Ok(pattern) => pattern,
            Err(e) => return ReplaceOutcome::BadPattern(e.to_string()),
        };
        let text = match doc.translation_mut(position) {
            Some(text) => text,
            // The document shrank since the find; the session is stale.
            None => {
                self.last_match = None;
                return ReplaceOutcome::MustFindFirst;
            }
        };
        if !pattern.is_match(text.as_str()) {
            return ReplaceOutcome::NotInCurrent;
        }
        let replaced = pattern.replace(text.as_str(), replacement).into_owned();
        *text = replaced;
        trace!("replaced one occurrence at position {position}");
        let then = self.find_next(doc, term);
        ReplaceOutcome::Replaced { position, then }
    }

    /// Replace every occurrence of `term` in every translation. Counts
    /// occurrences, not entries, and clears the highlight afterwards so the
    /// next find starts fresh.
    pub fn replace_all(
        &mut self,
        doc: &mut Document,
        term: &str,
        replacement: &str,
    ) -> ReplaceAllOutcome {
        if term.is_empty() {
            return ReplaceAllOutcome::EmptyTerm;
        }
        let pattern = match compile_term(term) {
            Ok(pattern) => pattern,
            Err(e) => return ReplaceAllOutcome::BadPattern(e.to_string()),
        };
        let mut count = 0;
        let mut positions = Vec::new();
        for (position, text) in doc.translations_mut().enumerate() {
            let hits = pattern.find_iter(text.as_str()).count();
            if hits == 0 {
                continue;
            }
            let replaced = pattern.replace_all(text.as_str(), replacement).into_owned();
            if replaced == *text {
                continue;
            }
            *text = replaced;
            count += hits;
            positions.push(position);
        }
        self.last_match = None;
        trace!("replaced {count} occurrence(s) across {} entries", positions.len());
        ReplaceAllOutcome::Done { count, positions }
    }
}

/// Case-insensitive pattern for `term`, taken verbatim.
fn compile_term(term: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(term).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt;

    fn doc_with(translations: &[&str]) -> Document {
        let mut entries = Vec::new();
        for (i, _) in translations.iter().enumerate() {
            let block = format!(
                "{}\n00:00:0{},000 --> 00:00:0{},500\ntext\n\n",
                i + 1,
                i + 1,
                i + 1
            );
            entries.extend(srt::parse(&block));
        }
        let mut doc = Document::new(entries);
        for (i, t) in translations.iter().enumerate() {
            doc.set_translation(i, t).unwrap();
        }
        doc
    }

    #[test]
    fn empty_term_searches_nothing() {
        let doc = doc_with(&["anything"]);
        let mut search = SearchState::new();
        assert_eq!(search.find_next(&doc, ""), FindOutcome::EmptyTerm);
        assert_eq!(search.highlighted(), None);
    }

    #[test]
    fn find_cycles_through_matches_and_wraps() {
        let doc = doc_with(&["alpha one", "beta", "alpha two"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.find_next(&doc, "alpha"),
            FindOutcome::Found { position: 0, index: 1 }
        );
        assert_eq!(
            search.find_next(&doc, "alpha"),
            FindOutcome::Found { position: 2, index: 3 }
        );
        // Wraps back around to the first match.
        assert_eq!(
            search.find_next(&doc, "alpha"),
            FindOutcome::Found { position: 0, index: 1 }
        );
    }

    #[test]
    fn single_match_is_found_again_every_time() {
        let doc = doc_with(&["nothing", "the target here", "nothing"]);
        let mut search = SearchState::new();
        for _ in 0..3 {
            assert_eq!(
                search.find_next(&doc, "target"),
                FindOutcome::Found { position: 1, index: 2 }
            );
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let doc = doc_with(&["The CAT sat"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.find_next(&doc, "cat"),
            FindOutcome::Found { position: 0, index: 1 }
        );
    }

    #[test]
    fn changing_the_term_restarts_from_the_top() {
        let doc = doc_with(&["ab", "a"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.find_next(&doc, "a"),
            FindOutcome::Found { position: 0, index: 1 }
        );
        assert_eq!(
            search.find_next(&doc, "a"),
            FindOutcome::Found { position: 1, index: 2 }
        );
        // Same letter footprint, different term: the scan starts over.
        assert_eq!(
            search.find_next(&doc, "ab"),
            FindOutcome::Found { position: 0, index: 1 }
        );
    }

    #[test]
    fn exhausted_search_reports_no_more_and_resets() {
        let doc = doc_with(&["nothing here", "the target"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.find_next(&doc, "target"),
            FindOutcome::Found { position: 1, index: 2 }
        );
        assert_eq!(search.find_next(&doc, "missing"), FindOutcome::NoMore);
        assert_eq!(search.highlighted(), None);
        // After the miss the same session starts from the top again.
        assert_eq!(
            search.find_next(&doc, "target"),
            FindOutcome::Found { position: 1, index: 2 }
        );
    }

    #[test]
    fn empty_document_finds_nothing() {
        let doc = Document::default();
        let mut search = SearchState::new();
        assert_eq!(search.find_next(&doc, "term"), FindOutcome::NoMore);
    }

    #[test]
    fn replace_requires_a_find_first() {
        let mut doc = doc_with(&["the cat"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.replace_current(&mut doc, "cat", "dog"),
            ReplaceOutcome::MustFindFirst
        );
        assert_eq!(doc.entries()[0].translation, "the cat");
    }

    #[test]
    fn replace_touches_first_occurrence_then_advances() {
        let mut doc = doc_with(&["the cat sat", "a cat too"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "cat");
        assert_eq!(
            search.replace_current(&mut doc, "cat", "dog"),
            ReplaceOutcome::Replaced {
                position: 0,
                then: FindOutcome::Found { position: 1, index: 2 },
            }
        );
        assert_eq!(doc.entries()[0].translation, "the dog sat");
        assert_eq!(
            search.replace_current(&mut doc, "cat", "dog"),
            ReplaceOutcome::Replaced {
                position: 1,
                then: FindOutcome::NoMore,
            }
        );
        assert_eq!(doc.entries()[1].translation, "a dog too");
        // Highlight is gone, so a third replace has nothing to work on.
        assert_eq!(
            search.replace_current(&mut doc, "cat", "dog"),
            ReplaceOutcome::MustFindFirst
        );
    }

    #[test]
    fn replace_changes_only_the_first_occurrence_in_the_entry() {
        let mut doc = doc_with(&["cat cat cat"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "cat");
        let outcome = search.replace_current(&mut doc, "cat", "dog");
        assert!(matches!(outcome, ReplaceOutcome::Replaced { position: 0, .. }));
        assert_eq!(doc.entries()[0].translation, "dog cat cat");
    }

    #[test]
    fn replace_is_case_insensitive() {
        let mut doc = doc_with(&["The CAT sat"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "cat");
        search.replace_current(&mut doc, "cat", "dog");
        assert_eq!(doc.entries()[0].translation, "The dog sat");
    }

    #[test]
    fn replace_reports_when_the_highlight_no_longer_matches() {
        let mut doc = doc_with(&["the cat"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "cat");
        doc.set_translation(0, "rewritten meanwhile").unwrap();
        assert_eq!(
            search.replace_current(&mut doc, "cat", "dog"),
            ReplaceOutcome::NotInCurrent
        );
        assert_eq!(doc.entries()[0].translation, "rewritten meanwhile");
    }

    #[test]
    fn unbalanced_pattern_is_reported_not_applied() {
        let mut doc = doc_with(&["bracket [ here"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "bracket");
        assert!(matches!(
            search.replace_current(&mut doc, "[", "x"),
            ReplaceOutcome::BadPattern(_)
        ));
        assert!(matches!(
            search.replace_all(&mut doc, "[", "x"),
            ReplaceAllOutcome::BadPattern(_)
        ));
        assert_eq!(doc.entries()[0].translation, "bracket [ here");
    }

    #[test]
    fn term_metacharacters_keep_their_meaning() {
        let mut doc = doc_with(&["cut the cat"]);
        let mut search = SearchState::new();
        let outcome = search.replace_all(&mut doc, "c.t", "dog");
        assert_eq!(
            outcome,
            ReplaceAllOutcome::Done { count: 2, positions: vec![0] }
        );
        assert_eq!(doc.entries()[0].translation, "dog the dog");
    }

    #[test]
    fn replace_all_counts_occurrences_not_entries() {
        let mut doc = doc_with(&["the cat sat on the cat mat", "no cats here, just a cat"]);
        let mut search = SearchState::new();
        search.find_next(&doc, "cat");
        let outcome = search.replace_all(&mut doc, "cat", "dog");
        assert_eq!(
            outcome,
            ReplaceAllOutcome::Done { count: 4, positions: vec![0, 1] }
        );
        assert_eq!(doc.entries()[0].translation, "the dog sat on the dog mat");
        assert_eq!(doc.entries()[1].translation, "no dogs here, just a dog");
        assert_eq!(search.highlighted(), None);
    }

    #[test]
    fn replace_all_with_two_matching_entries() {
        let mut doc = doc_with(&["cat sat", "the cat"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.replace_all(&mut doc, "cat", "dog"),
            ReplaceAllOutcome::Done { count: 2, positions: vec![0, 1] }
        );
    }

    #[test]
    fn replace_all_with_empty_term_does_nothing() {
        let mut doc = doc_with(&["the cat"]);
        let mut search = SearchState::new();
        assert_eq!(
            search.replace_all(&mut doc, "", "dog"),
            ReplaceAllOutcome::EmptyTerm
        );
        assert_eq!(doc.entries()[0].translation, "the cat");
    }
}
