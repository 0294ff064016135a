//! The in-memory subtitle document: an ordered list of entries plus the
//! structural edits the editor performs on them. Every mutation that changes
//! the shape of the list renumbers entries so sequence numbers stay 1..=len.

use crate::srt::Entry;
use crate::timecode;
use thiserror::Error;
use tracing::debug;

/// Smallest millisecond gap between two neighbouring entries that still
/// leaves room to insert a new one between them.
pub const MIN_INSERT_GAP_MS: i64 = 200;

/// Longest line a translation can have before it is flagged as too wide for
/// comfortable subtitle display.
pub const CHAR_LIMIT_PER_LINE: usize = 42;

/// Placeholder text given to freshly inserted entries.
pub const NEW_ENTRY_TEXT: &str = "[New Line]";

/// Why a document edit was rejected. The document is left untouched whenever
/// one of these comes back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no entry is selected")]
    NoSelection,
    #[error("select exactly one entry to insert before")]
    MultipleSelection,
    #[error("cannot insert before the first entry")]
    InsertBeforeFirst,
    #[error("insufficient gap between #{prev_index} and #{next_index}: {gap_ms} ms, need at least {MIN_INSERT_GAP_MS} ms")]
    InsufficientGap {
        prev_index: u32,
        next_index: u32,
        gap_ms: i64,
    },
    #[error("no entry at position {position}")]
    OutOfRange { position: usize },
}

/// Aggregate selection state, the kind a select-all control keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    All,
    Some,
    None,
}

/// An ordered subtitle document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the translation of the entry at `position`.
    pub fn set_translation(&mut self, position: usize, text: &str) -> Result<(), EditError> {
        let entry = self.entry_mut(position)?;
        entry.translation = text.to_string();
        Ok(())
    }

    /// Copy the original text of the entry at `position` into its translation.
    pub fn copy_original(&mut self, position: usize) -> Result<(), EditError> {
        let entry = self.entry_mut(position)?;
        entry.translation = entry.original.clone();
        Ok(())
    }

    pub fn set_selected(&mut self, position: usize, selected: bool) -> Result<(), EditError> {
        self.entry_mut(position)?.selected = selected;
        Ok(())
    }

    pub fn select_all(&mut self, selected: bool) {
        for entry in &mut self.entries {
            entry.selected = selected;
        }
    }

    /// Report whether all, some or none of the entries are selected. An empty
    /// document counts as having no selection.
    pub fn selection_state(&self) -> SelectionState {
        let selected = self.entries.iter().filter(|e| e.selected).count();
        if selected == 0 {
            SelectionState::None
        } else if selected == self.entries.len() {
            SelectionState::All
        } else {
            SelectionState::Some
        }
    }

    /// Insert a placeholder entry before the single selected one.
    ///
    /// The new entry takes the time between its neighbours: it starts one
    /// millisecond after the previous entry ends and ends one millisecond
    /// before the next begins, which is why the gap between them must be at
    /// least [`MIN_INSERT_GAP_MS`]. Exactly one entry must be selected, and it
    /// cannot be the first. Returns the position of the new entry.
    pub fn insert_before_selected(&mut self) -> Result<usize, EditError> {
        let selected: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selected)
            .map(|(position, _)| position)
            .collect();
        let target = match selected.as_slice() {
            [] => return Err(EditError::NoSelection),
            [one] => *one,
            _ => return Err(EditError::MultipleSelection),
        };
        if target == 0 {
            return Err(EditError::InsertBeforeFirst);
        }
        let prev = &self.entries[target - 1];
        let next = &self.entries[target];
        let prev_end = timecode::parse(&prev.end);
        let next_start = timecode::parse(&next.start);
        let gap_ms = next_start - prev_end;
        if gap_ms < MIN_INSERT_GAP_MS {
            return Err(EditError::InsufficientGap {
                prev_index: prev.index,
                next_index: next.index,
                gap_ms,
            });
        }
        self.entries.insert(
            target,
            Entry {
                index: 0,
                start: timecode::format(prev_end + 1),
                end: timecode::format(next_start - 1),
                original: NEW_ENTRY_TEXT.to_string(),
                translation: String::new(),
                selected: false,
            },
        );
        self.reindex();
        debug!("inserted entry at position {target}");
        Ok(target)
    }

    /// Delete every selected entry. Returns how many were removed.
    pub fn delete_selected(&mut self) -> Result<usize, EditError> {
        let before = self.entries.len();
        self.entries.retain(|e| !e.selected);
        let removed = before - self.entries.len();
        if removed == 0 {
            return Err(EditError::NoSelection);
        }
        self.reindex();
        debug!("deleted {removed} selected entry(ies)");
        Ok(removed)
    }

    pub(crate) fn translation_mut(&mut self, position: usize) -> Option<&mut String> {
        self.entries.get_mut(position).map(|e| &mut e.translation)
    }

    pub(crate) fn translations_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.entries.iter_mut().map(|e| &mut e.translation)
    }

    fn entry_mut(&mut self, position: usize) -> Result<&mut Entry, EditError> {
        self.entries
            .get_mut(position)
            .ok_or(EditError::OutOfRange { position })
    }

    /// Renumber entries 1..=len in document order.
    fn reindex(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.index = position as u32 + 1;
        }
    }
}

/// True when any line of `text` runs past `limit` characters.
pub fn exceeds_line_limit(text: &str, limit: usize) -> bool {
    text.lines().any(|line| line.chars().count() > limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt;

    fn sample() -> Document {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:05,000 --> 00:00:06,000\nWorld\n\n";
        Document::new(srt::parse(input))
    }

    #[test]
    fn set_translation_and_copy_original() {
        let mut doc = sample();
        doc.set_translation(0, "Bonjour").unwrap();
        assert_eq!(doc.entries()[0].translation, "Bonjour");
        doc.copy_original(1).unwrap();
        assert_eq!(doc.entries()[1].translation, "World");
        assert_eq!(
            doc.set_translation(5, "x"),
            Err(EditError::OutOfRange { position: 5 })
        );
    }

    #[test]
    fn selection_state_tracks_all_some_none() {
        let mut doc = sample();
        assert_eq!(doc.selection_state(), SelectionState::None);
        doc.set_selected(0, true).unwrap();
        assert_eq!(doc.selection_state(), SelectionState::Some);
        doc.select_all(true);
        assert_eq!(doc.selection_state(), SelectionState::All);
        doc.select_all(false);
        assert_eq!(doc.selection_state(), SelectionState::None);
        assert_eq!(Document::default().selection_state(), SelectionState::None);
    }

    #[test]
    fn insert_requires_exactly_one_selected_entry() {
        let mut doc = sample();
        assert_eq!(doc.insert_before_selected(), Err(EditError::NoSelection));
        doc.select_all(true);
        assert_eq!(
            doc.insert_before_selected(),
            Err(EditError::MultipleSelection)
        );
    }

    #[test]
    fn insert_before_first_entry_is_rejected() {
        let mut doc = sample();
        doc.set_selected(0, true).unwrap();
        assert_eq!(doc.insert_before_selected(), Err(EditError::InsertBeforeFirst));
    }

    /// The inserted entry sits one millisecond inside each neighbour and the
    /// document renumbers itself around it.
    #[test]
    fn insert_takes_the_time_between_neighbours() {
        let mut doc = sample();
        doc.set_selected(1, true).unwrap();
        let position = doc.insert_before_selected().unwrap();
        assert_eq!(position, 1);
        assert_eq!(doc.len(), 3);
        let inserted = &doc.entries()[1];
        assert_eq!(inserted.index, 2);
        assert_eq!(inserted.start, "00:00:02,001");
        assert_eq!(inserted.end, "00:00:04,999");
        assert_eq!(inserted.original, "[New Line]");
        assert!(!inserted.selected);
        assert_eq!(doc.entries()[2].index, 3);
        assert_eq!(doc.entries()[2].original, "World");
    }

    #[test]
    fn insert_needs_a_two_hundred_millisecond_gap() {
        let tight = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n2\n00:00:02,199 --> 00:00:03,000\nB\n\n";
        let mut doc = Document::new(srt::parse(tight));
        doc.set_selected(1, true).unwrap();
        assert_eq!(
            doc.insert_before_selected(),
            Err(EditError::InsufficientGap {
                prev_index: 1,
                next_index: 2,
                gap_ms: 199,
            })
        );

        let wide = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n2\n00:00:02,200 --> 00:00:03,000\nB\n\n";
        let mut doc = Document::new(srt::parse(wide));
        doc.set_selected(1, true).unwrap();
        assert_eq!(doc.insert_before_selected(), Ok(1));
        assert_eq!(doc.entries()[1].start, "00:00:02,001");
        assert_eq!(doc.entries()[1].end, "00:00:02,199");
    }

    #[test]
    fn delete_removes_every_selected_entry_and_renumbers() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n\n3\n00:00:05,000 --> 00:00:06,000\nC\n\n";
        let mut doc = Document::new(srt::parse(input));
        doc.set_selected(0, true).unwrap();
        doc.set_selected(2, true).unwrap();
        assert_eq!(doc.delete_selected(), Ok(2));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.entries()[0].index, 1);
        assert_eq!(doc.entries()[0].original, "B");
    }

    #[test]
    fn delete_with_nothing_selected_is_an_error() {
        let mut doc = sample();
        assert_eq!(doc.delete_selected(), Err(EditError::NoSelection));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn line_limit_flags_only_overlong_lines() {
        assert!(!exceeds_line_limit("", CHAR_LIMIT_PER_LINE));
        assert!(!exceeds_line_limit("short line", CHAR_LIMIT_PER_LINE));
        let exactly = "x".repeat(CHAR_LIMIT_PER_LINE);
        assert!(!exceeds_line_limit(&exactly, CHAR_LIMIT_PER_LINE));
        let over = "x".repeat(CHAR_LIMIT_PER_LINE + 1);
        assert!(exceeds_line_limit(&over, CHAR_LIMIT_PER_LINE));
        let mixed = format!("fine\n{over}\nfine");
        assert!(exceeds_line_limit(&mixed, CHAR_LIMIT_PER_LINE));
    }
}
