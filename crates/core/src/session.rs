//! One editing session: a parsed document, its search state and the autosave
//! slot derived from the file content. This is the surface a front end talks
//! to; every edit that changes a translation also lands in the store.

use crate::autosave::{self, AutosaveStore, Translations};
use crate::document::{Document, EditError, SelectionState};
use crate::search::{FindOutcome, ReplaceAllOutcome, ReplaceOutcome, SearchState};
use crate::srt;
use thiserror::Error;
use tracing::{info, trace};

/// Why a file could not be opened as an editing session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{name} is not an .srt file")]
    NotSrt { name: String },
    #[error("no usable entries in the subtitle file")]
    NoEntries,
}

/// Outcome of an autosave write. Failures carry the reason but never abort
/// the edit that triggered them; the document keeps the change either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Failed(String),
}

/// Outcome of looking for a previous session at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A stored slot was applied; `count` drafts landed on entries.
    Restored { count: usize },
    /// Nothing stored for this content.
    Nothing,
}

/// A live editing session over one subtitle file.
#[derive(Debug)]
pub struct Session {
    file_name: String,
    doc: Document,
    search: SearchState,
    store: AutosaveStore,
    key: String,
}

impl Session {
    /// Open a session over `content`, which was read from `file_name`.
    /// The name must end in `.srt` (case-sensitive) and the content must
    /// parse to at least one entry.
    pub fn open(
        file_name: &str,
        content: &str,
        store: AutosaveStore,
    ) -> Result<Self, SessionError> {
        trace!("open file_name={file_name}");
        if !file_name.ends_with(".srt") {
            return Err(SessionError::NotSrt {
                name: file_name.to_string(),
            });
        }
        let entries = srt::parse(content);
        if entries.is_empty() {
            return Err(SessionError::NoEntries);
        }
        let key = autosave::derive_key(content);
        info!("opened {file_name}: {} entries, slot {key}", entries.len());
        Ok(Self {
            file_name: file_name.to_string(),
            doc: Document::new(entries),
            search: SearchState::new(),
            store,
            key,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Bring back drafts stored for this content, if any. Stored positions
    /// that fall outside the current document are ignored.
    pub fn restore_autosave(&mut self) -> RestoreOutcome {
        let Some(saved) = self.store.load_all(&self.key) else {
            return RestoreOutcome::Nothing;
        };
        let mut count = 0;
        for (position, text) in &saved {
            let Ok(position) = position.parse::<usize>() else {
                continue;
            };
            if self.doc.set_translation(position, text).is_ok() {
                count += 1;
            }
        }
        info!("restored {count} auto-saved draft(s)");
        RestoreOutcome::Restored { count }
    }

    /// Set one translation and autosave it.
    pub fn set_translation(
        &mut self,
        position: usize,
        text: &str,
    ) -> Result<SaveStatus, EditError> {
        self.doc.set_translation(position, text)?;
        Ok(self.autosave_one(position))
    }

    /// Copy the entry's original text into its translation and autosave.
    pub fn copy_original(&mut self, position: usize) -> Result<SaveStatus, EditError> {
        self.doc.copy_original(position)?;
        Ok(self.autosave_one(position))
    }

    pub fn set_selected(&mut self, position: usize, selected: bool) -> Result<(), EditError> {
        self.doc.set_selected(position, selected)
    }

    pub fn select_all(&mut self, selected: bool) {
        self.doc.select_all(selected)
    }

    pub fn selection_state(&self) -> SelectionState {
        self.doc.selection_state()
    }

    /// Insert a new entry before the single selected one, then rewrite the
    /// whole autosave slot, since every position from there on has shifted.
    /// The search session restarts; its positions are stale too.
    pub fn insert_before_selected(&mut self) -> Result<(usize, SaveStatus), EditError> {
        let position = self.doc.insert_before_selected()?;
        self.search = SearchState::new();
        Ok((position, self.autosave_rewrite()))
    }

    /// Delete every selected entry, then rewrite the autosave slot.
    /// Returns how many entries went away.
    pub fn delete_selected(&mut self) -> Result<(usize, SaveStatus), EditError> {
        let removed = self.doc.delete_selected()?;
        self.search = SearchState::new();
        Ok((removed, self.autosave_rewrite()))
    }

    pub fn find_next(&mut self, term: &str) -> FindOutcome {
        self.search.find_next(&self.doc, term)
    }

    /// Replace in the highlighted entry and advance. The touched entry is
    /// autosaved when something actually changed.
    pub fn replace_current(
        &mut self,
        term: &str,
        replacement: &str,
    ) -> (ReplaceOutcome, Option<SaveStatus>) {
        let outcome = self.search.replace_current(&mut self.doc, term, replacement);
        let save = match &outcome {
            ReplaceOutcome::Replaced { position, .. } => Some(self.autosave_one(*position)),
            _ => None,
        };
        (outcome, save)
    }

    /// Replace across the whole document, autosaving every changed entry.
    /// When several writes fail the last failure wins; all are attempted.
    pub fn replace_all(
        &mut self,
        term: &str,
        replacement: &str,
    ) -> (ReplaceAllOutcome, Option<SaveStatus>) {
        let outcome = self.search.replace_all(&mut self.doc, term, replacement);
        let save = match &outcome {
            ReplaceAllOutcome::Done { positions, .. } if !positions.is_empty() => {
                let mut status = SaveStatus::Saved;
                for &position in positions {
                    if let SaveStatus::Failed(reason) = self.autosave_one(position) {
                        status = SaveStatus::Failed(reason);
                    }
                }
                Some(status)
            }
            _ => None,
        };
        (outcome, save)
    }

    /// Serialize the current document, translations over originals.
    pub fn render(&self) -> String {
        srt::serialize(self.doc.entries())
    }

    /// Output name for the translated file: the first `.srt` in the source
    /// name becomes `_translated.srt`. A `.srt` in the middle of a name moves
    /// the suffix there; that oddity is accepted rather than special-cased.
    pub fn output_file_name(&self) -> String {
        self.file_name.replacen(".srt", "_translated.srt", 1)
    }

    /// Drop this file's autosave slot.
    pub fn clear_autosave(&self) -> SaveStatus {
        match self.store.clear(&self.key) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => SaveStatus::Failed(e.to_string()),
        }
    }

    fn autosave_one(&self, position: usize) -> SaveStatus {
        let text = &self.doc.entries()[position].translation;
        match self.store.save(&self.key, position, text) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => SaveStatus::Failed(e.to_string()),
        }
    }

    fn autosave_rewrite(&self) -> SaveStatus {
        let translations: Translations = self
            .doc
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.translation.is_empty())
            .map(|(position, e)| (position.to_string(), e.translation.clone()))
            .collect();
        match self.store.save_all(&self.key, &translations) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => SaveStatus::Failed(e.to_string()),
        }
    }
}
