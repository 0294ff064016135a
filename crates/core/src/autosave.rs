//! Content-addressed persistence for in-progress translations.
//! Each source file gets one JSON slot named after a hash of its content, so
//! reopening the same file finds its drafts no matter what the file is called.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Saved drafts for one slot: entry position (as a decimal string) to
/// translation text. Positions with no draft are simply absent.
pub type Translations = BTreeMap<String, String>;

/// Derive the storage key for a file's content.
///
/// The hash walks the text's UTF-16 code units with wrapping 32-bit
/// arithmetic, so the same content always lands in the same slot and the key
/// survives unchanged across sessions. The signed value can come out
/// negative; the minus sign just becomes part of the key. Distinct contents
/// can collide, in which case they share (and overwrite) one slot.
pub fn derive_key(content: &str) -> String {
    let mut hash: i32 = 0;
    for unit in content.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    format!("srt-translation-{hash}")
}

/// File-backed store for translation drafts, one `<key>.json` per slot under
/// a root directory.
#[derive(Debug, Clone)]
pub struct AutosaveStore {
    root: PathBuf,
}

impl AutosaveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record one translation under `key`, keeping the rest of the slot.
    /// A missing or unreadable slot starts over empty.
    pub fn save(&self, key: &str, position: usize, text: &str) -> Result<()> {
        trace!("autosave key={key} position={position}");
        let mut translations = self.load_all(key).unwrap_or_default();
        translations.insert(position.to_string(), text.to_string());
        self.write_slot(key, &translations)
    }

    /// Replace the whole slot for `key` in one write. Used after edits that
    /// shift positions around, where merging would keep stale drafts.
    pub fn save_all(&self, key: &str, translations: &Translations) -> Result<()> {
        trace!("autosave key={key} rewriting {} draft(s)", translations.len());
        self.write_slot(key, translations)
    }

    /// Load the slot for `key`; `None` when it is absent or unreadable.
    /// A corrupt slot is reported and treated as absent, so the next save
    /// starts a fresh one rather than failing forever.
    pub fn load_all(&self, key: &str) -> Option<Translations> {
        let path = self.slot_path(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("cannot read autosave slot {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(translations) => Some(translations),
            Err(e) => {
                warn!("ignoring corrupt autosave slot {}: {e}", path.display());
                None
            }
        }
    }

    /// Drop the slot for `key` entirely. Removing a slot that never existed
    /// is fine.
    pub fn clear(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("cleared autosave slot {key}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing autosave slot {}", path.display()))
            }
        }
    }

    fn write_slot(&self, key: &str, translations: &Translations) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating autosave directory {}", self.root.display()))?;
        let json = serde_json::to_string(translations)?;
        let path = self.slot_path(key);
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!("wrote {} draft(s) to {}", translations.len(), path.display());
        Ok(())
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}
