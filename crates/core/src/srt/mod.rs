//! This module is responsible for SRT parsing and serialization.
//! It exposes helpers to read entries out of subtitle text and to write the
//! edited document back, preserving timing lines exactly as they were read.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Represents a single subtitle entry: sequence number, raw time range,
/// source text and the translation being worked on.
///
/// The time fields hold the timecode strings exactly as they appeared in the
/// file, so writing an untouched document reproduces its timing lines
/// byte for byte. They are only parsed into milliseconds when an edit needs
/// to do arithmetic on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub index: u32,
    pub start: String,
    pub end: String,
    pub original: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub selected: bool,
}

/// Parse SRT text into a list of entries.
/// Blocks are separated by blank lines; a block needs at least a sequence
/// line and a `start --> end` time line to count. Malformed blocks are
/// dropped silently, so a file with no valid blocks parses to an empty list
/// rather than an error. An unparsable sequence number becomes `0`.
pub fn parse(input: &str) -> Vec<Entry> {
    let cleaned = input
        .trim_start_matches('\u{feff}')
        .trim()
        .replace('\r', "");
    let mut entries = Vec::new();
    let mut dropped = 0usize;
    for block in cleaned.split("\n\n") {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 2 {
            dropped += 1;
            continue;
        }
        let (start, end) = match lines[1].split_once(" --> ") {
            Some(times) => times,
            None => {
                dropped += 1;
                continue;
            }
        };
        entries.push(Entry {
            index: lines[0].trim().parse().unwrap_or(0),
            start: start.to_string(),
            end: end.to_string(),
            original: lines[2..].join("\n"),
            translation: String::new(),
            selected: false,
        });
    }
    if dropped > 0 {
        debug!("dropped {dropped} malformed block(s)");
    }
    entries
}

/// Format entries back to SRT text.
/// The way this works is by writing each entry sequentially with blank lines;
/// an entry whose translation is empty or whitespace falls back to its
/// original text, so a half-translated document still plays.
pub fn serialize(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let translated = entry.translation.trim();
        let text = if translated.is_empty() {
            entry.original.as_str()
        } else {
            translated
        };
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index, entry.start, entry.end, text
        ));
    }
    out
}
