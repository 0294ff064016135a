//! Core library for the subedit subtitle translation editor.
//! Parsing, the document model, find and replace, and draft autosave live
//! here; the terminal front end lives in the `subedit` binary crate.

pub mod autosave;
pub mod document;
pub mod search;
pub mod session;
pub mod srt;
pub mod timecode;
