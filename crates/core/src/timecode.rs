//! Conversion between `HH:MM:SS,mmm` timecode strings and milliseconds.
//! Parsing is deliberately permissive: anything malformed becomes zero.

use regex::Regex;

/// Parse an SRT timecode into milliseconds.
/// Only the exact `HH:MM:SS,mmm` shape is accepted (two digits for hours,
/// minutes and seconds, three for milliseconds, comma separator). Text that
/// does not match yields `0` rather than an error, mirroring how loosely
/// real-world subtitle files have to be treated.
pub fn parse(text: &str) -> i64 {
    let pattern = Regex::new(r"^([0-9]{2}):([0-9]{2}):([0-9]{2}),([0-9]{3})$").unwrap();
    let caps = match pattern.captures(text) {
        Some(caps) => caps,
        None => return 0,
    };
    let field = |i: usize| caps[i].parse::<i64>().unwrap_or(0);
    field(1) * 3_600_000 + field(2) * 60_000 + field(3) * 1000 + field(4)
}

/// Format milliseconds as `HH:MM:SS,mmm`, clamping negative values to zero.
pub fn format(ms: i64) -> String {
    let ms = ms.max(0);
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
