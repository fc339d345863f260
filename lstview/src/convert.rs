//! Decoding of scalar signal values as printed by the simulator.
//!
//! Sized literals (`32'h0000001a`, `1'b1`) and plain numbers decode to an
//! integer. Unknown simulation values (`x`, `z`, `***`, a literal without
//! digits) decode to `None`, which callers treat as "not asserted".
use std::sync::OnceLock;

use regex::Regex;

fn sized_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([hb])([^']*)").unwrap())
}

fn parse_body(body: &str, radix: u32) -> Option<u64> {
    if body.is_empty() || body.to_lowercase().contains('x') {
        return None;
    }
    u64::from_str_radix(body, radix).ok()
}

/// Decode a signal value. Plain digit strings are read in `base`, anything
/// else that is not a sized literal is read as a decimal number.
pub fn to_int(value: &str, base: u32) -> Option<u64> {
    if let Some(caps) = sized_literal().captures(value) {
        let radix = if &caps[1] == "h" { 16 } else { 2 };
        return parse_body(&caps[2], radix);
    }

    let lower = value.to_lowercase();
    if lower.contains('x') || lower.contains('z') || value == "***" {
        return None;
    }
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        u64::from_str_radix(value, base).ok()
    } else {
        value.parse().ok()
    }
}

/// Decode a `N'hHEX` literal only, rejecting every other form.
pub fn sized_hex(value: &str) -> Option<u64> {
    let caps = sized_literal().captures(value)?;
    if &caps[1] != "h" {
        return None;
    }
    parse_body(&caps[2], 16)
}
