//! This module provides parsing utilities for simulation listings (`.lst`).
//!
//! A listing starts with header lines naming the observed signals. Every data
//! line holds one sample, with each value right-aligned to the last column of
//! its signal name in the header. Composite values are written as
//! brace-nested lists, e.g. `{32'h00000010 3'h2 {1 0}}`.
use std::collections::BTreeMap;

use crate::{convert, error::FormatError};

/// Stands in for spaces inside braces, so that a composite value is a single
/// whitespace-free token while the data line is cut into columns.
const SPLIT_CHAR: char = '\u{1f}';

/// A value of one signal in one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Str(String),
    List(Vec<RawValue>),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) => Some(s),
            RawValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Str(_) => None,
            RawValue::List(items) => Some(items),
        }
    }

    /// Element `index` of a composite value.
    pub fn get(&self, index: usize) -> Option<&RawValue> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Decode a scalar value, see [`convert::to_int`]. Lists never decode.
    pub fn to_int(&self, base: u32) -> Option<u64> {
        self.as_str().and_then(|s| convert::to_int(s, base))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Column-oriented view of a listing: signal name to one value per data line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignalTable {
    signals: BTreeMap<String, Vec<RawValue>>,
    samples: usize,
}

impl SignalTable {
    /// Number of data lines.
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn signal(&self, name: &str) -> Option<&[RawValue]> {
        self.signals.get(name).map(Vec::as_slice)
    }

    /// Like [`SignalTable::signal`], but a missing signal is a format error.
    pub fn require(&self, name: &str) -> Result<&[RawValue], FormatError> {
        self.signal(name)
            .ok_or_else(|| FormatError::MissingSignal(name.to_string()))
    }

    pub fn value(&self, name: &str, sample: usize) -> Option<&RawValue> {
        self.signal(name).and_then(|values| values.get(sample))
    }
}

/// Map the column of the last character of every word to the word.
///
/// The search cursor moves forward, so repeated words and words that are
/// substrings of earlier ones are matched left to right.
fn words_end_positions(line: &str) -> BTreeMap<usize, String> {
    let mut positions = BTreeMap::new();
    let mut cursor = 0;
    for word in line.split_whitespace() {
        let Some(found) = line[cursor..].find(word) else {
            continue;
        };
        let start = cursor + found;
        let end = line[..start].chars().count() + word.chars().count() - 1;
        positions.insert(end, word.to_string());
        cursor = start + word.len();
    }
    positions
}

fn find_first_data_line(lines: &[&str]) -> Result<usize, FormatError> {
    lines
        .iter()
        .position(|line| line.trim().starts_with('0'))
        .ok_or(FormatError::NoDataLine)
}

/// The token that ends at column `end`. Empty if the column is blank or past
/// the end of the line.
fn value_by_end_index(line: &[char], end: usize) -> String {
    if end >= line.len() || line[end].is_whitespace() {
        return String::new();
    }
    let mut start = end;
    while start > 0 && !line[start - 1].is_whitespace() {
        start -= 1;
    }
    line[start..=end].iter().collect()
}

/// Replace `from` with `to` wherever it sits inside at least one pair of braces.
fn replace_inside_braces(text: &str, from: char, to: char) -> String {
    let mut depth = 0i32;
    text.chars()
        .map(|c| {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth > 0 && c == from {
                to
            } else {
                c
            }
        })
        .collect()
}

/// Decode a column token, turning a brace-nested token into a [`RawValue::List`].
fn unnest(value: &str) -> Result<RawValue, FormatError> {
    let Some(inner) = value.strip_prefix('{') else {
        return Ok(RawValue::Str(value.to_string()));
    };
    let inner = inner
        .strip_suffix('}')
        .ok_or_else(|| FormatError::UnbalancedBraces(value.replace(SPLIT_CHAR, " ")))?;

    // only the separators of this level survive as SPLIT_CHAR
    let inner = replace_inside_braces(inner, SPLIT_CHAR, ' ');
    inner
        .split(SPLIT_CHAR)
        .map(|item| unnest(&replace_inside_braces(item, ' ', SPLIT_CHAR)))
        .collect::<Result<Vec<_>, _>>()
        .map(RawValue::List)
}

/// Parse a whole listing into a [`SignalTable`].
pub fn parse(src: &str) -> Result<SignalTable, FormatError> {
    let lines: Vec<&str> = src.lines().collect();
    let first_data_line = find_first_data_line(&lines)?;
    let (header_lines, data_lines) = lines.split_at(first_data_line);

    let mut headers: BTreeMap<usize, String> = BTreeMap::new();
    for line in header_lines {
        headers.extend(words_end_positions(line));
    }

    let data_lines: Vec<Vec<char>> = data_lines
        .iter()
        .map(|line| replace_inside_braces(line, ' ', SPLIT_CHAR).chars().collect())
        .collect();

    let mut signals = BTreeMap::new();
    for (end, header) in headers {
        let values = data_lines
            .iter()
            .map(|line| unnest(&value_by_end_index(line, end)))
            .collect::<Result<Vec<_>, _>>()?;
        signals.insert(header, values);
    }
    tracing::debug!(
        "parsed {} signals over {} samples",
        signals.len(),
        data_lines.len()
    );

    Ok(SignalTable {
        signals,
        samples: data_lines.len(),
    })
}
