//! Process-wide property snapshots in Java `.properties` format.
//!
//! The thumbnail worker reads its configuration snapshot from a properties
//! file passed via `-p <path>`, so this byte-level text format is a wire
//! contract: `key=value` lines, `#`/`!` comments, backslash escapes, and
//! `\uXXXX` for characters outside ASCII.
//!
//! `PropertySet` is the explicit replacement for ambient system-property
//! lookups: callers load or assemble one at the boundary and pass it into
//! the command builder.

use crate::error::{JobError, Result};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

/// An ordered set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: BTreeMap<String, String>,
}

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a property value only if it is set and not blank after trimming.
    ///
    /// Optional flags in the worker command line are emitted only for
    /// non-blank values, so this is the lookup the command builder uses.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Load a property set from a `.properties` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            JobError::UserError(format!(
                "failed to read properties file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            JobError::UserError(format!(
                "failed to parse properties file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse `.properties` text.
    ///
    /// Supports `#`/`!` comments, `=`/`:`/whitespace key separators,
    /// backslash line continuations, and the standard escape sequences
    /// including `\uXXXX`.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut props = Self::new();
        let mut logical = String::new();

        for raw in text.lines() {
            // Continuation lines drop their leading whitespace.
            let line = raw.trim_start();

            if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if ends_with_odd_backslashes(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);

            let (key, value) = split_key_value(&logical);
            let key = unescape(key)?;
            let value = unescape(value)?;
            if !key.is_empty() {
                props.set(key, value);
            }
            logical.clear();
        }

        // A dangling continuation still contributes its accumulated text.
        if !logical.is_empty() {
            let (key, value) = split_key_value(&logical);
            let key = unescape(key)?;
            let value = unescape(value)?;
            if !key.is_empty() {
                props.set(key, value);
            }
        }

        Ok(props)
    }

    /// Write the set in `.properties` format, with an optional leading
    /// comment line.
    pub fn store_to<W: Write>(&self, mut out: W, comment: Option<&str>) -> io::Result<()> {
        if let Some(comment) = comment {
            for line in comment.lines() {
                writeln!(out, "#{}", line)?;
            }
        }
        for (key, value) in self.iter() {
            writeln!(out, "{}={}", escape_key(key), escape_value(value))?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

/// Whether a line ends in an odd number of backslashes (a continuation).
fn ends_with_odd_backslashes(line: &str) -> bool {
    let trailing = line.bytes().rev().take_while(|&b| b == b'\\').count();
    trailing % 2 == 1
}

/// Split a logical line into raw (still escaped) key and value parts.
fn split_key_value(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'=' | b':' => {
                return (&line[..i], line[i + 1..].trim_start());
            }
            b' ' | b'\t' => {
                let rest = line[i..].trim_start();
                // Whitespace may precede an explicit separator.
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

/// Decode `.properties` escape sequences.
fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err(format!("truncated \\u escape '\\u{}'", hex));
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid \\u escape '\\u{}'", hex))?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| format!("invalid \\u escape '\\u{}'", hex))?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

fn escape_key(key: &str) -> String {
    escape(key, true)
}

fn escape_value(value: &str) -> String {
    let mut escaped = escape(value, false);
    // Leading whitespace in a value must be escaped to survive parsing.
    if escaped.starts_with(' ') {
        escaped.insert(0, '\\');
    }
    escaped
}

fn escape(text: &str, escape_space: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if escape_space => out.push_str("\\ "),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
