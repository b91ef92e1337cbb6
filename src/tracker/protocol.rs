//! Tracker wire protocol
//!
//! One command per line, one response per line:
//!
//! ```text
//! request:  CREATE_OPEN&key=a&domain=photos&class=default\n
//! success:  OK devid=1&fid=42&path=http%3A%2F%2Fnode1%2Fdev1%2Fa\r\n
//! failure:  ERR unknown_key Unknown+key\r\n
//! ```
//!
//! Keys and values are form-encoded on the wire. Nothing here does I/O.

use crate::common::{url_decode, url_encode, Error, Result};
use std::collections::HashMap;

/// Line terminator written after every command
pub const LINE_TERMINATOR: &str = "\n";

/// A tracker command with its arguments in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<(String, String)>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.push((key.into(), value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Value of the last argument named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The key a tracker error refers to: `key`, else `from_key` (RENAME)
    pub fn subject_key(&self) -> &str {
        self.get("key").or_else(|| self.get("from_key")).unwrap_or("")
    }

    /// Encode as a full wire line, terminator included
    pub fn encode(&self) -> String {
        let mut line = self.name.clone();
        for (key, value) in &self.args {
            line.push('&');
            line.push_str(&url_encode(key));
            line.push('=');
            line.push_str(&url_encode(value));
        }
        line.push_str(LINE_TERMINATOR);
        line
    }
}

/// Decoded response fields.
///
/// Keeps first-seen order; a repeated key overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a form-encoded query string (`a=1&b=2`)
    pub fn parse_query(query: &str) -> Self {
        let mut fields = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            fields.insert(url_decode(key), url_decode(value));
        }
        fields
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Fields::get`], but a missing field is a protocol error
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::Protocol(format!("response is missing field '{}'", key)))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.entries.into_iter().collect()
    }

    /// Encode back into a form-encoded query string
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A decoded tracker response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(Fields),
    Err {
        code: Option<String>,
        raw_line: String,
    },
}

/// Decode one response line.
///
/// An empty line or a status other than `OK`/`ERR` is a protocol violation.
pub fn decode(line: &str) -> Result<Response> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(Error::Protocol("empty response line".into()));
    }

    let (status, remainder) = line.split_once(' ').unwrap_or((line, ""));
    match status {
        "OK" => {
            // First token; extra spaces after OK are skipped, not an empty payload
            let query = remainder.split_whitespace().next().unwrap_or("");
            Ok(Response::Ok(Fields::parse_query(query)))
        }
        "ERR" => Ok(Response::Err {
            code: remainder.split_whitespace().next().map(str::to_string),
            raw_line: line.to_string(),
        }),
        _ => Err(Error::Protocol(format!(
            "unrecognized response: {}",
            url_decode(line).trim()
        ))),
    }
}

/// Build an `OK` line carrying `fields`
pub fn ok_line(fields: &Fields) -> String {
    format!("OK {}\r\n", fields.to_query_string())
}

/// Build an `ERR` line with an error code and human-readable message
pub fn err_line(code: &str, message: &str) -> String {
    format!("ERR {} {}\r\n", code, url_encode(message))
}

/// Where CREATE_OPEN told us to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub path: String,
    pub devid: String,
    pub fid: String,
}

impl FileLocation {
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            path: fields.require("path")?.to_string(),
            devid: fields.require("devid")?.to_string(),
            fid: fields.require("fid")?.to_string(),
        })
    }
}
