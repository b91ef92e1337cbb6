//! Mapping of tracker `ERR` codes to error kinds

use crate::common::{url_decode, Error};

pub const UNKNOWN_KEY: &str = "unknown_key";
pub const EMPTY_FILE: &str = "empty_file";
pub const NONE_MATCH: &str = "none_match";

/// Turn an `ERR` response into an [`Error`].
///
/// `key` is the key the failed request was about; it only feeds the message.
pub fn map_tracker_error(code: Option<&str>, raw_line: &str, key: &str) -> Error {
    let key = key.to_string();
    match code {
        Some(UNKNOWN_KEY) => Error::UnknownKey { key },
        Some(EMPTY_FILE) => Error::EmptyFile { key },
        Some(NONE_MATCH) => Error::NoneMatch { key },
        _ => Error::Protocol(url_decode(raw_line).trim().to_string()),
    }
}
