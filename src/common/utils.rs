//! Utility functions for mogilefs

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;

/// Form-encoding set: everything except ASCII alphanumerics and `-_.`
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Encode a string the way HTML forms (and the tracker) expect it.
/// Spaces become `+`.
pub fn url_encode(s: &str) -> String {
    utf8_percent_encode(s, FORM_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

/// Decode a form-encoded string. `+` is a space; invalid UTF-8 is replaced.
pub fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Convert fractional seconds from configuration into a `Duration`
pub fn secs_to_duration(secs: f64) -> crate::Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(crate::Error::InvalidConfig(format!(
            "invalid timeout: {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
