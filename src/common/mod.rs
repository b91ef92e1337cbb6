//! Common utilities and types shared across mogilefs

pub mod config;
pub mod error;
pub mod utils;

pub use config::{ClientConfig, ConnectionSettings, DomainConfig, TrackerEndpoint};
pub use error::{Error, Result};
pub use utils::{secs_to_duration, url_decode, url_encode};
