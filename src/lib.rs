//! # mogilefs
//!
//! An async client for MogileFS-style storage clusters:
//! - Ordered failover across interchangeable trackers
//! - Line-oriented tracker protocol codec
//! - Two-phase uploads (reserve, transfer, confirm)
//! - Reads that fall back across replicas
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │          FileStore           │  store / fetch / list_paths
//! │                              │  rename / delete
//! └───────┬──────────────┬───────┘
//!         │              │ PUT / GET
//! ┌───────▼───────┐  ┌───▼──────────────┐
//! │ TrackerClient │  │ Transfer (HTTP)  │
//! │  (failover)   │  └───┬──────────────┘
//! └───────┬───────┘      │
//!         │ TCP, one     │
//!         │ line per op  │
//! ┌───────▼───────┐  ┌───▼──────────────┐
//! │ tracker A, B… │  │ storage nodes    │
//! └───────────────┘  └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use mogilefs::{ClientConfig, FileStore};
//!
//! # async fn run() -> mogilefs::Result<()> {
//! let config = ClientConfig {
//!     trackers: vec!["tracker1:7001".into(), "tracker2:7001".into()],
//!     domain: "photos".into(),
//!     ..Default::default()
//! };
//! let store = FileStore::from_config(&config)?;
//!
//! store.store("cat.jpg", b"...".to_vec(), None).await?;
//! let bytes = store.fetch("cat.jpg").await?;
//! store.rename("cat.jpg", "kitten.jpg").await?;
//! store.delete("kitten.jpg").await?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```
//!
//! ### CLI
//! ```bash
//! mogile --tracker tracker1:7001,tracker2:7001 --domain photos put cat.jpg --file ./cat.jpg
//! mogile --domain photos get cat.jpg --output ./out.jpg
//! mogile --domain photos paths cat.jpg
//! ```

pub mod common;
pub mod store;
pub mod tracker;

// Re-export commonly used types
pub use common::{ClientConfig, ConnectionSettings, DomainConfig, Error, Result, TrackerEndpoint};
pub use store::{FileStore, HttpTransfer, Transfer};
pub use tracker::TrackerClient;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
