//! File operations on top of the tracker client
//!
//! - `file_store`: store, fetch, list, rename and delete
//! - `transfer`: the byte-moving collaborator and its HTTP implementation

pub mod file_store;
pub mod transfer;

pub use file_store::FileStore;
pub use transfer::{
    HttpTransfer, Method, Transfer, TransferBody, TransferRequest, TransferResponse,
};
