pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod models;
pub mod query;
pub mod seed;
pub mod store;

pub use config::{Backend, ReadPolicy, StoreConfig};
pub use error::{RecordKind, Result, StorageFault, StoreError};
pub use store::RecordStore;
