//! Client for the remote annotation log.
//!
//! The log is append-only: each save adds a new `(dataset, key, version)`
//! record and the current annotation of a key is its highest version.
//!
//! - [`AnnotationStore`] is the seam the rest of the workspace talks to
//! - [`HttpAnnotationStore`] reaches the remote store
//! - [`InMemoryAnnotationStore`] keeps the log in process
//!
//! Fetch responses are decoded through [`Envelope`], which accepts every
//! response shape the store is known to produce.

pub mod envelope;
pub mod error;
pub mod http;
pub mod instruction;
pub mod memory;
pub mod record;
pub mod store;

pub use envelope::{Envelope, WRAPPER_KEYS};
pub use error::{Result, StoreError};
pub use http::{HttpAnnotationStore, StoreConfig, decode_records};
pub use instruction::{insert_statement, sanitize_identifier};
pub use memory::InMemoryAnnotationStore;
pub use record::{NormalizedRecords, normalize_items, normalize_record, parse_timestamp};
pub use store::{AnnotationStore, fetch_all_or_empty, report_fetch_error};
