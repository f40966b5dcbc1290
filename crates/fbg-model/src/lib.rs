//! Data model for the feedback grid.
//!
//! The feedback grid overlays user annotations ("status", "comments") on top of
//! a read-only, paginated dataset served by an analytics engine. This crate holds
//! the types every other crate exchanges:
//!
//! - [`key`]: natural and synthetic row keys
//! - [`layout`]: column definitions and the designated key column
//! - [`matrix`]: engine page requests and the raw cell matrix
//! - [`row`]: projected rows with read-only and overlay fields
//! - [`annotation`]: records of the remote, append-only annotation log
//! - [`page`]: derived pagination info
//! - [`edit`]: the local buffer of unsaved edits
//! - [`batch`]: per-save result accounting
//! - [`notice`]: the non-fatal message channel

pub mod annotation;
pub mod batch;
pub mod edit;
pub mod identity;
pub mod key;
pub mod layout;
pub mod matrix;
pub mod notice;
pub mod page;
pub mod row;

pub use annotation::AnnotationRecord;
pub use batch::{BatchResult, ItemError, NO_CHANGES_MESSAGE, WriteErrorKind};
pub use edit::EditBuffer;
pub use identity::Identity;
pub use key::RowKey;
pub use layout::{
    ColumnDef, ColumnKind, GridLayout, LayoutError, RESERVED_COLUMN_IDS, is_safe_identifier,
};
pub use matrix::{EngineCell, PageMatrix, PageRequest};
pub use notice::{Notice, NoticeKind, NoticeReceiver, Notices};
pub use page::PageInfo;
pub use row::{Header, OverlayCell, OverlayField, ReadonlyCell, ReadonlyField, Row};
