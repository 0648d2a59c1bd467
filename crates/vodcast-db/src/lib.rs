//! Vodcast catalog crate
//!
//! The `VideoCatalog` is the metadata record store: one `VideoRecord` per
//! uploaded asset. The engine only needs create/read/update/delete access
//! keyed by video id; the surrounding application owns every business field
//! beyond storage bookkeeping.

pub mod catalog;
pub mod memory;
pub mod postgres;

pub use catalog::VideoCatalog;
pub use memory::InMemoryVideoCatalog;
pub use postgres::PgVideoCatalog;
