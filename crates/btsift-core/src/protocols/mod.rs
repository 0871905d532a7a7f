//! Protocol decoding modules.
//!
//! Each layer follows the same structure:
//! - `layout`: byte offsets, ranges and protocol constants (source of truth)
//! - `parser`: domain-level decoding through the shared bounds-checked reader
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and borrow from the frame; sources and the analysis
//! layer handle file access and aggregation.

pub mod att;
pub(crate) mod common;
pub mod hci;
pub mod l2cap;

pub use common::reader::TooShort;
