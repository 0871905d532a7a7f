//! btsnoop capture source.
//!
//! This module provides a `FrameSource` backed by a btsnoop file (the format
//! written by Android's HCI snoop log and BlueZ `btmon -w`). It validates the
//! 16-byte container header and then emits one `FrameRecord` per record. A
//! record cut short by end of input ends the sequence without an error; the
//! cut is remembered as a `Truncation`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::BtsnoopFileSource;
