//! Bulk operations: submit large queries and mutations as background jobs,
//! poll them to completion, and stream the JSONL results.

mod client;
mod operation;
mod reader;

pub use client::BulkOperations;
pub use operation::{BulkOperation, BulkOperationKind, BulkOperationStatus};
pub use reader::{encode_jsonl, JsonlReader};
