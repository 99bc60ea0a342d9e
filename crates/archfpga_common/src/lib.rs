//! Shared foundational types for the FPGA architecture model.
//!
//! This crate provides source provenance for error messages, the typed
//! construction error that every stage of the architecture build returns,
//! and the content hash used to identify an architecture description.

#![warn(missing_docs)]

pub mod hash;
pub mod loc;
pub mod result;

pub use hash::ContentHash;
pub use loc::SourceLoc;
pub use result::{ArchError, ArchResult};
