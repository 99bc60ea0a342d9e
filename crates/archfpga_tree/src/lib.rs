//! The generic, already-parsed input tree consumed by the architecture builder.
//!
//! A textual reader (outside this workspace) turns a serialized architecture
//! description into an [`ArchNode`] tree: named nodes with ordered attributes,
//! ordered children, optional text and file/line provenance. The checked
//! accessors in [`access`] turn structural surprises into
//! [`ArchError::Malformed`](archfpga_common::ArchError) values.

#![warn(missing_docs)]

pub mod access;
pub mod node;

pub use node::ArchNode;
