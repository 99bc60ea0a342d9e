//! The input tree node and its builder API.

use archfpga_common::SourceLoc;
use serde::{Deserialize, Serialize};

/// One element of the architecture description.
///
/// Attributes keep declaration order so that error messages and the content
/// hash are reproducible. The `loc` is provenance only and is excluded from
/// serialization, so two descriptions that differ only in layout hash alike.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchNode {
    /// The element name (e.g. `pb_type`, `sub_tile`).
    pub name: String,
    /// Attributes in declaration order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in declaration order.
    pub children: Vec<ArchNode>,
    /// Character data directly inside the element, if any.
    pub text: Option<String>,
    /// Where the element was read from.
    #[serde(skip)]
    pub loc: SourceLoc,
}

impl ArchNode {
    /// Creates an empty node with the given element name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            loc: SourceLoc::UNKNOWN,
        }
    }

    /// Appends an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Appends a child element.
    pub fn child(mut self, child: ArchNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child elements.
    pub fn children(mut self, children: impl IntoIterator<Item = ArchNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets the character data.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the line number of this node.
    pub fn at(mut self, line: u32) -> Self {
        self.loc.line = line;
        self
    }

    /// Stamps `file` onto this node and every descendant.
    pub fn with_file(mut self, file: &str) -> Self {
        self.set_file(file);
        self
    }

    fn set_file(&mut self, file: &str) {
        self.loc.file = Some(file.to_string());
        for child in &mut self.children {
            child.set_file(file);
        }
    }
}
