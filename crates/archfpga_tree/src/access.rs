//! Checked attribute and child accessors.
//!
//! Every accessor that can fail returns [`ArchError::Malformed`] located at
//! the node being inspected, so callers can propagate with `?` and still
//! report a useful file/line.

use crate::node::ArchNode;
use archfpga_common::{ArchError, ArchResult};
use std::str::FromStr;

impl ArchNode {
    /// Returns the first value of the attribute `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of a required attribute.
    pub fn required_attr(&self, key: &str) -> ArchResult<&str> {
        self.attribute(key).ok_or_else(|| {
            ArchError::malformed(
                format!("missing required attribute '{key}' on <{}>", self.name),
                &self.loc,
            )
        })
    }

    /// Returns the value of an optional attribute or `default`.
    pub fn attr_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.attribute(key).unwrap_or(default)
    }

    /// Parses an optional attribute into `T`.
    pub fn parse_attr<T: FromStr>(&self, key: &str) -> ArchResult<Option<T>> {
        match self.attribute(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                ArchError::malformed(
                    format!(
                        "invalid value '{raw}' for attribute '{key}' on <{}>",
                        self.name
                    ),
                    &self.loc,
                )
            }),
        }
    }

    /// Parses a required attribute into `T`.
    pub fn required_parse<T: FromStr>(&self, key: &str) -> ArchResult<T> {
        self.required_attr(key)?;
        self.parse_attr(key)?.ok_or_else(|| {
            ArchError::malformed(
                format!("missing required attribute '{key}' on <{}>", self.name),
                &self.loc,
            )
        })
    }

    /// Reads a boolean attribute (`true`/`false`/`1`/`0`), defaulting when absent.
    pub fn bool_attr(&self, key: &str, default: bool) -> ArchResult<bool> {
        match self.attribute(key).map(str::trim) {
            None => Ok(default),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(other) => Err(ArchError::malformed(
                format!(
                    "invalid boolean '{other}' for attribute '{key}' on <{}>",
                    self.name
                ),
                &self.loc,
            )),
        }
    }

    /// Fails if the node carries any attribute not listed in `allowed`.
    pub fn expect_only_attributes(&self, allowed: &[&str]) -> ArchResult<()> {
        for (key, _) in &self.attributes {
            if !allowed.contains(&key.as_str()) {
                return Err(ArchError::malformed(
                    format!("unexpected attribute '{key}' on <{}>", self.name),
                    &self.loc,
                ));
            }
        }
        Ok(())
    }

    /// Fails if the node has any child element not listed in `allowed`.
    pub fn expect_only_children(&self, allowed: &[&str]) -> ArchResult<()> {
        for child in &self.children {
            if !allowed.contains(&child.name.as_str()) {
                return Err(ArchError::malformed(
                    format!(
                        "unexpected <{}> in <{}> (expected one of: {})",
                        child.name,
                        self.name,
                        allowed.join(", ")
                    ),
                    &child.loc,
                ));
            }
        }
        Ok(())
    }

    /// Fails if the node has any child elements at all.
    pub fn expect_no_children(&self) -> ArchResult<()> {
        match self.children.first() {
            None => Ok(()),
            Some(child) => Err(ArchError::malformed(
                format!("unexpected <{}> in <{}>", child.name, self.name),
                &child.loc,
            )),
        }
    }

    /// Iterates over the children with the given element name, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ArchNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Counts the children with the given element name.
    pub fn count_children(&self, name: &str) -> usize {
        self.children_named(name).count()
    }

    /// Returns the only child with the given name, failing on zero or many.
    pub fn single_child(&self, name: &str) -> ArchResult<&ArchNode> {
        self.optional_child(name)?.ok_or_else(|| {
            ArchError::malformed(
                format!("missing required <{name}> in <{}>", self.name),
                &self.loc,
            )
        })
    }

    /// Returns the child with the given name if present, failing on more than one.
    pub fn optional_child(&self, name: &str) -> ArchResult<Option<&ArchNode>> {
        let mut found = self.children.iter().filter(|c| c.name == name);
        let first = found.next();
        if let Some(extra) = found.next() {
            return Err(ArchError::malformed(
                format!("expected at most one <{name}> in <{}>", self.name),
                &extra.loc,
            ));
        }
        Ok(first)
    }

    /// Returns the trimmed character data, or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }
}
