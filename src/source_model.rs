//! In-memory source tree the engine generates from
//!
//! A source model is built once by an external producer (XML reader,
//! schema introspection, ...) before a run and is read-only while the
//! engine walks it. Navigation hands out borrows, never clones.

use std::collections::HashMap;

/// A named node in the source tree
///
/// Children preserve insertion order; generation output is deterministic
/// because matches are always visited in document order. Attribute keys
/// are unique per element. By convention the `None` key holds the
/// element's text content.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceElement {
    /// Element name
    pub name: String,
    /// Attribute key to value; the `None` key is the text content
    pub attributes: HashMap<Option<String>, String>,
    /// Child elements in document order
    pub children: Vec<SourceElement>,
}

impl SourceElement {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any previous value for the key
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(Some(key.into()), value.into());
        self
    }

    /// Set the text content (the `None`-keyed attribute)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.attributes.insert(None, text.into());
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: SourceElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element in place
    pub fn add_child(&mut self, child: SourceElement) {
        self.children.push(child);
    }

    /// Look up a named attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(&Some(key.to_string())).map(String::as_str)
    }

    /// The text content, if any
    pub fn text(&self) -> Option<&str> {
        self.attributes.get(&None).map(String::as_str)
    }

    /// Children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a SourceElement> + 'a {
        let name = name.to_owned();
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// A navigation result pairing the element found with the fully
/// qualified path used to reach it
///
/// Nested lookups resolve relative to this absolute position instead of
/// textually re-evaluating the expression that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedPath<'a> {
    /// The element the expression matched
    pub element: &'a SourceElement,
    /// Fully qualified path from the model root (root is `"."`)
    pub path: String,
}
