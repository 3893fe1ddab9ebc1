//! In-memory rendered tree.
//!
//! A [`Component`](crate::Component) renders into an [`Element`] tree that lives
//! for a single test. Queries and event dispatch address nodes through
//! [`ElementPath`] index paths, which stay meaningful only until the next
//! re-render.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accessibility roles the query surface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Button,
    Textbox,
    List,
    ListItem,
    Heading,
    Link,
    Generic,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Textbox => "textbox",
            Role::List => "list",
            Role::ListItem => "listitem",
            Role::Heading => "heading",
            Role::Link => "link",
            Role::Generic => "generic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub role: Role,
    /// Accessible name (label), independent of rendered text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Direct text of this node, excluding descendants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            name: None,
            text: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(Role::Button).named(label)
    }

    pub fn textbox(name: impl Into<String>) -> Self {
        Self::new(Role::Textbox).named(name)
    }

    pub fn list() -> Self {
        Self::new(Role::List)
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Self::new(Role::ListItem).with_text(text)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(Role::Heading).with_text(text)
    }

    /// Text of this node and all descendants, whitespace-joined in render order.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        self.visit(&mut |_, node| {
            if let Some(text) = &node.text {
                if !text.is_empty() {
                    parts.push(text.clone());
                }
            }
        });
        parts.join(" ")
    }

    /// Resolve an index path against this tree. Returns `None` when a
    /// re-render removed the addressed node.
    pub fn node_at(&self, path: &ElementPath) -> Option<&Element> {
        let mut node = self;
        for &idx in &path.0 {
            node = node.children.get(idx)?;
        }
        Some(node)
    }

    /// Depth-first walk over this node and its descendants.
    pub fn visit(&self, f: &mut impl FnMut(&ElementPath, &Element)) {
        fn walk(node: &Element, path: &ElementPath, f: &mut impl FnMut(&ElementPath, &Element)) {
            f(path, node);
            for (idx, child) in node.children.iter().enumerate() {
                walk(child, &path.child(idx), f);
            }
        }
        walk(self, &ElementPath::root(), f);
    }

    /// All nodes paired with their paths, in depth-first order.
    pub fn descendants(&self) -> Vec<(ElementPath, &Element)> {
        let mut out = Vec::new();
        fn walk<'a>(node: &'a Element, path: ElementPath, out: &mut Vec<(ElementPath, &'a Element)>) {
            for (idx, child) in node.children.iter().enumerate() {
                let child_path = path.child(idx);
                out.push((child_path.clone(), child));
                walk(child, child_path, out);
            }
        }
        out.push((ElementPath::root(), self));
        walk(self, ElementPath::root(), &mut out);
        out
    }
}

/// Index path from the root of one rendered tree to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElementPath(Vec<usize>);

impl ElementPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(idx);
        Self(segments)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.0 {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}
