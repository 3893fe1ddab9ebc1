//! Query descriptors and element handles.

use std::fmt;

use crate::error::QueryError;
use crate::tree::{Element, ElementPath, Role};

/// Handle to a node of the current rendered tree, as returned by queries.
/// Carries a snapshot of the node plus the path used to re-resolve it; the
/// handle goes stale once a re-render removes or replaces the node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    pub path: ElementPath,
    pub role: Role,
    pub name: Option<String>,
    pub text: Option<String>,
}

impl ElementRef {
    fn new(path: ElementPath, node: &Element) -> Self {
        Self {
            path,
            role: node.role,
            name: node.name.clone(),
            text: node.text.clone(),
        }
    }
}

/// One query against a rendered tree, with a human-readable description used
/// in failure messages.
#[derive(Debug, Clone)]
pub(crate) enum Query {
    ByRole(Role),
    ByText(String),
}

impl Query {
    fn matches(&self, node: &Element) -> bool {
        match self {
            Query::ByRole(role) => node.role == *role,
            Query::ByText(text) => node.text.as_deref() == Some(text.as_str()),
        }
    }

    /// All matching nodes, in depth-first order.
    pub(crate) fn all(&self, root: &Element) -> Vec<ElementRef> {
        root.descendants()
            .into_iter()
            .filter(|(_, node)| self.matches(node))
            .map(|(path, node)| ElementRef::new(path, node))
            .collect()
    }

    /// Exactly one matching node, or a descriptive failure.
    pub(crate) fn one(&self, root: &Element) -> Result<ElementRef, QueryError> {
        let mut found = self.all(root);
        match found.len() {
            0 => Err(QueryError::NotFound {
                query: self.to_string(),
            }),
            1 => Ok(found.remove(0)),
            count => Err(QueryError::Ambiguous {
                query: self.to_string(),
                count,
            }),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::ByRole(role) => write!(f, "role \"{role}\""),
            Query::ByText(text) => write!(f, "text \"{text}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Element {
        Element::new(Role::Generic)
            .child(Element::button("add"))
            .child(
                Element::list()
                    .child(Element::list_item("one"))
                    .child(Element::list_item("two")),
            )
    }

    #[test]
    fn one_rejects_ambiguous_matches() {
        let err = Query::ByRole(Role::ListItem).one(&tree()).unwrap_err();
        match err {
            QueryError::Ambiguous { count, query } => {
                assert_eq!(count, 2);
                assert_eq!(query, "role \"listitem\"");
            }
            other => panic!("expected ambiguous, got {other}"),
        }
    }

    #[test]
    fn one_reports_missing_matches() {
        let err = Query::ByText("three".into()).one(&tree()).unwrap_err();
        assert_eq!(err.to_string(), "no element matched text \"three\"");
    }

    #[test]
    fn by_text_matches_direct_text_exactly() {
        let found = Query::ByText("two".into()).one(&tree()).unwrap();
        assert_eq!(found.role, Role::ListItem);
        assert!(Query::ByText("tw".into()).all(&tree()).is_empty());
    }
}
