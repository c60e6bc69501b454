//! Path expressions over the source tree
//!
//! The grammar is deliberately small: `.` selects the current element,
//! `/`-separated segments descend one level each, a segment is either a
//! literal child name or the `*` wildcard, and a leading `/` anchors
//! resolution at the model root instead of the current element.

use crate::error::GeneratorError;
use crate::source_model::{ResolvedPath, SourceElement};

/// One segment of a parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `.` — the element itself
    This,
    /// A literal child name
    Name(String),
    /// `*` — any child
    Wildcard,
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    anchored: bool,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse an expression, rejecting empty expressions and empty segments
    pub fn parse(expr: &str) -> Result<Self, GeneratorError> {
        if expr.is_empty() {
            return Err(GeneratorError::MalformedPath(expr.to_string()));
        }

        let (anchored, rest) = match expr.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, expr),
        };

        // Bare "/" addresses the root itself.
        if rest.is_empty() {
            if anchored {
                return Ok(Self {
                    anchored,
                    segments: vec![Segment::This],
                });
            }
            return Err(GeneratorError::MalformedPath(expr.to_string()));
        }

        let mut segments = Vec::new();
        for part in rest.split('/') {
            match part {
                "" => return Err(GeneratorError::MalformedPath(expr.to_string())),
                "." => segments.push(Segment::This),
                "*" => segments.push(Segment::Wildcard),
                name => segments.push(Segment::Name(name.to_string())),
            }
        }

        Ok(Self { anchored, segments })
    }

    /// Whether resolution starts at the model root
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }
}

/// Single-pass iterator over navigation matches, in document order
pub struct PointerIter<'a> {
    inner: std::vec::IntoIter<ResolvedPath<'a>>,
}

impl<'a> Iterator for PointerIter<'a> {
    type Item = ResolvedPath<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Resolve a path expression to every matching element
///
/// Relative expressions start at `current` (whose fully qualified path is
/// `base_path`); anchored expressions start at `root` with path `"."`.
/// Matches come back in document order as a finite, non-restartable
/// iterator of [`ResolvedPath`].
pub fn iterate_pointer<'a>(
    root: &'a SourceElement,
    base_path: &str,
    current: &'a SourceElement,
    expr: &str,
) -> Result<PointerIter<'a>, GeneratorError> {
    let parsed = PathExpr::parse(expr)?;

    let (start, start_path) = if parsed.is_anchored() {
        (root, ".".to_string())
    } else {
        (current, base_path.to_string())
    };

    let mut matches = vec![ResolvedPath {
        element: start,
        path: start_path,
    }];

    for segment in &parsed.segments {
        if matches.is_empty() {
            break;
        }
        matches = descend(matches, segment);
    }

    Ok(PointerIter {
        inner: matches.into_iter(),
    })
}

fn descend<'a>(matches: Vec<ResolvedPath<'a>>, segment: &Segment) -> Vec<ResolvedPath<'a>> {
    let mut next = Vec::new();
    for rp in matches {
        match segment {
            Segment::This => next.push(rp),
            Segment::Name(name) => {
                for child in rp.element.children_named(name) {
                    next.push(ResolvedPath {
                        element: child,
                        path: format!("{}/{}", rp.path, child.name),
                    });
                }
            }
            Segment::Wildcard => {
                for child in &rp.element.children {
                    next.push(ResolvedPath {
                        element: child,
                        path: format!("{}/{}", rp.path, child.name),
                    });
                }
            }
        }
    }
    next
}

/// Resolve a path expression to at most one element
///
/// Returns `Ok(Some(..))` for exactly one match and errors on two or
/// more. Zero matches yield `Ok(None)` when `accept_not_set` is true and
/// an error naming the expression otherwise.
pub fn get_element<'a>(
    root: &'a SourceElement,
    base_path: &str,
    current: &'a SourceElement,
    expr: &str,
    accept_not_set: bool,
) -> Result<Option<ResolvedPath<'a>>, GeneratorError> {
    let mut matches = iterate_pointer(root, base_path, current, expr)?;
    let first = matches.next();

    if matches.next().is_some() {
        return Err(GeneratorError::AmbiguousMatch {
            path: expr.to_string(),
            count: 2 + matches.count(),
        });
    }

    match first {
        Some(found) => Ok(Some(found)),
        None if accept_not_set => Ok(None),
        None => Err(GeneratorError::NoMatch(expr.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn schema() -> SourceElement {
        SourceElement::new("database")
            .with_attribute("name", "bookstore")
            .with_child(
                SourceElement::new("table")
                    .with_attribute("name", "author")
                    .with_child(SourceElement::new("column").with_attribute("name", "author_id"))
                    .with_child(SourceElement::new("column").with_attribute("name", "last_name")),
            )
            .with_child(
                SourceElement::new("table")
                    .with_attribute("name", "book")
                    .with_child(SourceElement::new("column").with_attribute("name", "book_id")),
            )
    }

    #[test]
    fn test_self_expression_matches_current() {
        let root = schema();
        let matches: Vec<_> = iterate_pointer(&root, ".", &root, ".").unwrap().collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].element.name, "database");
        assert_eq!(matches[0].path, ".");
    }

    #[test]
    fn test_one_level_child_match() {
        let root = schema();
        let matches: Vec<_> = iterate_pointer(&root, ".", &root, "table")
            .unwrap()
            .collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].element.attribute("name"), Some("author"));
        assert_eq!(matches[1].element.attribute("name"), Some("book"));
        assert_eq!(matches[0].path, "./table");
    }

    #[test]
    fn test_multi_level_chain_in_document_order() {
        let root = schema();
        let names: Vec<_> = iterate_pointer(&root, ".", &root, "table/column")
            .unwrap()
            .map(|rp| rp.element.attribute("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["author_id", "last_name", "book_id"]);
    }

    #[test]
    fn test_wildcard_matches_any_child() {
        let root = schema();
        let matches: Vec<_> = iterate_pointer(&root, ".", &root, "*/column")
            .unwrap()
            .collect();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_anchored_expression_resolves_from_root() {
        let root = schema();
        let current = &root.children[0]; // author table
        let matches: Vec<_> = iterate_pointer(&root, "./table", current, "/table")
            .unwrap()
            .collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].path, "./table");
    }

    #[test]
    fn test_relative_expression_resolves_from_current() {
        let root = schema();
        let current = &root.children[0];
        let matches: Vec<_> = iterate_pointer(&root, "./table", current, "column")
            .unwrap()
            .collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].path, "./table/column");
    }

    #[test]
    fn test_no_match_is_empty_sequence() {
        let root = schema();
        let matches: Vec<_> = iterate_pointer(&root, ".", &root, "missing")
            .unwrap()
            .collect();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_parse_detects_anchoring() {
        assert!(PathExpr::parse("/table").unwrap().is_anchored());
        assert!(PathExpr::parse("/").unwrap().is_anchored());
        assert!(!PathExpr::parse("table/column").unwrap().is_anchored());
        assert!(!PathExpr::parse(".").unwrap().is_anchored());
    }

    #[test]
    fn test_malformed_expressions_rejected() {
        let root = schema();
        assert!(matches!(
            iterate_pointer(&root, ".", &root, ""),
            Err(GeneratorError::MalformedPath(_))
        ));
        assert!(matches!(
            iterate_pointer(&root, ".", &root, "table//column"),
            Err(GeneratorError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_get_element_single_match() {
        let root = schema();
        let found = get_element(&root, ".", &root, "table/column", true);
        assert!(matches!(found, Err(GeneratorError::AmbiguousMatch { .. })));

        let current = &root.children[1]; // book table
        let found = get_element(&root, "./table", current, "column", true)
            .unwrap()
            .unwrap();
        assert_eq!(found.element.attribute("name"), Some("book_id"));
    }

    #[test]
    fn test_get_element_absent_honors_accept_not_set() {
        let root = schema();
        assert!(get_element(&root, ".", &root, "missing", true)
            .unwrap()
            .is_none());
        assert!(matches!(
            get_element(&root, ".", &root, "missing", false),
            Err(GeneratorError::NoMatch(_))
        ));
    }

    #[test]
    fn test_get_element_ambiguous_reports_count() {
        let root = schema();
        match get_element(&root, ".", &root, "table", false) {
            Err(GeneratorError::AmbiguousMatch { count, .. }) => assert_eq!(count, 2),
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_wildcard_returns_children_in_document_order(
            names in proptest::collection::vec("[a-c]", 0..8)
        ) {
            let mut root = SourceElement::new("root");
            for name in &names {
                root.add_child(SourceElement::new(name.clone()));
            }

            let matched: Vec<String> = iterate_pointer(&root, ".", &root, "*")
                .unwrap()
                .map(|rp| rp.element.name.clone())
                .collect();
            prop_assert_eq!(matched, names);
        }
    }
}
