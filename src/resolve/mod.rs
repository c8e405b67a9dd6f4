//! Path resolution — walks a tree one dotted segment at a time.
//!
//! Pure functions over borrowed [`TreeNode`] views. Descent is an explicit
//! loop, so path depth never grows the call stack.

use smallvec::SmallVec;
use tracing::debug;

use crate::model::TreeNode;
use crate::{Error, Result};

/// Name of the wrapper level some sources put around the actual record.
pub const DATA_WRAPPER: &str = "data";

/// How many wrapper levels are peeled off before resolution.
pub const MAX_WRAPPER_LEVELS: usize = 2;

/// Segments of a dotted lookup key.
pub type PathSegments = SmallVec<[String; 8]>;

/// Split a dotted key such as `rectangle.centreR` into its segments.
pub fn split_path(key: &str) -> Result<PathSegments> {
    if key.is_empty() {
        return Err(Error::EmptyPath);
    }
    Ok(key.split('.').map(str::to_owned).collect())
}

/// Outcome of [`resolve`]: the node reached and the segment naming the leaf.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'t, 'p> {
    pub node: TreeNode<'t>,
    pub leaf: &'p str,
    /// Segments left over after `leaf` when descent stopped at a childless node.
    pub ignored: &'p [String],
}

fn data_wrapper<'t>(node: TreeNode<'t>) -> Option<TreeNode<'t>> {
    node.child(0).filter(|c| c.name() == DATA_WRAPPER)
}

/// True iff the node has at least one child and its first child is named `data`.
pub fn tree_check(node: TreeNode<'_>) -> bool {
    match node.child(0) {
        None => {
            debug!(node = node.name(), "tree_check: no children found");
            false
        }
        Some(child) if child.name() != DATA_WRAPPER => {
            debug!(node = node.name(), first_child = child.name(), "tree_check: no child named data");
            false
        }
        Some(_) => true,
    }
}

/// Peel up to [`MAX_WRAPPER_LEVELS`] `data` wrappers off the root.
///
/// Each level is attempted unconditionally and silently skipped when
/// [`tree_check`] fails, so zero, one or two levels may be removed.
pub fn unwrap_data_wrappers(root: TreeNode<'_>) -> TreeNode<'_> {
    let mut node = root;
    for level in 0..MAX_WRAPPER_LEVELS {
        if !tree_check(node) {
            continue;
        }
        if let Some(inner) = data_wrapper(node) {
            debug!(level, "unwrapped data wrapper");
            node = inner;
        }
    }
    node
}

/// Descend from `root` following `path` until one segment is left or a
/// childless node is reached.
///
/// Matching is exact and case-sensitive; the first child with the name
/// wins. If descent stops early on a childless node, the first remaining
/// segment is the leaf and the rest are reported in [`Resolved::ignored`].
pub fn resolve<'t, 'p>(root: TreeNode<'t>, path: &'p [String]) -> Result<Resolved<'t, 'p>> {
    if path.is_empty() {
        return Err(Error::EmptyPath);
    }

    let mut node = root;
    let mut rest = path;
    while rest.len() > 1 && node.has_children() {
        let segment = rest[0].as_str();
        match node.children().find(|c| c.name() == segment) {
            Some(child) => {
                debug!(segment, depth = path.len() - rest.len(), "descending");
                node = child;
                rest = &rest[1..];
            }
            None => {
                debug!(segment, parent = node.name(), "child name not found");
                return Err(Error::PathSegmentNotFound {
                    segment: segment.to_owned(),
                    available: node.child_names().into_iter().map(str::to_owned).collect(),
                });
            }
        }
    }

    if rest.len() > 1 {
        debug!(node = node.name(), ignored = ?&rest[1..], "tree node at bottom level");
    }

    Ok(Resolved { node, leaf: &rest[0], ignored: &rest[1..] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeSpec, Tree};

    fn wrapped(levels: usize) -> Tree {
        let mut spec = NodeSpec::new("record")
            .with_child(NodeSpec::new("rectangle").with_atomic("centreR", vec![1.0f32]));
        for _ in 0..levels {
            spec = NodeSpec::new("data").with_child(spec);
        }
        Tree::from_spec(NodeSpec::new("root").with_child(spec))
    }

    fn segments(key: &str) -> PathSegments {
        split_path(key).unwrap()
    }

    #[test]
    fn test_split_path() {
        assert_eq!(segments("rectangle.centreR").as_slice(), &["rectangle", "centreR"]);
        assert_eq!(segments("x").as_slice(), &["x"]);
        assert!(matches!(split_path(""), Err(Error::EmptyPath)));
    }

    #[test]
    fn test_tree_check() {
        let tree = wrapped(1);
        assert!(tree_check(tree.root()));
        let leafless = Tree::from_spec(NodeSpec::new("root"));
        assert!(!tree_check(leafless.root()));
        let other = Tree::from_spec(NodeSpec::new("root").with_child(NodeSpec::new("meta")));
        assert!(!tree_check(other.root()));
    }

    #[test]
    fn test_unwrap_two_levels() {
        // root -> data -> data -> record
        let tree = Tree::from_spec(
            NodeSpec::new("root").with_child(
                NodeSpec::new("data").with_child(NodeSpec::new("data").with_child(NodeSpec::new("record"))),
            ),
        );
        let node = unwrap_data_wrappers(tree.root());
        assert_eq!(node.name(), "data");
        assert_eq!(node.child_names(), vec!["record"]);
    }

    #[test]
    fn test_unwrap_single_level_second_attempt_is_noop() {
        let tree = wrapped(0);
        // root -> record: no wrapper at all
        let node = unwrap_data_wrappers(tree.root());
        assert_eq!(node.name(), "root");

        let tree = wrapped(1);
        // root -> data -> record: one level, second attempt sees "record"
        let node = unwrap_data_wrappers(tree.root());
        assert_eq!(node.name(), "data");
        assert_eq!(node.child_names(), vec!["record"]);
    }

    #[test]
    fn test_resolve_descends_to_leaf() {
        let tree = wrapped(0);
        let path = segments("record.rectangle.centreR");
        let resolved = resolve(tree.root(), &path).unwrap();
        assert_eq!(resolved.node.name(), "rectangle");
        assert_eq!(resolved.leaf, "centreR");
        assert!(resolved.ignored.is_empty());
    }

    #[test]
    fn test_resolve_unknown_first_segment() {
        let tree = wrapped(0);
        let path = segments("nope.centreR");
        match resolve(tree.root(), &path) {
            Err(Error::PathSegmentNotFound { segment, available }) => {
                assert_eq!(segment, "nope");
                assert_eq!(available, vec!["record".to_string()]);
            }
            other => panic!("expected PathSegmentNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let tree = wrapped(0);
        let path = segments("Record.rectangle.centreR");
        assert!(matches!(resolve(tree.root(), &path), Err(Error::PathSegmentNotFound { .. })));
    }

    #[test]
    fn test_resolve_stops_at_childless_node() {
        let tree = wrapped(0);
        let path = segments("record.rectangle.centreR.extra");
        let resolved = resolve(tree.root(), &path).unwrap();
        assert_eq!(resolved.node.name(), "rectangle");
        assert_eq!(resolved.leaf, "centreR");
        assert_eq!(resolved.ignored, &["extra".to_string()]);
    }

    #[test]
    fn test_resolve_single_segment_stays_at_root() {
        let tree = wrapped(0);
        let path = segments("centreR");
        let resolved = resolve(tree.root(), &path).unwrap();
        assert_eq!(resolved.node.name(), "root");
        assert_eq!(resolved.leaf, "centreR");
    }

    #[test]
    fn test_resolve_empty_path() {
        let tree = wrapped(0);
        assert!(matches!(resolve(tree.root(), &[]), Err(Error::EmptyPath)));
    }

    #[test]
    fn test_first_duplicate_child_wins() {
        let tree = Tree::from_spec(
            NodeSpec::new("root")
                .with_child(NodeSpec::new("dup").with_atomic("v", 1))
                .with_child(NodeSpec::new("dup").with_atomic("v", 2)),
        );
        let path = segments("dup.v");
        let resolved = resolve(tree.root(), &path).unwrap();
        assert_eq!(resolved.node.id(), tree.root().child(0).unwrap().id());
    }
}
