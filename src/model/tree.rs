//! Arena-backed data tree and borrowed node views.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Atomic, AtomicData, ElementType};
use crate::{Error, Result};
use smallvec::SmallVec;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned, nested description of a node. Used to build a [`Tree`] and as
/// its JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    #[serde(default)]
    pub atomics: Vec<Atomic>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_atomic(mut self, name: impl Into<String>, data: impl Into<AtomicData>) -> Self {
        self.atomics.push(Atomic::new(name, data));
        self
    }

    pub fn with_opaque(mut self, name: impl Into<String>, type_name: impl Into<String>, len: Option<usize>) -> Self {
        self.atomics.push(Atomic::opaque(name, type_name, len));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    name: String,
    children: Vec<NodeId>,
    atomics: Vec<Atomic>,
}

/// A read-only tree of named nodes. The root is always `NodeId(0)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "NodeSpec")]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Flatten a nested spec into the arena, keeping child order.
    pub fn from_spec(root: NodeSpec) -> Self {
        let mut nodes: Vec<NodeData> = Vec::new();
        let mut pending: Vec<(NodeSpec, Option<NodeId>)> = vec![(root, None)];

        while let Some((spec, parent)) = pending.pop() {
            let id = NodeId(nodes.len());
            nodes.push(NodeData {
                name: spec.name,
                children: Vec::with_capacity(spec.children.len()),
                atomics: spec.atomics,
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            // Reversed so siblings pop in declaration order.
            pending.extend(spec.children.into_iter().rev().map(|c| (c, Some(id))));
        }

        Self { nodes }
    }

    /// Parse a tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::UpstreamShapeMismatch(e.to_string()))
    }

    pub fn root(&self) -> TreeNode<'_> {
        TreeNode { tree: self, id: NodeId(0) }
    }

    pub fn node(&self, id: NodeId) -> Option<TreeNode<'_>> {
        (id.0 < self.nodes.len()).then_some(TreeNode { tree: self, id })
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<NodeSpec> for Tree {
    fn from(spec: NodeSpec) -> Self { Tree::from_spec(spec) }
}

/// Borrowed view of one node, valid for the lifetime of its tree.
#[derive(Clone, Copy)]
pub struct TreeNode<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> TreeNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId { self.id }
    pub fn name(&self) -> &'t str { &self.data().name }
    pub fn num_children(&self) -> usize { self.data().children.len() }
    pub fn has_children(&self) -> bool { !self.data().children.is_empty() }

    pub fn child(&self, index: usize) -> Option<TreeNode<'t>> {
        let tree = self.tree;
        self.data().children.get(index).map(|&id| TreeNode { tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = TreeNode<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| TreeNode { tree, id })
    }

    /// Child names in declaration order.
    pub fn child_names(&self) -> Vec<&'t str> {
        self.children().map(|c| c.name()).collect()
    }

    pub fn atomics(&self) -> &'t [Atomic] { &self.data().atomics }

    /// First attribute with exactly this name.
    pub fn atomic(&self, name: &str) -> Option<&'t Atomic> {
        self.atomics().iter().find(|a| a.name() == name)
    }

    pub fn atomic_names(&self) -> Vec<&'t str> {
        self.atomics().iter().map(Atomic::name).collect()
    }

    pub fn atomic_types(&self) -> Vec<ElementType> {
        self.atomics().iter().map(|a| a.data().element_type()).collect()
    }

    pub fn atomic_ranks(&self) -> Vec<usize> {
        self.atomics().iter().map(|a| a.data().rank()).collect()
    }

    pub fn atomic_shapes(&self) -> Vec<SmallVec<[usize; 1]>> {
        self.atomics().iter().map(|a| a.data().shape()).collect()
    }
}

impl fmt::Debug for TreeNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("children", &self.num_children())
            .field("atomics", &self.atomics().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        Tree::from_spec(
            NodeSpec::new("root")
                .with_child(
                    NodeSpec::new("a")
                        .with_child(NodeSpec::new("a1"))
                        .with_child(NodeSpec::new("a2")),
                )
                .with_child(NodeSpec::new("b").with_atomic("x", 1.5f64)),
        )
    }

    #[test]
    fn test_child_order_preserved() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(root.child_names(), vec!["a", "b"]);
        let a = root.child(0).unwrap();
        assert_eq!(a.child_names(), vec!["a1", "a2"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_atomic_lookup() {
        let tree = sample();
        let b = tree.root().child(1).unwrap();
        assert_eq!(b.atomic_names(), vec!["x"]);
        assert_eq!(b.atomic_types(), vec![ElementType::Double]);
        assert!(b.atomic("y").is_none());
    }

    #[test]
    fn test_child_out_of_range() {
        let tree = sample();
        assert!(tree.root().child(5).is_none());
        assert!(tree.node(NodeId(99)).is_none());
    }

    #[test]
    fn test_from_json() {
        let tree = Tree::from_json(
            r#"{"name":"root","children":[{"name":"data","atomics":[{"name":"n","type":"int","data":[1,2]}]}]}"#,
        )
        .unwrap();
        let data = tree.root().child(0).unwrap();
        assert_eq!(data.name(), "data");
        assert_eq!(data.atomic_ranks(), vec![1]);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Tree::from_json(r#"{"children": 3}"#).unwrap_err();
        assert!(matches!(err, Error::UpstreamShapeMismatch(_)));
    }

    #[test]
    fn test_deep_tree_builds_without_recursion() {
        let mut spec = NodeSpec::new("leaf");
        for i in 0..10_000 {
            spec = NodeSpec::new(format!("n{i}")).with_child(spec);
        }
        let tree = Tree::from_spec(spec);
        assert_eq!(tree.len(), 10_001);
    }
}
