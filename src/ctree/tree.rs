//! A path-keyed tree with a reader/writer lock on every node.

use crate::diff::{collect_leaves, Update};
use crate::node::SchemaNode;
use crate::path::{Path, PathElem};
use crate::value::Value;
use crate::ytypes::{NodeData, TreeNode};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// IndexError is returned when an entry cannot be added to a [`TreeIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("cannot store a {new} at {path}, which holds a {existing}")]
    KindMismatch {
        path: String,
        existing: &'static str,
        new: &'static str,
    },

    #[error("cannot add an entry at the empty path")]
    EmptyPath,
}

/// IndexValue is what a [`TreeIndex`] stores at a path.
#[derive(Debug, Clone)]
pub enum IndexValue {
    /// A generated instance represented by this entry.
    Node(Arc<dyn SchemaNode>),
    Leaf(Value),
}

impl IndexValue {
    fn kind(&self) -> &'static str {
        match self {
            IndexValue::Node(_) => "node",
            IndexValue::Leaf(_) => "leaf",
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            IndexValue::Leaf(v) => Some(v),
            IndexValue::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&dyn SchemaNode> {
        match self {
            IndexValue::Node(n) => Some(n.as_ref()),
            IndexValue::Leaf(_) => None,
        }
    }
}

impl PartialEq for IndexValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IndexValue::Leaf(a), IndexValue::Leaf(b)) => a == b,
            (IndexValue::Node(a), IndexValue::Node(b)) => a.eq_node(b.as_ref()),
            _ => false,
        }
    }
}

impl From<Value> for IndexValue {
    fn from(v: Value) -> Self {
        IndexValue::Leaf(v)
    }
}

impl From<Box<dyn SchemaNode>> for IndexValue {
    fn from(n: Box<dyn SchemaNode>) -> Self {
        IndexValue::Node(Arc::from(n))
    }
}

#[derive(Debug)]
enum Content {
    Empty,
    Branch(BTreeMap<PathElem, Arc<IndexNode>>),
    Node(Arc<dyn SchemaNode>),
    Leaf(Value),
}

impl Content {
    fn kind(&self) -> &'static str {
        match self {
            Content::Empty => "empty node",
            Content::Branch(_) => "branch",
            Content::Node(_) => "node",
            Content::Leaf(_) => "leaf",
        }
    }
}

/// IndexNode is one node of a [`TreeIndex`]: a branch of children, a
/// generated instance or a leaf value, never more than one of these.
#[derive(Debug)]
pub struct IndexNode {
    content: RwLock<Content>,
}

impl IndexNode {
    fn new() -> Self {
        IndexNode {
            content: RwLock::new(Content::Empty),
        }
    }

    /// Returns the child at `elem`, creating it if needed. Fails with the
    /// node's kind if it is not a branch.
    fn child_or_insert(&self, elem: PathElem) -> Result<Arc<IndexNode>, &'static str> {
        let mut content = self.content.write();
        if matches!(*content, Content::Empty) {
            *content = Content::Branch(BTreeMap::new());
        }
        match &mut *content {
            Content::Branch(children) => Ok(Arc::clone(
                children.entry(elem).or_insert_with(|| Arc::new(IndexNode::new())),
            )),
            other => Err(other.kind()),
        }
    }

    fn child(&self, elem: &PathElem) -> Option<Arc<IndexNode>> {
        match &*self.content.read() {
            Content::Branch(children) => children.get(elem).cloned(),
            _ => None,
        }
    }

    fn set(&self, value: IndexValue) -> Result<(), &'static str> {
        let mut content = self.content.write();
        match (&*content, &value) {
            (Content::Empty, _) | (Content::Leaf(_), IndexValue::Leaf(_)) | (Content::Node(_), IndexValue::Node(_)) => {}
            (existing, _) => return Err(existing.kind()),
        }
        *content = match value {
            IndexValue::Node(n) => Content::Node(n),
            IndexValue::Leaf(v) => Content::Leaf(v),
        };
        Ok(())
    }

    fn value(&self) -> Option<IndexValue> {
        match &*self.content.read() {
            Content::Node(n) => Some(IndexValue::Node(Arc::clone(n))),
            Content::Leaf(v) => Some(IndexValue::Leaf(v.clone())),
            Content::Empty | Content::Branch(_) => None,
        }
    }

    fn children(&self) -> Vec<(PathElem, Arc<IndexNode>)> {
        match &*self.content.read() {
            Content::Branch(children) => children
                .iter()
                .map(|(k, v)| (k.clone(), Arc::clone(v)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// TreeIndex stores values by structured path.
///
/// `add` locks only the nodes along its path, one at a time, so writers to
/// disjoint subtrees proceed in parallel. Reads lock each node briefly and
/// see no consistent snapshot across calls; a caller needing one holds
/// [`TreeIndex::read`] while reading and has writers hold
/// [`TreeIndex::write`].
#[derive(Debug)]
pub struct TreeIndex {
    root: Arc<IndexNode>,
    consistency: RwLock<()>,
}

impl Default for TreeIndex {
    fn default() -> Self {
        TreeIndex::new()
    }
}

/// Steps are stored without module qualifiers.
fn canonical(elem: &PathElem) -> PathElem {
    PathElem {
        name: elem.local_name().to_string(),
        key: elem.key.clone(),
    }
}

impl TreeIndex {
    pub fn new() -> Self {
        TreeIndex {
            root: Arc::new(IndexNode::new()),
            consistency: RwLock::new(()),
        }
    }

    /// Builds an index holding every leaf set in `node`.
    pub fn from_node(node: &dyn SchemaNode) -> Result<TreeIndex, IndexError> {
        let index = TreeIndex::new();
        index.add_all(collect_leaves(node))?;
        Ok(index)
    }

    /// Takes the cooperative read lock for multi-step consistent reads.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.consistency.read()
    }

    /// Takes the cooperative write lock, excluding holders of [`TreeIndex::read`].
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.consistency.write()
    }

    /// Stores `value` at `path`, replacing an entry of the same kind.
    pub fn add(&self, path: &Path, value: impl Into<IndexValue>) -> Result<(), IndexError> {
        let value = value.into();
        let elems = path.relative_elems();
        if elems.is_empty() {
            return Err(IndexError::EmptyPath);
        }
        let mut node = Arc::clone(&self.root);
        for (i, elem) in elems.iter().enumerate() {
            node = node.child_or_insert(canonical(elem)).map_err(|existing| IndexError::KindMismatch {
                path: Path::from_elems(elems[..i].to_vec()).to_string(),
                existing,
                new: "branch",
            })?;
        }
        let new = value.kind();
        node.set(value).map_err(|existing| IndexError::KindMismatch {
            path: path.to_string(),
            existing,
            new,
        })
    }

    /// Adds the value of every update; updates without a value are skipped.
    /// Returns the number of entries added.
    pub fn add_all(&self, updates: impl IntoIterator<Item = Update>) -> Result<usize, IndexError> {
        let mut added = 0;
        for update in updates {
            match update.value {
                Some(v) => {
                    self.add(&update.path, v)?;
                    added += 1;
                }
                None => log::debug!("skipping update without value at {}", update.path),
            }
        }
        Ok(added)
    }

    /// Adds the matches returned by a navigator lookup. Absent containers and
    /// unset leaves are skipped.
    pub fn add_tree_nodes(&self, nodes: &[TreeNode<'_>]) -> Result<usize, IndexError> {
        let mut added = 0;
        for n in nodes {
            let value = match &n.data {
                NodeData::Leaf(Some(v)) => IndexValue::Leaf(v.clone()),
                NodeData::Node(Some(node)) => IndexValue::from(node.clone_node()),
                NodeData::Leaf(None) | NodeData::Node(None) => continue,
            };
            self.add(&n.path, value)?;
            added += 1;
        }
        Ok(added)
    }

    /// Returns the value stored at `path`; branches have none.
    pub fn get(&self, path: &Path) -> Option<IndexValue> {
        let mut node = Arc::clone(&self.root);
        for elem in path.relative_elems() {
            node = node.child(&canonical(elem))?;
        }
        node.value()
    }

    /// Calls `f` for every stored value in path order.
    pub fn walk<F: FnMut(&Path, &IndexValue)>(&self, mut f: F) {
        walk_node(&self.root, &mut Path::new(), &mut f);
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        let mut n = 0;
        self.walk(|_, _| n += 1);
        n
    }

    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }
}

fn walk_node<F: FnMut(&Path, &IndexValue)>(node: &IndexNode, path: &mut Path, f: &mut F) {
    if let Some(value) = node.value() {
        f(path, &value);
        return;
    }
    for (elem, child) in node.children() {
        path.push(elem);
        walk_node(&child, path, f);
        path.pop();
    }
}

impl fmt::Display for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.walk(|path, value| match value {
            IndexValue::Leaf(v) => lines.push(format!("{}: {}", path, v)),
            IndexValue::Node(n) => lines.push(format!("{}: <{}>", path, n.node_type().name)),
        });
        write!(f, "{}", lines.join("\n"))
    }
}
