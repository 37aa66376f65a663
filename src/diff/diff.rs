//! Leaf-level differences between two instances of a generated type.

use crate::error::NodeError;
use crate::node::{FieldKind, FieldMeta, FieldRef, KeyedList, SchemaNode};
use crate::path::{Path, PathElem};
use crate::trace::Trace;
use crate::value::{ListKey, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Update sets the leaf at `path` to `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Update {
    pub path: Path,
    pub value: Option<Value>,
}

impl Update {
    pub fn new(path: Path, value: Value) -> Self {
        Update {
            path,
            value: Some(value),
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{} = {}", self.path, v),
            None => write!(f, "{} = <nil>", self.path),
        }
    }
}

/// Returns the updates that bring `a` to `b`.
///
/// Only additions and changes are reported: a leaf set in `a` but absent
/// from `b` produces no update (see [`deletions`]). A leaf reachable through
/// several path alternatives yields one update per alternative. The order of
/// the result is not significant.
pub fn diff(a: &dyn SchemaNode, b: &dyn SchemaNode) -> Result<Vec<Update>, NodeError> {
    check_same_type(a, b)?;
    let mut out = Vec::new();
    diff_node(a, b, &Path::new(), &mut out, Trace::new());
    Ok(out)
}

/// Returns the paths of leaves set in `a` but not in `b`.
pub fn deletions(a: &dyn SchemaNode, b: &dyn SchemaNode) -> Result<Vec<Path>, NodeError> {
    check_same_type(a, b)?;
    let kept: BTreeSet<Path> = collect_leaves(b).into_iter().map(|u| u.path).collect();
    Ok(collect_leaves(a)
        .into_iter()
        .map(|u| u.path)
        .filter(|p| !kept.contains(p))
        .collect())
}

/// Returns an update for every leaf set in `node`, in field order.
pub fn collect_leaves(node: &dyn SchemaNode) -> Vec<Update> {
    let mut out = Vec::new();
    collect_node(node, &Path::new(), &mut out);
    out
}

fn check_same_type(a: &dyn SchemaNode, b: &dyn SchemaNode) -> Result<(), NodeError> {
    if !a.same_type(b) {
        return Err(NodeError::invalid_argument(format!(
            "cannot diff {} against {}",
            a.node_type().name,
            b.node_type().name
        )));
    }
    Ok(())
}

/// Splits a path alternative into path elements.
pub(crate) fn alt_elems(alt: &str) -> Vec<PathElem> {
    alt.split('/')
        .filter(|s| !s.is_empty())
        .map(PathElem::new)
        .collect()
}

/// Returns the path of a list entry: the list path with its last element
/// carrying the entry's keys.
pub(crate) fn entry_path(prefix: &Path, alt: &str, keys: &[&str], key: &ListKey) -> Path {
    let mut elems = alt_elems(alt);
    if let Some(last) = elems.last_mut() {
        last.key = keys
            .iter()
            .map(|k| k.to_string())
            .zip(key.values().iter().map(Value::to_string))
            .collect();
    }
    prefix.join(&elems)
}

fn list_keys(meta: &FieldMeta) -> &'static [&'static str] {
    match meta.kind {
        FieldKind::List { keys, .. } => keys,
        _ => &[],
    }
}

fn diff_node(a: &dyn SchemaNode, b: &dyn SchemaNode, prefix: &Path, out: &mut Vec<Update>, trace: Trace) {
    let ty = b.node_type();
    trace.log(format_args!("diff {} at {}", ty.name, prefix));
    for ((meta, fa), fb) in ty.fields.iter().zip(a.fields()).zip(b.fields()) {
        for alt in meta.alternatives() {
            match (&fa, &fb) {
                (FieldRef::Leaf(la), FieldRef::Leaf(lb)) => {
                    let Some(vb) = lb.value() else { continue };
                    if la.value().as_ref() != Some(&vb) {
                        out.push(Update::new(prefix.join(&alt_elems(alt)), vb));
                    }
                }
                (FieldRef::Container(ca), FieldRef::Container(cb)) => {
                    let path = prefix.join(&alt_elems(alt));
                    match (ca.get(), cb.get()) {
                        (Some(x), Some(y)) => diff_node(x, y, &path, out, trace.enter()),
                        (None, Some(y)) => collect_node(y, &path, out),
                        _ => {}
                    }
                }
                (FieldRef::List(la), FieldRef::List(lb)) => {
                    diff_list(*la, *lb, prefix, alt, list_keys(meta), out, trace.enter())
                }
                _ => {}
            }
        }
    }
}

fn diff_list(
    a: &dyn KeyedList,
    b: &dyn KeyedList,
    prefix: &Path,
    alt: &str,
    keys: &[&str],
    out: &mut Vec<Update>,
    trace: Trace,
) {
    for (key, entry) in b.entries() {
        let path = entry_path(prefix, alt, keys, &key);
        match a.get(&key) {
            Some(old) => diff_node(old, entry, &path, out, trace),
            None => {
                trace.log(format_args!("new entry {}", path));
                collect_node(entry, &path, out)
            }
        }
    }
}

fn collect_node(node: &dyn SchemaNode, prefix: &Path, out: &mut Vec<Update>) {
    let ty = node.node_type();
    for (meta, field) in ty.fields.iter().zip(node.fields()) {
        for alt in meta.alternatives() {
            match &field {
                FieldRef::Leaf(slot) => {
                    if let Some(v) = slot.value() {
                        out.push(Update::new(prefix.join(&alt_elems(alt)), v));
                    }
                }
                FieldRef::Container(slot) => {
                    if let Some(child) = slot.get() {
                        collect_node(child, &prefix.join(&alt_elems(alt)), out);
                    }
                }
                FieldRef::List(list) => {
                    for (key, entry) in list.entries() {
                        let path = entry_path(prefix, alt, list_keys(meta), &key);
                        collect_node(entry, &path, out);
                    }
                }
            }
        }
    }
}
