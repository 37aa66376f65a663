//! SetNode and DeleteNode.

use super::get::{display_elems, field_schema, match_field};
use super::options::{has_option, NodeOption};
use crate::error::NodeError;
use crate::node::{FieldMut, FieldRef, KeyedList, SchemaNode};
use crate::path::{Path, PathElem};
use crate::schema::EntryRef;
use crate::trace::Trace;
use crate::value::{ListKey, Value};

/// NodeValue is the value stored by [`set_node`].
#[derive(Debug)]
pub enum NodeValue {
    /// A leaf or leaf-list value; `None` clears the leaf.
    Leaf(Option<Value>),
    /// A whole container or list entry.
    Node(Box<dyn SchemaNode>),
}

impl From<Value> for NodeValue {
    fn from(v: Value) -> Self {
        NodeValue::Leaf(Some(v))
    }
}

impl From<Option<Value>> for NodeValue {
    fn from(v: Option<Value>) -> Self {
        NodeValue::Leaf(v)
    }
}

impl From<Box<dyn SchemaNode>> for NodeValue {
    fn from(n: Box<dyn SchemaNode>) -> Self {
        NodeValue::Node(n)
    }
}

enum Action {
    Set(NodeValue),
    Delete,
}

struct Modify {
    init: bool,
    trace: Trace,
}

/// Stores `value` at `path` below `root`.
///
/// With [`NodeOption::InitMissingElements`] absent containers and list
/// entries on the way are created, and new entries get their key leaves set;
/// otherwise an absent intermediate node is NotFound.
pub fn set_node(
    schema: EntryRef<'_>,
    root: &mut dyn SchemaNode,
    path: &Path,
    value: impl Into<NodeValue>,
    opts: &[NodeOption],
) -> Result<(), NodeError> {
    let m = Modify {
        init: has_option(opts, NodeOption::InitMissingElements),
        trace: Trace::new(),
    };
    modify_container(schema, root, path.relative_elems(), Action::Set(value.into()), &m)
}

/// Removes the leaf, container or list entry at `path`. Data that is already
/// absent is not an error; a path unknown to the types is.
pub fn delete_node(schema: EntryRef<'_>, root: &mut dyn SchemaNode, path: &Path) -> Result<(), NodeError> {
    let m = Modify {
        init: false,
        trace: Trace::new(),
    };
    modify_container(schema, root, path.relative_elems(), Action::Delete, &m)
}

fn modify_container(
    schema: EntryRef<'_>,
    node: &mut dyn SchemaNode,
    path: &[PathElem],
    action: Action,
    m: &Modify,
) -> Result<(), NodeError> {
    let ty = node.node_type();
    if path.is_empty() {
        return Err(NodeError::invalid_argument(format!(
            "empty path, cannot replace {} in place",
            ty.name
        )));
    }
    let Some((index, segs)) = match_field(ty, path) else {
        return Err(NodeError::not_found(format!(
            "no match found in {} for path {} under schema {}",
            ty.name,
            display_elems(path),
            schema.name()
        )));
    };
    let meta = &ty.fields[index];
    let child = field_schema(schema, ty, meta)?;
    m.trace.log(format_args!("modify {}.{} at {}", ty.name, meta.name, display_elems(path)));

    let field = node.field_mut(index).ok_or_else(|| {
        NodeError::internal(format!("{} has no field at index {}", ty.name, index))
    })?;
    match field {
        FieldMut::Leaf(slot) => {
            if path.len() != segs {
                return Err(NodeError::not_found(format!(
                    "path {} continues below leaf {}",
                    display_elems(&path[segs..]),
                    meta.name
                )));
            }
            match action {
                Action::Set(NodeValue::Leaf(v)) => slot.set_value(v).map_err(|e| {
                    NodeError::invalid_argument(format!(
                        "cannot set {}.{}: {}",
                        ty.name, meta.name, e
                    ))
                }),
                Action::Set(NodeValue::Node(n)) => Err(NodeError::invalid_argument(format!(
                    "cannot store node {} in leaf {}.{}",
                    n.node_type().name,
                    ty.name,
                    meta.name
                ))),
                Action::Delete => Ok(slot.set_value(None)?),
            }
        }
        FieldMut::Container(slot) => {
            let rest = &path[segs..];
            if rest.is_empty() {
                return match action {
                    Action::Set(NodeValue::Node(n)) => slot.replace(Some(n)),
                    Action::Set(NodeValue::Leaf(_)) => Err(NodeError::invalid_argument(format!(
                        "cannot store a leaf value in container {}.{}",
                        ty.name, meta.name
                    ))),
                    Action::Delete => slot.replace(None),
                };
            }
            if slot.get().is_none() {
                if matches!(action, Action::Delete) {
                    return Ok(());
                }
                if !m.init {
                    return Err(NodeError::not_found(format!(
                        "container {}.{} is absent, remaining path {}",
                        ty.name,
                        meta.name,
                        display_elems(rest)
                    )));
                }
            }
            modify_container(child, slot.get_or_init(), rest, action, &m.enter())
        }
        FieldMut::List(list) => modify_list(child, list, &path[segs - 1..], action, &m.enter()),
    }
}

fn modify_list(
    schema: EntryRef<'_>,
    list: &mut dyn KeyedList,
    path: &[PathElem],
    action: Action,
    m: &Modify,
) -> Result<(), NodeError> {
    let keys = schema.key();
    let step = &path[0];
    if keys.is_empty() || !step.has_key() {
        return Err(NodeError::invalid_argument(format!(
            "path element {} must select an entry of keyed list {}",
            step,
            schema.name()
        )));
    }
    let parts = keys
        .iter()
        .map(|k| {
            step.key.get(k).map(String::as_str).ok_or_else(|| {
                NodeError::invalid_argument(format!(
                    "key {} of list {} missing from path element {}",
                    k,
                    schema.name(),
                    step
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let existing = find_entry(list, &parts);
    let rest = &path[1..];
    if rest.is_empty() {
        return match (action, existing) {
            (Action::Set(NodeValue::Node(mut n)), existing) => {
                let created = existing.is_none();
                let key = match existing {
                    Some(key) => key,
                    None => list.insert_new(&parts)?.0,
                };
                let result = check_key_fields(schema, n.as_ref(), &key)
                    .and_then(|()| set_key_fields(schema, n.as_mut(), &key))
                    .and_then(|()| list.insert(&key, n));
                if result.is_err() && created {
                    list.remove(&key);
                }
                result
            }
            (Action::Set(NodeValue::Leaf(_)), _) => Err(NodeError::invalid_argument(format!(
                "cannot store a leaf value in list {}",
                schema.name()
            ))),
            (Action::Delete, Some(key)) => {
                list.remove(&key);
                Ok(())
            }
            (Action::Delete, None) => Ok(()),
        };
    }

    match existing {
        Some(key) => {
            let entry = list.get_mut(&key).ok_or_else(|| {
                NodeError::internal(format!("entry {} of {} vanished", key, schema.name()))
            })?;
            modify_container(schema, entry, rest, action, m)
        }
        None if matches!(action, Action::Delete) => Ok(()),
        None if !m.init => Err(NodeError::not_found(format!(
            "no entry {} in list {}",
            step,
            schema.name()
        ))),
        None => {
            let (key, entry) = list.insert_new(&parts)?;
            m.trace.log(format_args!("created entry {} of {}", key, schema.name()));
            set_key_fields(schema, entry, &key)?;
            modify_container(schema, entry, rest, action, m)
        }
    }
}

/// Finds the entry whose key components match `parts` by string form.
fn find_entry(list: &dyn KeyedList, parts: &[&str]) -> Option<ListKey> {
    list.entries()
        .into_iter()
        .map(|(key, _)| key)
        .find(|key| {
            key.len() == parts.len()
                && key
                    .values()
                    .iter()
                    .zip(parts)
                    .all(|(v, p)| v.to_string() == *p)
        })
}

/// Copies the components of `key` into the entry's key leaves.
/// Rejects an entry whose key leaves are set to values other than `key`.
fn check_key_fields(schema: EntryRef<'_>, entry: &dyn SchemaNode, key: &ListKey) -> Result<(), NodeError> {
    let ty = entry.node_type();
    for (name, want) in schema.key().iter().zip(key.values()) {
        let Some(index) = ty.key_field(name) else {
            continue;
        };
        if let Some(FieldRef::Leaf(slot)) = entry.field(index) {
            match slot.value() {
                Some(got) if &got != want => {
                    return Err(NodeError::invalid_argument(format!(
                        "key {} of list {} is {} in the path but {} in the entry",
                        name,
                        schema.name(),
                        want,
                        got
                    )))
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn set_key_fields(
    schema: EntryRef<'_>,
    entry: &mut dyn SchemaNode,
    key: &ListKey,
) -> Result<(), NodeError> {
    let ty = entry.node_type();
    for (name, value) in schema.key().iter().zip(key.values()) {
        let Some(index) = ty.key_field(name) else {
            continue;
        };
        if let Some(FieldMut::Leaf(slot)) = entry.field_mut(index) {
            slot.set_value(Some(value.clone()))?;
        }
    }
    Ok(())
}

impl Modify {
    fn enter(&self) -> Modify {
        Modify {
            init: self.init,
            trace: self.trace.enter(),
        }
    }
}
