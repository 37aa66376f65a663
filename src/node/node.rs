//! Capability traits implemented by generated types.
//!
//! The engine never inspects a generated struct directly. Each type exposes a
//! static [`NodeType`] table describing its fields and hands out its fields
//! as [`FieldRef`]/[`FieldMut`] values, one per entry of that table and in
//! the same order.

use crate::error::NodeError;
use crate::path::strip_module_prefix;
use crate::value::{LeafType, ListKey, ListKeyType, Value, ValueError};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// NodeType is the static descriptor table of a generated type.
pub struct NodeType {
    pub name: &'static str,
    pub fields: &'static [FieldMeta],
    /// Creates a zero-valued instance of the type.
    pub new: fn() -> Box<dyn SchemaNode>,
}

/// FieldMeta describes one field of a generated type.
#[derive(Debug)]
pub struct FieldMeta {
    pub name: &'static str,
    /// Schema path of the field relative to the enclosing type. Alternatives
    /// are separated by `|` when the field is reachable both through a
    /// compressed and an uncompressed route.
    pub path: &'static str,
    /// Schema paths that mirror the field without being stored in it, such
    /// as the `state` twin of a compressed `config` leaf. Empty when none.
    pub shadow: &'static str,
    pub kind: FieldKind,
}

/// FieldKind is the shape of a field.
pub enum FieldKind {
    Leaf,
    LeafList,
    Container(fn() -> &'static NodeType),
    List {
        element: fn() -> &'static NodeType,
        /// Key leaf names in declaration order.
        keys: &'static [&'static str],
    },
}

impl NodeType {
    pub fn field(&self, name: &str) -> Option<(usize, &'static FieldMeta)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Returns the index of the leaf field holding the list key `key`: a leaf
    /// with a single-segment path alternative naming the key.
    pub fn key_field(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| {
            matches!(f.kind, FieldKind::Leaf)
                && f.alternatives()
                    .any(|alt| strip_module_prefix(alt.trim_start_matches('/')) == key)
        })
    }

    pub fn new_node(&'static self) -> Box<dyn SchemaNode> {
        (self.new)()
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl FieldMeta {
    /// Iterates over the `|`-separated path alternatives.
    pub fn alternatives(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('|')
    }

    /// Iterates over the `|`-separated shadow paths.
    pub fn shadow_alternatives(&self) -> impl Iterator<Item = &'static str> {
        self.shadow.split('|').filter(|alt| !alt.is_empty())
    }

    /// Returns the alternative the schema is resolved along: the only one,
    /// or the first with more than one element.
    pub fn schema_alternative(&self) -> &'static str {
        let mut alts = self.alternatives();
        let first = alts.next().unwrap_or(self.path);
        std::iter::once(first)
            .chain(alts)
            .find(|alt| alt.split('/').filter(|s| !s.is_empty()).nth(1).is_some())
            .unwrap_or(first)
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::List { .. })
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Leaf => write!(f, "Leaf"),
            FieldKind::LeafList => write!(f, "LeafList"),
            FieldKind::Container(t) => write!(f, "Container({})", t().name),
            FieldKind::List { element, keys } => {
                write!(f, "List({}, keys={:?})", element().name, keys)
            }
        }
    }
}

/// SchemaNode is the object-safe view of a generated container or list entry.
pub trait SchemaNode: Any + fmt::Debug + Send + Sync {
    fn node_type(&self) -> &'static NodeType;

    /// Returns the fields in descriptor-table order.
    fn fields(&self) -> Vec<FieldRef<'_>>;

    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;

    fn clone_node(&self) -> Box<dyn SchemaNode>;

    /// Reports whether `other` is the same type with equal contents.
    fn eq_node(&self, other: &dyn SchemaNode) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn field(&self, index: usize) -> Option<FieldRef<'_>> {
        self.fields().into_iter().nth(index)
    }

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
        self.fields_mut().into_iter().nth(index)
    }
}

impl<'a> dyn SchemaNode + 'a {
    pub fn downcast_ref<T: GeneratedNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: GeneratedNode>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Reports whether two nodes have the same concrete type.
    pub fn same_type(&self, other: &dyn SchemaNode) -> bool {
        self.as_any().type_id() == other.as_any().type_id()
    }
}

impl<'a> PartialEq for dyn SchemaNode + 'a {
    fn eq(&self, other: &Self) -> bool {
        self.eq_node(other)
    }
}

impl Clone for Box<dyn SchemaNode> {
    fn clone(&self) -> Self {
        self.clone_node()
    }
}

/// Converts a boxed node into its concrete type.
pub fn downcast_node<T: GeneratedNode>(node: Box<dyn SchemaNode>) -> Result<Box<T>, NodeError> {
    let name = node.node_type().name;
    node.into_any().downcast::<T>().map_err(|_| {
        NodeError::invalid_argument(format!(
            "expected node of type {}, got {}",
            T::static_type().name,
            name
        ))
    })
}

/// GeneratedNode is implemented by every generated type.
pub trait GeneratedNode: SchemaNode + Default + Clone + PartialEq {
    fn static_type() -> &'static NodeType;

    fn boxed_default() -> Box<dyn SchemaNode> {
        Box::new(Self::default())
    }
}

/// FieldRef is a shared view of one field.
pub enum FieldRef<'a> {
    Leaf(&'a dyn LeafSlot),
    Container(&'a dyn ContainerSlot),
    List(&'a dyn KeyedList),
}

/// FieldMut is an exclusive view of one field.
pub enum FieldMut<'a> {
    Leaf(&'a mut dyn LeafSlot),
    Container(&'a mut dyn ContainerSlot),
    List(&'a mut dyn KeyedList),
}

impl FieldRef<'_> {
    pub fn shape(&self) -> &'static str {
        match self {
            FieldRef::Leaf(_) => "leaf",
            FieldRef::Container(_) => "container",
            FieldRef::List(_) => "list",
        }
    }
}

impl FieldMut<'_> {
    pub fn shape(&self) -> &'static str {
        match self {
            FieldMut::Leaf(_) => "leaf",
            FieldMut::Container(_) => "container",
            FieldMut::List(_) => "list",
        }
    }
}

/// LeafSlot is a leaf or leaf-list field.
pub trait LeafSlot: Send + Sync {
    /// Returns the current value; a leaf-list yields `Value::LeafList`.
    fn value(&self) -> Option<Value>;

    fn set_value(&mut self, value: Option<Value>) -> Result<(), ValueError>;

    /// Name of the Rust type stored in the slot.
    fn type_name(&self) -> &'static str;
}

impl<T: LeafType> LeafSlot for Option<T> {
    fn value(&self) -> Option<Value> {
        self.as_ref().map(LeafType::to_value)
    }

    fn set_value(&mut self, value: Option<Value>) -> Result<(), ValueError> {
        *self = value.as_ref().map(T::from_value).transpose()?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        T::NAME
    }
}

impl<T: LeafType> LeafSlot for Vec<T> {
    fn value(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        Some(Value::LeafList(self.iter().map(LeafType::to_value).collect()))
    }

    fn set_value(&mut self, value: Option<Value>) -> Result<(), ValueError> {
        let items = match value {
            None => Vec::new(),
            Some(Value::LeafList(items)) => items
                .iter()
                .map(T::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(ValueError::Convert {
                    value: other.to_string(),
                    kind: other.kind_name(),
                    target: "leaf-list",
                })
            }
        };
        *self = items;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        T::NAME
    }
}

/// ContainerSlot is an optional child container field.
pub trait ContainerSlot: Send + Sync {
    fn get(&self) -> Option<&dyn SchemaNode>;

    fn get_mut(&mut self) -> Option<&mut dyn SchemaNode>;

    /// Returns the child, creating a zero-valued one if absent.
    fn get_or_init(&mut self) -> &mut dyn SchemaNode;

    /// Replaces the child; fails if the node is not of the field's type.
    fn replace(&mut self, node: Option<Box<dyn SchemaNode>>) -> Result<(), NodeError>;

    fn element_type(&self) -> &'static NodeType;
}

impl<T: GeneratedNode> ContainerSlot for Option<Box<T>> {
    fn get(&self) -> Option<&dyn SchemaNode> {
        self.as_deref().map(|n| n as &dyn SchemaNode)
    }

    fn get_mut(&mut self) -> Option<&mut dyn SchemaNode> {
        self.as_deref_mut().map(|n| n as &mut dyn SchemaNode)
    }

    fn get_or_init(&mut self) -> &mut dyn SchemaNode {
        let node: &mut T = self.get_or_insert_with(Box::default);
        node as &mut dyn SchemaNode
    }

    fn replace(&mut self, node: Option<Box<dyn SchemaNode>>) -> Result<(), NodeError> {
        *self = node.map(downcast_node::<T>).transpose()?;
        Ok(())
    }

    fn element_type(&self) -> &'static NodeType {
        T::static_type()
    }
}

/// KeyedList is a keyed collection of list entries.
///
/// An absent collection and a present but empty one are distinct states.
pub trait KeyedList: Send + Sync {
    fn is_present(&self) -> bool;

    /// Makes an absent collection present and empty, or drops it.
    fn set_present(&mut self, present: bool);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entries in key order.
    fn entries(&self) -> Vec<(ListKey, &dyn SchemaNode)>;

    fn entries_mut(&mut self) -> Vec<(ListKey, &mut dyn SchemaNode)>;

    fn get(&self, key: &ListKey) -> Option<&dyn SchemaNode>;

    fn get_mut(&mut self, key: &ListKey) -> Option<&mut dyn SchemaNode>;

    /// Inserts or replaces an entry.
    fn insert(&mut self, key: &ListKey, node: Box<dyn SchemaNode>) -> Result<(), NodeError>;

    /// Returns the entry with the key parsed from `parts` (one string per
    /// key leaf), inserting a zero-valued entry if there is none.
    fn insert_new(&mut self, parts: &[&str]) -> Result<(ListKey, &mut dyn SchemaNode), NodeError>;

    fn remove(&mut self, key: &ListKey) -> Option<Box<dyn SchemaNode>>;

    fn element_type(&self) -> &'static NodeType;
}

impl<K: ListKeyType, T: GeneratedNode> KeyedList for Option<BTreeMap<K, T>> {
    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn set_present(&mut self, present: bool) {
        if !present {
            *self = None;
        } else if self.is_none() {
            *self = Some(BTreeMap::new());
        }
    }

    fn len(&self) -> usize {
        self.as_ref().map_or(0, BTreeMap::len)
    }

    fn entries(&self) -> Vec<(ListKey, &dyn SchemaNode)> {
        self.iter()
            .flat_map(|m| m.iter())
            .map(|(k, v)| (k.to_key(), v as &dyn SchemaNode))
            .collect()
    }

    fn entries_mut(&mut self) -> Vec<(ListKey, &mut dyn SchemaNode)> {
        self.iter_mut()
            .flat_map(|m| m.iter_mut())
            .map(|(k, v)| (k.to_key(), v as &mut dyn SchemaNode))
            .collect()
    }

    fn get(&self, key: &ListKey) -> Option<&dyn SchemaNode> {
        let k = K::from_key(key).ok()?;
        self.as_ref()?.get(&k).map(|n| n as &dyn SchemaNode)
    }

    fn get_mut(&mut self, key: &ListKey) -> Option<&mut dyn SchemaNode> {
        let k = K::from_key(key).ok()?;
        self.as_mut()?.get_mut(&k).map(|n| n as &mut dyn SchemaNode)
    }

    fn insert(&mut self, key: &ListKey, node: Box<dyn SchemaNode>) -> Result<(), NodeError> {
        let k = K::from_key(key)?;
        let node = downcast_node::<T>(node)?;
        self.get_or_insert_with(BTreeMap::new).insert(k, *node);
        Ok(())
    }

    fn insert_new(&mut self, parts: &[&str]) -> Result<(ListKey, &mut dyn SchemaNode), NodeError> {
        let k = K::parse_key(parts)?;
        let key = k.to_key();
        let node: &mut dyn SchemaNode = self.get_or_insert_with(BTreeMap::new).entry(k).or_default();
        Ok((key, node))
    }

    fn remove(&mut self, key: &ListKey) -> Option<Box<dyn SchemaNode>> {
        let k = K::from_key(key).ok()?;
        self.as_mut()?
            .remove(&k)
            .map(|n| Box::new(n) as Box<dyn SchemaNode>)
    }

    fn element_type(&self) -> &'static NodeType {
        T::static_type()
    }
}
