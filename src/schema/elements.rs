//! Schema descriptor tree: entries, scalar types and navigation handles.

use super::range::RangeSet;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// EntryKind is the kind of a schema node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    #[default]
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
}

/// TypeKind is the built-in type a leaf is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Boolean,
    Decimal64,
    Enumeration,
    Identityref,
    Union,
    Binary,
    Leafref,
    Empty,
}

impl TypeKind {
    /// Returns the value bounds of the integer kinds.
    pub fn int_bounds(self) -> Option<(i128, i128)> {
        match self {
            TypeKind::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            TypeKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            TypeKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            TypeKind::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            TypeKind::Uint8 => Some((0, u8::MAX as i128)),
            TypeKind::Uint16 => Some((0, u16::MAX as i128)),
            TypeKind::Uint32 => Some((0, u32::MAX as i128)),
            TypeKind::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.int_bounds().is_some()
    }
}

/// ScalarType describes the type of a leaf or leaf-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarType {
    pub kind: TypeKind,

    /// Value range for numeric kinds, in YANG syntax (`1..10 | 20..max`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    /// Length range for string and binary kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    /// Patterns a string value must fully match; all of them apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern: Vec<String>,

    /// Allowed names of an enumeration (or identities of an identityref).
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,

    /// Member types of a union, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<ScalarType>,

    /// Target path expression of a leafref.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip)]
    compiled: OnceCell<Compiled>,
}

#[derive(Debug, Clone, Default)]
struct Compiled {
    range: Option<RangeSet>,
    length: Option<RangeSet>,
    patterns: Vec<Regex>,
}

impl ScalarType {
    /// Creates a type of the given kind with no restrictions.
    pub fn new(kind: TypeKind) -> Self {
        ScalarType {
            kind,
            range: None,
            length: None,
            pattern: Vec::new(),
            enum_values: Vec::new(),
            types: Vec::new(),
            path: None,
            compiled: OnceCell::new(),
        }
    }

    /// Creates a leafref type pointing at the given path expression.
    pub fn leafref(path: impl Into<String>) -> Self {
        ScalarType {
            path: Some(path.into()),
            ..ScalarType::new(TypeKind::Leafref)
        }
    }

    pub fn is_leafref(&self) -> bool {
        self.kind == TypeKind::Leafref
    }

    /// Parses ranges and compiles patterns, recursing into union members.
    /// Called once when the schema is built.
    pub(crate) fn compile(&self) -> Result<(), String> {
        for member in &self.types {
            member.compile()?;
        }
        if self.kind == TypeKind::Union && self.types.is_empty() {
            return Err("union type has no member types".to_string());
        }
        if self.kind == TypeKind::Leafref && self.path.is_none() {
            return Err("leafref type has no path".to_string());
        }
        self.compiled
            .get_or_try_init(|| {
                let range = self.range.as_deref().map(RangeSet::parse).transpose()?;
                let length = self.length.as_deref().map(RangeSet::parse).transpose()?;
                let patterns = self
                    .pattern
                    .iter()
                    .map(|p| {
                        Regex::new(&format!("^(?:{})$", p))
                            .map_err(|e| format!("invalid pattern {:?}: {}", p, e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, String>(Compiled {
                    range,
                    length,
                    patterns,
                })
            })
            .map(|_| ())
    }

    /// Returns the compiled range, once the type is compiled.
    pub fn range_set(&self) -> Option<&RangeSet> {
        self.compiled.get().and_then(|c| c.range.as_ref())
    }

    /// Returns the compiled length range, once the type is compiled.
    pub fn length_set(&self) -> Option<&RangeSet> {
        self.compiled.get().and_then(|c| c.length.as_ref())
    }

    /// Returns the compiled anchored patterns.
    pub fn patterns(&self) -> &[Regex] {
        self.compiled
            .get()
            .map(|c| c.patterns.as_slice())
            .unwrap_or(&[])
    }
}

/// EntryId indexes an entry in its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// Entry is one node of the schema descriptor tree.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub module: Option<String>,
    /// Key leaf names of a list, in declaration order.
    pub key: Vec<String>,
    pub leaf_type: Option<ScalarType>,
    /// Set on a synthesized root that represents the whole device.
    pub fake_root: bool,
    children: BTreeMap<String, EntryId>,
    parent: Option<EntryId>,
}

/// Schema is an immutable descriptor tree stored as an arena.
///
/// Entries refer to their parent by index, so the tree can be shared
/// read-only across threads once built.
#[derive(Debug, Clone)]
pub struct Schema {
    entries: Vec<Entry>,
    root: EntryId,
}

/// EntrySpec is the serialized form of a descriptor subtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntrySpec {
    pub name: String,

    #[serde(default)]
    pub kind: EntryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Space separated key leaf names, as written in YANG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub leaf_type: Option<ScalarType>,

    #[serde(default, rename = "fakeroot", skip_serializing_if = "std::ops::Not::not")]
    pub fake_root: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntrySpec>,
}

impl EntrySpec {
    /// Creates a new entry spec with no children.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        EntrySpec {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    /// Creates a new leaf entry spec.
    pub fn leaf(name: impl Into<String>, leaf_type: ScalarType) -> Self {
        EntrySpec {
            leaf_type: Some(leaf_type),
            ..EntrySpec::new(name, EntryKind::Leaf)
        }
    }

    /// Adds a child entry spec.
    pub fn child(mut self, child: EntrySpec) -> Self {
        self.children.push(child);
        self
    }
}

/// SchemaError reports an inconsistent descriptor tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema entry {entry}: {message}")]
pub struct SchemaError {
    pub entry: String,
    pub message: String,
}

impl Schema {
    /// Builds the arena from a descriptor tree, checking that every leaf has a
    /// type, every list key names a child leaf, and every type compiles.
    pub fn build(root: EntrySpec) -> Result<Schema, SchemaError> {
        let mut schema = Schema {
            entries: Vec::new(),
            root: EntryId(0),
        };
        schema.add(root, None, None)?;
        Ok(schema)
    }

    fn add(
        &mut self,
        spec: EntrySpec,
        parent: Option<EntryId>,
        parent_module: Option<&str>,
    ) -> Result<EntryId, SchemaError> {
        let err = |message: String| SchemaError {
            entry: spec.name.clone(),
            message,
        };

        let is_leaf = matches!(spec.kind, EntryKind::Leaf | EntryKind::LeafList);
        match (&spec.leaf_type, is_leaf) {
            (None, true) => return Err(err("leaf has no type".to_string())),
            (Some(_), false) => return Err(err("only leaves may carry a type".to_string())),
            (Some(t), true) => t.compile().map_err(&err)?,
            (None, false) => {}
        }

        let key: Vec<String> = spec
            .key
            .as_deref()
            .map(|k| k.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        if !key.is_empty() && spec.kind != EntryKind::List {
            return Err(err("only lists may declare a key".to_string()));
        }
        for k in &key {
            let found = spec
                .children
                .iter()
                .any(|c| c.name == *k && c.kind == EntryKind::Leaf);
            if !found {
                return Err(err(format!("key leaf {} is not a child leaf", k)));
            }
        }

        let module = spec
            .module
            .clone()
            .or_else(|| parent_module.map(str::to_string));
        let id = EntryId(self.entries.len());
        self.entries.push(Entry {
            name: spec.name.clone(),
            kind: spec.kind,
            module: module.clone(),
            key,
            leaf_type: spec.leaf_type.clone(),
            fake_root: spec.fake_root,
            children: BTreeMap::new(),
            parent,
        });

        for child in spec.children {
            let name = child.name.clone();
            let child_id = self.add(child, Some(id), module.as_deref())?;
            if self.entries[id.0].children.insert(name.clone(), child_id).is_some() {
                return Err(SchemaError {
                    entry: self.entries[id.0].name.clone(),
                    message: format!("duplicate child {}", name),
                });
            }
        }
        Ok(id)
    }

    /// Returns the root entry.
    pub fn root(&self) -> EntryRef<'_> {
        EntryRef {
            schema: self,
            id: self.root,
        }
    }

    /// Looks up an entry by a `/`-separated schema path from the root.
    pub fn find(&self, path: &str) -> Option<EntryRef<'_>> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self.root(), |e, seg| e.child(seg))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }
}

/// EntryRef is a cheap handle to an entry of a schema.
#[derive(Clone, Copy)]
pub struct EntryRef<'a> {
    schema: &'a Schema,
    id: EntryId,
}

impl<'a> EntryRef<'a> {
    /// Returns the entry's id within its schema.
    pub fn id(self) -> EntryId {
        self.id
    }

    /// Returns the schema the entry belongs to.
    pub fn schema(self) -> &'a Schema {
        self.schema
    }

    /// Returns the entry itself.
    pub fn entry(self) -> &'a Entry {
        self.schema.entry(self.id)
    }

    /// Returns the entry's name, without module prefix.
    pub fn name(self) -> &'a str {
        &self.entry().name
    }

    /// Returns the entry's kind.
    pub fn kind(self) -> EntryKind {
        self.entry().kind
    }

    /// Returns the module the entry belongs to, if declared or inherited.
    pub fn module(self) -> Option<&'a str> {
        self.entry().module.as_deref()
    }

    /// Returns the key leaf names of a list, empty otherwise.
    pub fn key(self) -> &'a [String] {
        &self.entry().key
    }

    /// Returns the scalar type of a leaf or leaf-list.
    pub fn leaf_type(self) -> Option<&'a ScalarType> {
        self.entry().leaf_type.as_ref()
    }

    /// Reports whether the entry is a synthesized root.
    pub fn is_fake_root(self) -> bool {
        self.entry().fake_root
    }

    pub fn is_list(self) -> bool {
        self.kind() == EntryKind::List
    }

    pub fn is_container(self) -> bool {
        self.kind() == EntryKind::Container
    }

    pub fn is_leaf(self) -> bool {
        matches!(self.kind(), EntryKind::Leaf | EntryKind::LeafList)
    }

    pub fn is_choice_or_case(self) -> bool {
        matches!(self.kind(), EntryKind::Choice | EntryKind::Case)
    }

    /// Reports whether the entry is a leaf of leafref type.
    pub fn is_leafref(self) -> bool {
        self.leaf_type().is_some_and(ScalarType::is_leafref)
    }

    /// Returns the direct child with the given name.
    pub fn child(self, name: &str) -> Option<EntryRef<'a>> {
        self.entry().children.get(name).map(|&id| self.with_id(id))
    }

    /// Returns the data child with the given name, looking through choice
    /// and case entries, which do not appear in data paths.
    pub fn data_child(self, name: &str) -> Option<EntryRef<'a>> {
        if let Some(c) = self.child(name) {
            return Some(c);
        }
        self.children()
            .filter(|c| c.is_choice_or_case())
            .find_map(|c| c.data_child(name))
    }

    /// Iterates over the direct children in name order.
    pub fn children(self) -> impl Iterator<Item = EntryRef<'a>> + 'a {
        let schema = self.schema;
        self.entry()
            .children
            .values()
            .map(move |&id| EntryRef { schema, id })
    }

    /// Returns the direct parent, choice and case entries included.
    pub fn parent(self) -> Option<EntryRef<'a>> {
        self.entry().parent.map(|id| self.with_id(id))
    }

    /// Returns the nearest ancestor that is neither a choice nor a case.
    pub fn data_parent(self) -> Option<EntryRef<'a>> {
        let mut p = self.parent()?;
        while p.is_choice_or_case() {
            p = p.parent()?;
        }
        Some(p)
    }

    /// Returns the entries from below the root down to this one, skipping
    /// choice and case entries.
    pub fn data_ancestry(self) -> Vec<EntryRef<'a>> {
        let mut out = Vec::new();
        let mut cur = Some(self);
        while let Some(e) = cur {
            if e.parent().is_none() {
                break;
            }
            if !e.is_choice_or_case() {
                out.push(e);
            }
            cur = e.parent();
        }
        out.reverse();
        out
    }

    fn with_id(self, id: EntryId) -> EntryRef<'a> {
        EntryRef {
            schema: self.schema,
            id,
        }
    }
}

impl PartialEq for EntryRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.id == other.id
    }
}

impl Eq for EntryRef<'_> {}

impl fmt::Debug for EntryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

impl fmt::Display for EntryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::build(
            EntrySpec::new("device", EntryKind::Container)
                .child(
                    EntrySpec::new("interfaces", EntryKind::Container).child(
                        EntrySpec {
                            key: Some("name".into()),
                            ..EntrySpec::new("interface", EntryKind::List)
                        }
                        .child(EntrySpec::leaf("name", ScalarType::new(TypeKind::String)))
                        .child(
                            EntrySpec::new("mode", EntryKind::Choice).child(
                                EntrySpec::new("routed", EntryKind::Case).child(
                                    EntrySpec::leaf("vrf", ScalarType::new(TypeKind::String)),
                                ),
                            ),
                        ),
                    ),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_type_kind_serialization() {
        assert_eq!(serde_json::to_string(&TypeKind::Uint16).unwrap(), "\"uint16\"");
        assert_eq!(
            serde_json::to_string(&TypeKind::Decimal64).unwrap(),
            "\"decimal64\""
        );
        assert_eq!(
            serde_json::to_string(&EntryKind::LeafList).unwrap(),
            "\"leaf-list\""
        );
    }

    #[test]
    fn test_navigation() {
        let schema = sample();
        let list = schema.find("interfaces/interface").unwrap();
        assert!(list.is_list());
        assert_eq!(list.key(), ["name".to_string()]);
        assert_eq!(list.parent().unwrap().name(), "interfaces");
        assert!(schema.find("interfaces/nope").is_none());

        let vrf = list.data_child("vrf").unwrap();
        assert_eq!(vrf.parent().unwrap().name(), "routed");
        assert_eq!(vrf.data_parent().unwrap(), list);

        let names: Vec<&str> = vrf.data_ancestry().iter().map(|e| e.name()).collect();
        assert_eq!(names, ["interfaces", "interface", "vrf"]);
    }

    #[test]
    fn test_build_rejects_bad_key() {
        let err = Schema::build(
            EntrySpec::new("root", EntryKind::Container).child(EntrySpec {
                key: Some("missing".into()),
                ..EntrySpec::new("list", EntryKind::List)
            }),
        )
        .unwrap_err();
        assert_eq!(err.entry, "list");
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_build_rejects_untyped_leaf() {
        let err =
            Schema::build(EntrySpec::new("root", EntryKind::Container).child(EntrySpec::new(
                "leaf",
                EntryKind::Leaf,
            )))
            .unwrap_err();
        assert!(err.message.contains("no type"));
    }

    #[test]
    fn test_patterns_compiled_anchored() {
        let mut ty = ScalarType::new(TypeKind::String);
        ty.pattern = vec!["[a-z]+".to_string()];
        ty.compile().unwrap();
        assert!(ty.patterns()[0].is_match("abc"));
        assert!(!ty.patterns()[0].is_match("abc1"));

        let mut bad = ScalarType::new(TypeKind::String);
        bad.pattern = vec!["(".to_string()];
        assert!(bad.compile().is_err());
    }
}
