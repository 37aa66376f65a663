//! RFC 7951 JSON encoding of generated instances.

use crate::error::NodeError;
use crate::node::{FieldMut, FieldRef, KeyedList, SchemaNode};
use crate::path::strip_module_prefix;
use crate::schema::{child_schema, follow_leafref, resolve_leafref, EntryKind, EntryRef, ScalarType, TypeKind};
use crate::validate::check_scalar;
use crate::value::Value;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value as JsonValue};

/// JsonOption controls encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOption {
    /// Prefix member names with their module name where the module changes,
    /// including every top-level member.
    QualifyModules,
}

/// UnmarshalOption controls decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmarshalOption {
    /// Skip members that match no field instead of failing.
    IgnoreExtraFields,
    /// Accept members at a field's shadow paths. They are skipped, not
    /// decoded.
    AllowShadowPaths,
}

/// Encodes `node`, whose schema entry is `schema`, as a JSON object.
///
/// A field reachable through several path alternatives is written once per
/// alternative.
pub fn to_json(schema: EntryRef<'_>, node: &dyn SchemaNode, opts: &[JsonOption]) -> Result<JsonValue, NodeError> {
    let enc = Encoder {
        qualify: opts.contains(&JsonOption::QualifyModules),
    };
    enc.encode_node(schema, node, schema.module()).map(JsonValue::Object)
}

/// Encodes `node` as pretty-printed JSON text.
pub fn emit_json(schema: EntryRef<'_>, node: &dyn SchemaNode, opts: &[JsonOption]) -> Result<String, NodeError> {
    let json = to_json(schema, node, opts)?;
    serde_json::to_string_pretty(&json).map_err(|e| NodeError::internal(format!("JSON error: {}", e)))
}

/// Decodes a JSON object into `node`, whose schema entry is `schema`.
/// Fields present in the document overwrite those already set in `node`.
pub fn from_json(
    schema: EntryRef<'_>,
    json: &JsonValue,
    node: &mut dyn SchemaNode,
    opts: &[UnmarshalOption],
) -> Result<(), NodeError> {
    let JsonValue::Object(obj) = json else {
        return Err(NodeError::invalid_argument(format!(
            "expected a JSON object for {}, got {}",
            schema.name(),
            json
        )));
    };
    let dec = Decoder {
        ignore_extra: opts.contains(&UnmarshalOption::IgnoreExtraFields),
        allow_shadow: opts.contains(&UnmarshalOption::AllowShadowPaths),
    };
    dec.decode_node(schema, obj, node, "")
}

/// Parses JSON text and decodes it into `node`.
pub fn unmarshal(
    schema: EntryRef<'_>,
    data: &str,
    node: &mut dyn SchemaNode,
    opts: &[UnmarshalOption],
) -> Result<(), NodeError> {
    let json: JsonValue = serde_json::from_str(data)
        .map_err(|e| NodeError::invalid_argument(format!("JSON parse error: {}", e)))?;
    from_json(schema, &json, node, opts)
}

/// Walks the segments of a path alternative below `entry`. A leading segment
/// naming `entry` itself is skipped.
fn route<'a, 'p>(entry: EntryRef<'a>, alt: &'p str) -> Result<Vec<(&'p str, EntryRef<'a>)>, NodeError> {
    let mut segs: Vec<&str> = alt.split('/').filter(|s| !s.is_empty()).collect();
    if segs.len() > 1 && strip_module_prefix(segs[0]) == entry.name() {
        segs.remove(0);
    }
    let mut cur = entry;
    let mut out = Vec::with_capacity(segs.len());
    for seg in segs {
        let name = strip_module_prefix(seg);
        cur = cur.data_child(name).ok_or_else(|| {
            NodeError::schema_mismatch(format!("no schema child {} under {} for path {:?}", name, cur.name(), alt))
        })?;
        out.push((name, cur));
    }
    Ok(out)
}

fn field_entry<'a>(schema: EntryRef<'a>, type_name: &str, field: &str, path: &str) -> Result<EntryRef<'a>, NodeError> {
    child_schema(schema, path)?.ok_or_else(|| {
        NodeError::schema_mismatch(format!(
            "field {} of {} with path {:?} not found under schema {}",
            field,
            type_name,
            path,
            schema.name()
        ))
    })
}

/// Returns the effective type of a leaf, following leafrefs.
fn leaf_type(entry: EntryRef<'_>) -> Result<(EntryRef<'_>, &ScalarType), NodeError> {
    let target = resolve_leafref(entry)?;
    let ty = target
        .leaf_type()
        .ok_or_else(|| NodeError::schema_mismatch(format!("schema {} is not a typed leaf", target.name())))?;
    Ok((target, ty))
}

fn is_wide(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Int64 | TypeKind::Uint64 | TypeKind::Decimal64)
}

struct Encoder {
    qualify: bool,
}

impl Encoder {
    fn encode_node(
        &self,
        schema: EntryRef<'_>,
        node: &dyn SchemaNode,
        module: Option<&str>,
    ) -> Result<Map<String, JsonValue>, NodeError> {
        let ty = node.node_type();
        let mut out = Map::new();
        for (meta, field) in ty.fields.iter().zip(node.fields()) {
            let child = field_entry(schema, ty.name, meta.name, meta.path)?;
            for alt in meta.alternatives() {
                let steps = route(schema, alt)?;
                let mut names = Vec::with_capacity(steps.len());
                let mut ctx = module;
                for (name, entry) in &steps {
                    match entry.module() {
                        Some(m) if self.qualify && ctx != Some(m) => names.push(format!("{}:{}", m, name)),
                        _ => names.push(name.to_string()),
                    }
                    ctx = entry.module();
                }
                let value = match &field {
                    FieldRef::Leaf(slot) => match slot.value() {
                        Some(v) => {
                            let (target, lt) = leaf_type(child)?;
                            Some(encode_scalar(target, lt, &v))
                        }
                        None => None,
                    },
                    FieldRef::Container(slot) => match slot.get() {
                        Some(n) => Some(JsonValue::Object(self.encode_node(child, n, ctx)?)),
                        None => None,
                    },
                    FieldRef::List(list) => {
                        if list.is_present() {
                            let mut items = Vec::with_capacity(list.len());
                            for (_, entry) in list.entries() {
                                items.push(JsonValue::Object(self.encode_node(child, entry, ctx)?));
                            }
                            Some(JsonValue::Array(items))
                        } else {
                            None
                        }
                    }
                };
                if let Some(value) = value {
                    insert_nested(&mut out, &names, value)?;
                }
            }
        }
        Ok(out)
    }
}

fn insert_nested(obj: &mut Map<String, JsonValue>, names: &[String], value: JsonValue) -> Result<(), NodeError> {
    let Some((last, parents)) = names.split_last() else {
        return Err(NodeError::schema_mismatch("empty field path"));
    };
    let mut cur = obj;
    for name in parents {
        let slot = cur
            .entry(name.clone())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        cur = match slot {
            JsonValue::Object(m) => m,
            _ => {
                return Err(NodeError::schema_mismatch(format!(
                    "member {} is both a leaf and a container",
                    name
                )))
            }
        };
    }
    cur.insert(last.clone(), value);
    Ok(())
}

fn encode_scalar(entry: EntryRef<'_>, ty: &ScalarType, value: &Value) -> JsonValue {
    let kind = match ty.kind {
        TypeKind::Union => ty
            .types
            .iter()
            .find(|m| !m.is_leafref() && check_scalar(entry, m, value, "").is_ok())
            .map_or(TypeKind::Union, |m| m.kind),
        k => k,
    };
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) if is_wide(kind) => JsonValue::String(i.to_string()),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Uint(u) if is_wide(kind) => JsonValue::String(u.to_string()),
        Value::Uint(u) => JsonValue::Number((*u).into()),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Binary(b) => JsonValue::String(BASE64.encode(b)),
        Value::Empty => JsonValue::Array(vec![JsonValue::Null]),
        Value::LeafList(items) => JsonValue::Array(items.iter().map(|v| encode_scalar(entry, ty, v)).collect()),
    }
}

struct Decoder {
    ignore_extra: bool,
    allow_shadow: bool,
}

/// Follows `steps` through nested objects. Returns the member keys matched
/// and, when every step matched, the member itself.
fn find_member<'j>(
    obj: &'j Map<String, JsonValue>,
    steps: &[(&str, EntryRef<'_>)],
) -> (Vec<&'j str>, Option<&'j JsonValue>) {
    let mut keys = Vec::with_capacity(steps.len());
    let mut cur = Some(obj);
    for (i, (name, _)) in steps.iter().enumerate() {
        let Some((k, v)) = cur.and_then(|o| lookup(o, name)) else {
            break;
        };
        keys.push(k.as_str());
        if i + 1 == steps.len() {
            return (keys, Some(v));
        }
        cur = v.as_object();
    }
    (keys, None)
}

/// Finds a member by local name, accepting a module-qualified key.
fn lookup<'j>(obj: &'j Map<String, JsonValue>, name: &str) -> Option<(&'j String, &'j JsonValue)> {
    obj.iter().find(|(k, _)| strip_module_prefix(k) == name)
}

impl Decoder {
    fn decode_node(
        &self,
        schema: EntryRef<'_>,
        obj: &Map<String, JsonValue>,
        node: &mut dyn SchemaNode,
        at: &str,
    ) -> Result<(), NodeError> {
        let ty = node.node_type();
        let mut consumed: Vec<Vec<&str>> = Vec::new();
        let mut wrappers: Vec<Vec<&str>> = Vec::new();
        for (meta, mut field) in ty.fields.iter().zip(node.fields_mut()) {
            let child = field_entry(schema, ty.name, meta.name, meta.path)?;
            for alt in meta.shadow_alternatives() {
                let (keys, member) = find_member(obj, &route(schema, alt)?);
                if member.is_none() {
                    if !keys.is_empty() {
                        wrappers.push(keys);
                    }
                    continue;
                }
                let path = format!("{}/{}", at, keys.join("/"));
                if !self.allow_shadow {
                    return Err(NodeError::invalid_argument(format!(
                        "{}: shadow member of field {} of {}",
                        path, meta.name, ty.name
                    )));
                }
                log::debug!("skipping shadow member {}", path);
                consumed.push(keys);
            }
            for alt in meta.alternatives() {
                let (keys, member) = find_member(obj, &route(schema, alt)?);
                let Some(member) = member else {
                    if !keys.is_empty() {
                        wrappers.push(keys);
                    }
                    continue;
                };
                let path = format!("{}/{}", at, keys.join("/"));
                consumed.push(keys);

                match &mut field {
                    FieldMut::Leaf(slot) => {
                        let (target, lt) = leaf_type(child)?;
                        let value = if child.kind() == EntryKind::LeafList {
                            let items = member.as_array().ok_or_else(|| {
                                NodeError::invalid_argument(format!("{}: expected an array, got {}", path, member))
                            })?;
                            Value::LeafList(
                                items
                                    .iter()
                                    .map(|m| decode_scalar(target, lt, m, &path))
                                    .collect::<Result<_, _>>()?,
                            )
                        } else {
                            decode_scalar(target, lt, member, &path)?
                        };
                        slot.set_value(Some(value)).map_err(|e| {
                            NodeError::invalid_argument(format!("{}: {}", path, e))
                        })?;
                    }
                    FieldMut::Container(slot) => {
                        let JsonValue::Object(inner) = member else {
                            return Err(NodeError::invalid_argument(format!(
                                "{}: expected an object, got {}",
                                path, member
                            )));
                        };
                        self.decode_node(child, inner, slot.get_or_init(), &path)?;
                    }
                    FieldMut::List(list) => self.decode_list(child, member, &mut **list, &path)?,
                }
            }
        }

        if !self.ignore_extra {
            check_consumed(obj, &consumed, &wrappers, at)?;
        }
        Ok(())
    }

    fn decode_list(
        &self,
        schema: EntryRef<'_>,
        member: &JsonValue,
        list: &mut dyn KeyedList,
        path: &str,
    ) -> Result<(), NodeError> {
        let JsonValue::Array(items) = member else {
            return Err(NodeError::invalid_argument(format!(
                "{}: expected an array, got {}",
                path, member
            )));
        };
        list.set_present(true);
        for item in items {
            let JsonValue::Object(obj) = item else {
                return Err(NodeError::invalid_argument(format!(
                    "{}: expected list entries to be objects, got {}",
                    path, item
                )));
            };
            let mut parts = Vec::with_capacity(schema.key().len());
            for key in schema.key() {
                let part = match lookup(obj, key) {
                    Some((_, JsonValue::String(s))) => s.clone(),
                    Some((_, v @ (JsonValue::Number(_) | JsonValue::Bool(_)))) => v.to_string(),
                    _ => {
                        return Err(NodeError::invalid_argument(format!(
                            "{}: list entry is missing key {}",
                            path, key
                        )))
                    }
                };
                parts.push(part);
            }
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            let (key, entry) = list.insert_new(&parts)?;
            let entry_path = format!("{}[{}]", path, key);
            self.decode_node(schema, obj, entry, &entry_path)?;
        }
        Ok(())
    }
}

/// Fails on the first member of `obj` not covered by a consumed member path.
/// `wrappers` are the container objects a field's path passes through
/// without reaching the field; they may be present and empty.
fn check_consumed(
    obj: &Map<String, JsonValue>,
    consumed: &[Vec<&str>],
    wrappers: &[Vec<&str>],
    at: &str,
) -> Result<(), NodeError> {
    for (k, v) in obj {
        if consumed.iter().any(|c| c.len() == 1 && c[0] == k.as_str()) {
            continue;
        }
        let below = tails(consumed, k);
        let known = !below.is_empty() || wrappers.iter().any(|c| c[0] == k.as_str());
        match v {
            JsonValue::Object(inner) if known => {
                check_consumed(inner, &below, &tails(wrappers, k), &format!("{}/{}", at, k))?
            }
            _ => {
                return Err(NodeError::invalid_argument(format!(
                    "unknown member {}/{} in JSON document",
                    at, k
                )))
            }
        }
    }
    Ok(())
}

/// Returns the remainders of the member paths that start at `k`.
fn tails<'s>(paths: &[Vec<&'s str>], k: &str) -> Vec<Vec<&'s str>> {
    paths
        .iter()
        .filter(|c| c.len() > 1 && c[0] == k)
        .map(|c| c[1..].to_vec())
        .collect()
}

fn decode_error(path: &str, json: &JsonValue, kind: TypeKind) -> NodeError {
    NodeError::invalid_argument(format!("{}: cannot decode {} as {:?}", path, json, kind))
}

fn decode_scalar(entry: EntryRef<'_>, ty: &ScalarType, json: &JsonValue, path: &str) -> Result<Value, NodeError> {
    let err = || decode_error(path, json, ty.kind);
    match ty.kind {
        TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64 => match json {
            JsonValue::Number(n) => n.as_i64().map(Value::Int).ok_or_else(err),
            JsonValue::String(s) => s.parse().map(Value::Int).map_err(|_| err()),
            _ => Err(err()),
        },
        TypeKind::Uint8 | TypeKind::Uint16 | TypeKind::Uint32 | TypeKind::Uint64 => match json {
            JsonValue::Number(n) => n.as_u64().map(Value::Uint).ok_or_else(err),
            JsonValue::String(s) => s.parse().map(Value::Uint).map_err(|_| err()),
            _ => Err(err()),
        },
        TypeKind::Decimal64 => match json {
            JsonValue::Number(n) => n.as_f64().map(Value::Decimal).ok_or_else(err),
            JsonValue::String(s) => s.parse().map(Value::Decimal).map_err(|_| err()),
            _ => Err(err()),
        },
        TypeKind::String | TypeKind::Enumeration | TypeKind::Identityref => match json {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            _ => Err(err()),
        },
        TypeKind::Boolean => json.as_bool().map(Value::Bool).ok_or_else(err),
        TypeKind::Empty => match json.as_array().map(Vec::as_slice) {
            Some([JsonValue::Null]) => Ok(Value::Empty),
            _ => Err(err()),
        },
        TypeKind::Binary => match json {
            JsonValue::String(s) => BASE64.decode(s).map(Value::Binary).map_err(|_| err()),
            _ => Err(err()),
        },
        TypeKind::Union => ty
            .types
            .iter()
            .find_map(|member| {
                let (target, mt) = if member.is_leafref() {
                    let expr = member.path.as_deref()?;
                    let target = follow_leafref(entry, expr).and_then(resolve_leafref).ok()?;
                    (target, target.leaf_type()?)
                } else {
                    (entry, member)
                };
                let value = decode_scalar(target, mt, json, path).ok()?;
                check_scalar(target, mt, &value, path).is_ok().then_some(value)
            })
            .ok_or_else(err),
        TypeKind::Leafref => {
            let (target, lt) = leaf_type(entry)?;
            decode_scalar(target, lt, json, path)
        }
    }
}
