//! Full-tree validation against the schema descriptor tree.

use super::leafref::check_reference;
use super::validation::{ValidationError, ValidationErrors, ValidationOption};
use crate::diff::{alt_elems, entry_path};
use crate::node::{FieldKind, FieldMeta, FieldRef, KeyedList, SchemaNode};
use crate::path::Path;
use crate::schema::{child_schema, follow_leafref, resolve_leafref, EntryRef, ScalarType, TypeKind};
use crate::trace::Trace;
use crate::value::Value;

/// Validates `node`, whose schema entry is `schema`, and every node below it.
///
/// All violations are collected. Leafref targets are looked up in the data
/// only when `schema` is the root of its schema tree.
pub fn validate(
    schema: EntryRef<'_>,
    node: &dyn SchemaNode,
    opts: &[ValidationOption],
) -> Result<(), ValidationErrors> {
    let integrity = schema == schema.schema().root();
    if !integrity {
        log::debug!(
            "validating below the schema root at {}, skipping leafref data checks",
            schema.name()
        );
    }
    let mut v = Validator {
        root_schema: schema,
        root: node,
        integrity,
        ignore_missing: opts.contains(&ValidationOption::IgnoreMissingData),
        errors: ValidationErrors::new(),
    };
    v.validate_node(schema, node, &Path::new(), Trace::new());
    if v.errors.is_empty() {
        Ok(())
    } else {
        Err(v.errors)
    }
}

pub(crate) struct Validator<'a> {
    pub root_schema: EntryRef<'a>,
    pub root: &'a dyn SchemaNode,
    integrity: bool,
    ignore_missing: bool,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    fn validate_node(&mut self, schema: EntryRef<'a>, node: &dyn SchemaNode, prefix: &Path, trace: Trace) {
        let ty = node.node_type();
        trace.log(format_args!("validate {} against {} at {}", ty.name, schema.name(), prefix));
        for (meta, field) in ty.fields.iter().zip(node.fields()) {
            let child = match child_schema(schema, meta.path) {
                Ok(Some(child)) => child,
                Ok(None) => {
                    self.errors.add(ValidationError::schema(
                        prefix.to_string(),
                        format!(
                            "field {} of {} with path {:?} not found under schema {}",
                            meta.name,
                            ty.name,
                            meta.path,
                            schema.name()
                        ),
                    ));
                    continue;
                }
                Err(e) => {
                    self.errors.add(ValidationError::schema(prefix.to_string(), e.to_string()));
                    continue;
                }
            };
            match field {
                FieldRef::Leaf(slot) => {
                    if let Some(value) = slot.value() {
                        self.validate_leaf(child, &value, &field_path(prefix, meta));
                    }
                }
                FieldRef::Container(slot) => {
                    if let Some(n) = slot.get() {
                        self.validate_node(child, n, &field_path(prefix, meta), trace.enter());
                    }
                }
                FieldRef::List(list) => self.validate_list(child, list, prefix, meta, trace.enter()),
            }
        }
    }

    fn validate_list(
        &mut self,
        schema: EntryRef<'a>,
        list: &dyn KeyedList,
        prefix: &Path,
        meta: &FieldMeta,
        trace: Trace,
    ) {
        let keys = match meta.kind {
            FieldKind::List { keys, .. } => keys,
            _ => &[],
        };
        let alt = meta.schema_alternative();
        for (key, entry) in list.entries() {
            let path = entry_path(prefix, alt, keys, &key);
            let ty = entry.node_type();
            for (name, want) in keys.iter().zip(key.values()) {
                let Some(got) = ty
                    .key_field(name)
                    .and_then(|i| entry.field(i))
                    .and_then(|f| match f {
                        FieldRef::Leaf(slot) => slot.value(),
                        _ => None,
                    })
                else {
                    continue;
                };
                if got != *want {
                    self.errors.add(ValidationError::key_mismatch(
                        path.to_string(),
                        *name,
                        want.to_string(),
                        got.to_string(),
                    ));
                }
            }
            self.validate_node(schema, entry, &path, trace);
        }
    }

    fn validate_leaf(&mut self, entry: EntryRef<'a>, value: &Value, path: &Path) {
        let Some(ty) = entry.leaf_type() else {
            self.errors.add(ValidationError::schema(
                path.to_string(),
                format!("schema {} is not a typed leaf", entry.name()),
            ));
            return;
        };
        let items: Vec<&Value> = match value {
            Value::LeafList(items) => items.iter().collect(),
            v => vec![v],
        };
        for item in items {
            if let Err(e) = check_scalar(entry, ty, item, &path.to_string()) {
                self.errors.add(e);
                continue;
            }
            if ty.is_leafref() && self.integrity && !self.ignore_missing {
                if let Some(expr) = ty.path.as_deref() {
                    if let Err(e) = check_reference(self, entry, expr, item, path) {
                        self.errors.add(e);
                    }
                }
            }
        }
    }
}

fn field_path(prefix: &Path, meta: &FieldMeta) -> Path {
    prefix.join(&alt_elems(meta.schema_alternative()))
}

/// Checks one scalar value against a leaf type. `entry` is the leaf the type
/// belongs to and anchors relative leafref paths.
pub fn check_scalar(entry: EntryRef<'_>, ty: &ScalarType, value: &Value, path: &str) -> Result<(), ValidationError> {
    let mismatch = |expected: &str| ValidationError::type_mismatch(path, expected, value.kind_name());
    match ty.kind {
        TypeKind::Int8
        | TypeKind::Int16
        | TypeKind::Int32
        | TypeKind::Int64
        | TypeKind::Uint8
        | TypeKind::Uint16
        | TypeKind::Uint32
        | TypeKind::Uint64 => {
            let kind = format!("{:?}", ty.kind).to_lowercase();
            let v = value.as_i128().ok_or_else(|| mismatch(&kind))?;
            if let Some((lo, hi)) = ty.kind.int_bounds() {
                if v < lo || v > hi {
                    return Err(ValidationError::out_of_range(path, v.to_string(), format!("{} bounds", kind)));
                }
            }
            if let Some(range) = ty.range_set() {
                if !range.contains_int(v) {
                    return Err(ValidationError::out_of_range(path, v.to_string(), format!("range {}", range)));
                }
            }
            Ok(())
        }
        TypeKind::Decimal64 => {
            let v = match value {
                Value::Decimal(d) => *d,
                _ => value.as_f64().ok_or_else(|| mismatch("decimal64"))?,
            };
            if let Some(range) = ty.range_set() {
                if !range.contains_float(v) {
                    return Err(ValidationError::out_of_range(path, v.to_string(), format!("range {}", range)));
                }
            }
            Ok(())
        }
        TypeKind::String => {
            let s = value.as_str().ok_or_else(|| mismatch("string"))?;
            if let Some(length) = ty.length_set() {
                let n = s.chars().count();
                if !length.contains_int(n as i128) {
                    return Err(ValidationError::out_of_range(path, format!("length {}", n), format!("length {}", length)));
                }
            }
            for re in ty.patterns() {
                if !re.is_match(s) {
                    return Err(ValidationError::pattern_mismatch(path, s, re.as_str()));
                }
            }
            Ok(())
        }
        TypeKind::Enumeration | TypeKind::Identityref => {
            let s = value.as_str().ok_or_else(|| mismatch("enumeration"))?;
            if !ty.enum_values.is_empty() && !ty.enum_values.iter().any(|e| e == s) {
                return Err(ValidationError::invalid_enum(path, s));
            }
            Ok(())
        }
        TypeKind::Boolean => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(mismatch("boolean")),
        },
        TypeKind::Binary => {
            let Value::Binary(bytes) = value else {
                return Err(mismatch("binary"));
            };
            if let Some(length) = ty.length_set() {
                if !length.contains_int(bytes.len() as i128) {
                    return Err(ValidationError::out_of_range(
                        path,
                        format!("length {}", bytes.len()),
                        format!("length {}", length),
                    ));
                }
            }
            Ok(())
        }
        TypeKind::Empty => match value {
            Value::Empty => Ok(()),
            _ => Err(mismatch("empty")),
        },
        TypeKind::Union => {
            let accepted = ty.types.iter().any(|member| {
                check_member(entry, member, value, path).is_ok()
            });
            if accepted {
                Ok(())
            } else {
                Err(ValidationError::invalid_union(path, value.to_string()))
            }
        }
        TypeKind::Leafref => {
            let target = resolve_leafref(entry).map_err(|e| ValidationError::schema(path, e.to_string()))?;
            let target_type = target.leaf_type().ok_or_else(|| {
                ValidationError::schema(path, format!("leafref target {} is not a typed leaf", target.name()))
            })?;
            check_scalar(target, target_type, value, path)
        }
    }
}

fn check_member(entry: EntryRef<'_>, member: &ScalarType, value: &Value, path: &str) -> Result<(), ValidationError> {
    match member.path.as_deref() {
        Some(expr) if member.is_leafref() => {
            let target = follow_leafref(entry, expr)
                .and_then(resolve_leafref)
                .map_err(|e| ValidationError::schema(path, e.to_string()))?;
            let target_type = target.leaf_type().ok_or_else(|| {
                ValidationError::schema(path, format!("leafref target {} is not a typed leaf", target.name()))
            })?;
            check_scalar(target, target_type, value, path)
        }
        _ => check_scalar(entry, member, value, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn leaf_schema(ty: &str) -> Schema {
        Schema::from_yaml(&format!("name: root\nchildren:\n- name: x\n  kind: leaf\n  type: {}\n", ty)).unwrap()
    }

    fn check(ty: &str, value: Value) -> Result<(), ValidationError> {
        let schema = leaf_schema(ty);
        let leaf = schema.find("x").unwrap();
        check_scalar(leaf, leaf.leaf_type().unwrap(), &value, "/x")
    }

    #[test]
    fn test_integer_width_and_range() {
        assert!(check("{kind: int8}", Value::Int(127)).is_ok());
        assert!(matches!(
            check("{kind: int8}", Value::Int(128)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            check("{kind: uint8}", Value::Int(-1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(check("{kind: uint16, range: \"1..10 | 20\"}", Value::Uint(20)).is_ok());
        let err = check("{kind: uint16, range: \"1..10 | 20\"}", Value::Uint(11)).unwrap_err();
        assert_eq!(err.to_string(), "/x: value 11 outside range 1..10 | 20");
        assert!(matches!(
            check("{kind: int32}", Value::from("1")),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_length_counts_characters() {
        let ty = "{kind: string, length: \"1..3\"}";
        assert!(check(ty, Value::from("äöü")).is_ok());
        assert!(check(ty, Value::from("abcd")).is_err());
        assert!(check(ty, Value::from("")).is_err());
    }

    #[test]
    fn test_all_patterns_must_match() {
        let ty = "{kind: string, pattern: [\"[a-z]+\", \".*x\"]}";
        assert!(check(ty, Value::from("box")).is_ok());
        assert!(matches!(
            check(ty, Value::from("boy")),
            Err(ValidationError::PatternMismatch { .. })
        ));
        // Patterns are anchored at both ends.
        assert!(check(ty, Value::from("box1x")).is_err());
    }

    #[test]
    fn test_enum_decimal_binary_empty() {
        assert!(check("{kind: enumeration, enum: [up, down]}", Value::from("up")).is_ok());
        assert!(matches!(
            check("{kind: enumeration, enum: [up, down]}", Value::from("sideways")),
            Err(ValidationError::InvalidEnum { .. })
        ));
        assert!(check("{kind: decimal64, range: \"0.5..1.5\"}", Value::Decimal(1.0)).is_ok());
        assert!(check("{kind: decimal64, range: \"0.5..1.5\"}", Value::Decimal(1.75)).is_err());
        assert!(check("{kind: binary, length: \"2\"}", Value::Binary(vec![1, 2])).is_ok());
        assert!(check("{kind: binary, length: \"2\"}", Value::Binary(vec![1])).is_err());
        assert!(check("{kind: empty}", Value::Empty).is_ok());
        assert!(check("{kind: boolean}", Value::Empty).is_err());
    }

    #[test]
    fn test_union_accepts_any_member() {
        let ty = "{kind: union, types: [{kind: uint8}, {kind: enumeration, enum: [auto]}]}";
        assert!(check(ty, Value::Uint(200)).is_ok());
        assert!(check(ty, Value::from("auto")).is_ok());
        assert!(matches!(
            check(ty, Value::Uint(300)),
            Err(ValidationError::InvalidUnion { .. })
        ));
        assert!(check(ty, Value::from("manual")).is_err());
    }
}
