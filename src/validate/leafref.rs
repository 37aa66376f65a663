//! Referential integrity of leafref values.

use super::validation::ValidationError;
use super::validator::Validator;
use crate::path::{strip_module_prefix, Path, PathElem};
use crate::schema::{strip_predicates, EntryRef};
use crate::value::Value;
use crate::ytypes::{retrieve_node, RetrieveArgs};

/// Checks that `value`, held by the leaf `entry` at data path `path`, is
/// present at the target of the leafref expression `expr`.
pub(crate) fn check_reference(
    v: &Validator<'_>,
    entry: EntryRef<'_>,
    expr: &str,
    value: &Value,
    path: &Path,
) -> Result<(), ValidationError> {
    let Some(target) = target_path(entry, expr, path)? else {
        log::debug!("leafref {:?} at {} leaves the validated tree, not checked", expr, path);
        return Ok(());
    };

    let args = RetrieveArgs {
        partial_key_match: true,
        skip_missing: true,
    };
    let found = match retrieve_node(v.root_schema, v.root, &target, args) {
        Ok(found) => found,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(ValidationError::schema(path.to_string(), e.to_string())),
    };
    let matched = found.iter().any(|n| match n.data.leaf() {
        Some(Value::LeafList(items)) => items.contains(value),
        Some(other) => other == value,
        None => false,
    });
    if matched {
        return Ok(());
    }
    Err(ValidationError::missing_leafref(
        path.to_string(),
        value.to_string(),
        target.to_string(),
    ))
}

/// Builds the data path a leafref points at. Absolute expressions start at
/// the root; relative ones start at the referencing leaf's own data path, so
/// list keys above the common ancestor stay bound to the current entry.
/// Lists entered below that point match any key.
///
/// Returns `None` when the expression climbs above the data path.
fn target_path(entry: EntryRef<'_>, expr: &str, path: &Path) -> Result<Option<Path>, ValidationError> {
    let stripped = strip_predicates(expr);
    let (mut schema, mut elems) = if stripped.starts_with('/') {
        (entry.schema().root(), Vec::new())
    } else {
        (entry, path.relative_elems().to_vec())
    };
    let segs: Vec<&str> = stripped
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for (i, seg) in segs.iter().enumerate() {
        if *seg == ".." {
            let Some(parent) = schema.data_parent() else {
                return Ok(None);
            };
            if elems.pop().is_none() {
                return Ok(None);
            }
            schema = parent;
            continue;
        }
        let name = strip_module_prefix(seg);
        match schema.data_child(name) {
            Some(child) => {
                let mut elem = PathElem::new(name);
                if child.is_list() {
                    for key in child.key() {
                        elem = elem.with_key(key.as_str(), "*");
                    }
                }
                elems.push(elem);
                schema = child;
            }
            None if schema.is_fake_root()
                && segs
                    .get(i + 1)
                    .is_some_and(|next| schema.data_child(strip_module_prefix(next)).is_some()) => {}
            None => {
                return Err(ValidationError::schema(
                    path.to_string(),
                    format!("leafref {:?}: no child {} under {}", expr, name, schema.name()),
                ))
            }
        }
    }
    Ok(Some(Path::from_elems(elems)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::device_schema;

    #[test]
    fn test_relative_target_keeps_bound_keys() {
        let schema = device_schema();
        let leaf = schema.find("interfaces/interface/config/primary-subinterface").unwrap();
        let path = Path::parse("/interfaces/interface[name=eth0]/config/primary-subinterface").unwrap();
        let expr = leaf.leaf_type().unwrap().path.clone().unwrap();
        let target = target_path(leaf, &expr, &path).unwrap().unwrap();
        assert_eq!(
            target.to_string(),
            "/interfaces/interface[name=eth0]/subinterfaces/subinterface[index=*]/index"
        );
    }

    #[test]
    fn test_absolute_target_uses_wildcards() {
        let schema = device_schema();
        let leaf = schema.find("system/config/mgmt-interface").unwrap();
        let path = Path::parse("/system/config/mgmt-interface").unwrap();
        let expr = leaf.leaf_type().unwrap().path.clone().unwrap();
        let target = target_path(leaf, &expr, &path).unwrap().unwrap();
        assert_eq!(target.to_string(), "/interfaces/interface[name=*]/name");
    }

    #[test]
    fn test_target_above_data_path() {
        let schema = device_schema();
        let leaf = schema.find("interfaces/interface/name").unwrap();
        let path = Path::parse("/name").unwrap();
        assert_eq!(target_path(leaf, "../../../x", &path).unwrap(), None);
    }
}
