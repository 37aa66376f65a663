//! Resolution of field path annotations and leafref targets against the
//! descriptor tree.

use super::elements::EntryRef;
use crate::error::NodeError;
use crate::path::strip_module_prefix;

/// Splits a field path annotation into its alternatives, each as a list of
/// segments. Leading `/` are ignored.
pub fn path_alternatives(annotation: &str) -> Vec<Vec<&str>> {
    annotation
        .split('|')
        .map(|alt| alt.split('/').filter(|s| !s.is_empty()).collect())
        .collect()
}

/// Selects the schema route of a field annotation. With several alternatives
/// the first multi-segment one is the uncompressed route; a lone alternative
/// is used as is.
pub fn schema_route(annotation: &str) -> Result<Vec<&str>, NodeError> {
    let mut alts = path_alternatives(annotation);
    if alts.len() == 1 {
        let only = alts.remove(0);
        if only.is_empty() {
            return Err(NodeError::schema_mismatch(format!(
                "empty path annotation {:?}",
                annotation
            )));
        }
        return Ok(only);
    }
    alts.into_iter().find(|a| a.len() > 1).ok_or_else(|| {
        NodeError::schema_mismatch(format!(
            "no multi-element path among alternatives {:?}",
            annotation
        ))
    })
}

/// Returns the route segments of a field relative to its enclosing entry,
/// with a leading segment naming the entry itself removed.
pub fn canonical_route<'p>(entry: EntryRef<'_>, annotation: &'p str) -> Result<Vec<&'p str>, NodeError> {
    let mut route = schema_route(annotation)?;
    if route.len() > 1 && strip_module_prefix(route[0]) == entry.name() {
        route.remove(0);
    }
    Ok(route)
}

/// Finds the descriptor of the field annotated with `annotation` inside
/// `entry`. Returns `Ok(None)` when a segment does not exist.
pub fn child_schema<'a>(
    entry: EntryRef<'a>,
    annotation: &str,
) -> Result<Option<EntryRef<'a>>, NodeError> {
    let route = canonical_route(entry, annotation)?;
    let mut cur = entry;
    for seg in route {
        match cur.data_child(strip_module_prefix(seg)) {
            Some(child) => cur = child,
            None => return Ok(None),
        }
    }
    Ok(Some(cur))
}

/// Removes `[...]` predicate clauses from a leafref path expression.
/// Brackets inside quoted predicate values are not treated as delimiters.
pub fn strip_predicates(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in expr.chars() {
        if depth > 0 {
            match (quote, c) {
                (Some(q), _) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') => depth -= 1,
                _ => {}
            }
            continue;
        }
        if c == '[' {
            depth = 1;
        } else {
            out.push(c);
        }
    }
    out
}

/// Follows leafref types until a non-leafref descriptor is reached.
/// A non-leafref input is returned unchanged.
pub fn resolve_leafref(entry: EntryRef<'_>) -> Result<EntryRef<'_>, NodeError> {
    let limit = entry.schema().len();
    let mut cur = entry;
    let mut hops = 0;
    while let Some(expr) = cur
        .leaf_type()
        .filter(|t| t.is_leafref())
        .and_then(|t| t.path.as_deref())
    {
        if hops >= limit {
            return Err(NodeError::schema_mismatch(format!(
                "leafref cycle starting at {}",
                entry.name()
            )));
        }
        hops += 1;
        cur = follow_leafref(cur, expr)?;
    }
    Ok(cur)
}

/// Resolves one leafref path expression starting from the referencing leaf.
pub fn follow_leafref<'a>(from: EntryRef<'a>, expr: &str) -> Result<EntryRef<'a>, NodeError> {
    let stripped = strip_predicates(expr);
    let mut cur = if stripped.starts_with('/') {
        from.schema().root()
    } else {
        from
    };
    let segs: Vec<&str> = stripped
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut i = 0;
    while i < segs.len() {
        let seg = segs[i];
        if seg == ".." {
            cur = cur.data_parent().ok_or_else(|| {
                NodeError::schema_mismatch(format!(
                    "leafref {:?} of {} moves above the schema root",
                    expr,
                    from.name()
                ))
            })?;
            i += 1;
            continue;
        }
        let name = strip_module_prefix(seg);
        match cur.data_child(name) {
            Some(child) => cur = child,
            None => {
                let elided = cur.is_fake_root()
                    && segs
                        .get(i + 1)
                        .is_some_and(|next| cur.data_child(strip_module_prefix(next)).is_some());
                if !elided {
                    return Err(NodeError::schema_mismatch(format!(
                        "leafref {:?} of {}: no child {} under {}",
                        expr,
                        from.name(),
                        name,
                        cur.name()
                    )));
                }
            }
        }
        i += 1;
    }
    Ok(cur)
}
