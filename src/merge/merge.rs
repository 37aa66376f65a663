//! Field-parallel merge of two instances of a generated type.

use super::conflict::{Conflict, Conflicts, MergeError};
use crate::diff::{alt_elems, entry_path};
use crate::error::NodeError;
use crate::node::{ContainerSlot, FieldKind, FieldMeta, FieldMut, FieldRef, GeneratedNode, KeyedList, SchemaNode};
use crate::path::Path;
use crate::trace::Trace;

/// MergeOption changes how edge cases are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOption {
    /// Treat an absent list and a present but empty one as equivalent,
    /// preferring the present form.
    EmptyMaps,
    /// Report leaves set to different values on both sides instead of
    /// letting the source win.
    ErrorOnConflict,
}

struct Merger<'o> {
    opts: &'o [MergeOption],
    conflicts: Conflicts,
}

/// Returns a new instance holding `src` merged over `dst`.
pub fn merge(
    dst: &dyn SchemaNode,
    src: &dyn SchemaNode,
    opts: &[MergeOption],
) -> Result<Box<dyn SchemaNode>, MergeError> {
    let mut out = dst.clone_node();
    merge_into(out.as_mut(), src, opts)?;
    Ok(out)
}

/// Merges `src` into `dst` in place.
///
/// On a conflict error `dst` is left holding everything that merged cleanly.
pub fn merge_into(
    dst: &mut dyn SchemaNode,
    src: &dyn SchemaNode,
    opts: &[MergeOption],
) -> Result<(), MergeError> {
    if !dst.same_type(src) {
        return Err(NodeError::invalid_argument(format!(
            "cannot merge {} into {}",
            src.node_type().name,
            dst.node_type().name
        ))
        .into());
    }
    let mut merger = Merger {
        opts,
        conflicts: Conflicts::new(),
    };
    merger.merge_node(dst, src, &Path::new(), Trace::new())?;
    if !merger.conflicts.is_empty() {
        return Err(MergeError::Conflicts(merger.conflicts));
    }
    Ok(())
}

/// Typed form of [`merge`].
pub fn merge_typed<T: GeneratedNode>(dst: &T, src: &T, opts: &[MergeOption]) -> Result<T, MergeError> {
    let mut out = dst.clone();
    merge_into(&mut out, src, opts)?;
    Ok(out)
}

impl Merger<'_> {
    fn has(&self, opt: MergeOption) -> bool {
        self.opts.contains(&opt)
    }

    fn merge_node(
        &mut self,
        dst: &mut dyn SchemaNode,
        src: &dyn SchemaNode,
        prefix: &Path,
        trace: Trace,
    ) -> Result<(), NodeError> {
        let ty = dst.node_type();
        trace.log(format_args!("merge {} at {}", ty.name, prefix));
        for ((meta, fd), fs) in ty.fields.iter().zip(dst.fields_mut()).zip(src.fields()) {
            match (fd, fs) {
                (FieldMut::Leaf(d), FieldRef::Leaf(s)) => {
                    let Some(v) = s.value() else { continue };
                    if self.has(MergeOption::ErrorOnConflict) {
                        if let Some(old) = d.value() {
                            if old != v {
                                self.conflicts.add(Conflict::new(field_path(prefix, meta), old, v));
                                continue;
                            }
                        }
                    }
                    d.set_value(Some(v))?;
                }
                (FieldMut::Container(d), FieldRef::Container(s)) => {
                    self.merge_container(d, s, &field_path(prefix, meta), trace.enter())?
                }
                (FieldMut::List(d), FieldRef::List(s)) => self.merge_list(d, s, prefix, meta, trace.enter())?,
                (d, s) => {
                    return Err(NodeError::internal(format!(
                        "field {} of {} is a {} in the destination but a {} in the source",
                        meta.name,
                        ty.name,
                        d.shape(),
                        s.shape()
                    )))
                }
            }
        }
        Ok(())
    }

    fn merge_container(
        &mut self,
        dst: &mut dyn ContainerSlot,
        src: &dyn ContainerSlot,
        path: &Path,
        trace: Trace,
    ) -> Result<(), NodeError> {
        let Some(child) = src.get() else {
            return Ok(());
        };
        match dst.get_mut() {
            Some(existing) => self.merge_node(existing, child, path, trace),
            None => dst.replace(Some(child.clone_node())),
        }
    }

    fn merge_list(
        &mut self,
        dst: &mut dyn KeyedList,
        src: &dyn KeyedList,
        prefix: &Path,
        meta: &FieldMeta,
        trace: Trace,
    ) -> Result<(), NodeError> {
        if !src.is_present() {
            return Ok(());
        }
        if src.is_empty() {
            if self.has(MergeOption::EmptyMaps) {
                dst.set_present(true);
            }
            return Ok(());
        }
        let keys = match meta.kind {
            FieldKind::List { keys, .. } => keys,
            _ => &[],
        };
        let alt = meta.schema_alternative();
        for (key, entry) in src.entries() {
            match dst.get_mut(&key) {
                Some(existing) => {
                    let path = entry_path(prefix, alt, keys, &key);
                    self.merge_node(existing, entry, &path, trace)?
                }
                None => {
                    trace.log(format_args!("copy entry {}", key));
                    dst.insert(&key, entry.clone_node())?
                }
            }
        }
        Ok(())
    }
}

fn field_path(prefix: &Path, meta: &FieldMeta) -> Path {
    prefix.join(&alt_elems(meta.schema_alternative()))
}
