//! GetNode and NewNode.

use super::options::{has_option, NodeOption};
use crate::error::NodeError;
use crate::node::{FieldKind, FieldMeta, FieldRef, KeyedList, NodeType, SchemaNode};
use crate::path::{matches_prefix, Path, PathElem};
use crate::schema::{child_schema, resolve_leafref, EntryRef};
use crate::trace::Trace;
use crate::value::{ListKey, Value};
use std::fmt;

/// TreeNode is one match returned by [`get_node`].
#[derive(Debug)]
pub struct TreeNode<'a> {
    /// Path of the match with list keys filled in from the data.
    pub path: Path,
    pub schema: EntryRef<'a>,
    pub data: NodeData<'a>,
}

/// NodeData is the value found at a path.
pub enum NodeData<'a> {
    Leaf(Option<Value>),
    /// A container or list entry; `None` when the container is absent.
    Node(Option<&'a dyn SchemaNode>),
}

impl<'a> NodeData<'a> {
    pub fn leaf(&self) -> Option<&Value> {
        match self {
            NodeData::Leaf(v) => v.as_ref(),
            NodeData::Node(_) => None,
        }
    }

    pub fn node(&self) -> Option<&'a dyn SchemaNode> {
        match self {
            NodeData::Node(n) => *n,
            NodeData::Leaf(_) => None,
        }
    }
}

impl fmt::Debug for NodeData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Leaf(v) => f.debug_tuple("Leaf").field(v).finish(),
            NodeData::Node(Some(n)) => write!(f, "Node({})", n.node_type().name),
            NodeData::Node(None) => write!(f, "Node(None)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RetrieveArgs {
    pub partial_key_match: bool,
    /// Absent data yields no match instead of NotFound.
    pub skip_missing: bool,
}

enum Data<'a> {
    Node(&'a dyn SchemaNode),
    Missing,
    Leaf(Option<Value>),
    List(&'a dyn KeyedList),
}

/// Returns the nodes at `path` below `root`, whose schema entry is `schema`.
///
/// Without [`NodeOption::PartialKeyMatch`] every list step must name all keys
/// and at most one node is returned.
pub fn get_node<'a>(
    schema: EntryRef<'a>,
    root: &'a dyn SchemaNode,
    path: &Path,
    opts: &[NodeOption],
) -> Result<Vec<TreeNode<'a>>, NodeError> {
    let args = RetrieveArgs {
        partial_key_match: has_option(opts, NodeOption::PartialKeyMatch),
        skip_missing: false,
    };
    retrieve_node(schema, root, path, args)
}

pub(crate) fn retrieve_node<'a>(
    schema: EntryRef<'a>,
    root: &'a dyn SchemaNode,
    path: &Path,
    args: RetrieveArgs,
) -> Result<Vec<TreeNode<'a>>, NodeError> {
    retrieve(
        schema,
        Data::Node(root),
        path.relative_elems(),
        Path::new(),
        args,
        Trace::new(),
    )
}

fn retrieve<'a>(
    schema: EntryRef<'a>,
    data: Data<'a>,
    path: &[PathElem],
    traversed: Path,
    args: RetrieveArgs,
    trace: Trace,
) -> Result<Vec<TreeNode<'a>>, NodeError> {
    trace.log(format_args!("retrieve {} at {} remaining {}", schema.name(), traversed, display_elems(path)));
    if path.is_empty() {
        let data = match data {
            Data::Node(n) => NodeData::Node(Some(n)),
            Data::Missing => NodeData::Node(None),
            Data::Leaf(v) => NodeData::Leaf(v),
            Data::List(_) => {
                return Err(NodeError::invalid_argument(format!(
                    "path {} ends at list {} without selecting an entry",
                    traversed,
                    schema.name()
                )))
            }
        };
        return Ok(vec![TreeNode {
            path: traversed,
            schema,
            data,
        }]);
    }

    match data {
        Data::Node(node) => retrieve_container(schema, node, path, traversed, args, trace.enter()),
        Data::List(list) => retrieve_list(schema, list, path, traversed, args, trace.enter()),
        Data::Missing if args.skip_missing => Ok(Vec::new()),
        Data::Missing => Err(NodeError::not_found(format!(
            "could not find path in tree beyond schema node {}, remaining path {}",
            schema.name(),
            display_elems(path)
        ))),
        Data::Leaf(_) => Err(NodeError::not_found(format!(
            "path {} continues below leaf {}",
            display_elems(path),
            schema.name()
        ))),
    }
}

/// Finds the first field whose path, or one of its alternatives, is a prefix
/// of `path`. Returns the field index and the number of path segments.
pub(crate) fn match_field(ty: &'static NodeType, path: &[PathElem]) -> Option<(usize, usize)> {
    ty.fields.iter().enumerate().find_map(|(i, meta)| {
        meta.alternatives().find_map(|alt| {
            let segs: Vec<&str> = alt.split('/').filter(|s| !s.is_empty()).collect();
            (!segs.is_empty() && matches_prefix(path, &segs)).then_some((i, segs.len()))
        })
    })
}

/// Resolves the schema entry of a field, following leafrefs.
pub(crate) fn field_schema<'a>(
    schema: EntryRef<'a>,
    ty: &NodeType,
    meta: &FieldMeta,
) -> Result<EntryRef<'a>, NodeError> {
    let child = child_schema(schema, meta.path)?.ok_or_else(|| {
        NodeError::schema_mismatch(format!(
            "field {} of {} with path {:?} not found under schema {}",
            meta.name,
            ty.name,
            meta.path,
            schema.name()
        ))
    })?;
    resolve_leafref(child)
}

fn retrieve_container<'a>(
    schema: EntryRef<'a>,
    node: &'a dyn SchemaNode,
    path: &[PathElem],
    traversed: Path,
    args: RetrieveArgs,
    trace: Trace,
) -> Result<Vec<TreeNode<'a>>, NodeError> {
    let ty = node.node_type();
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
    let field = node.field(index).ok_or_else(|| {
        NodeError::internal(format!("{} has no field at index {}", ty.name, index))
    })?;

    // A list field keeps its last segment, which carries the entry's keys.
    let consumed = if meta.is_list() { segs - 1 } else { segs };
    let traversed = traversed.join(&path[..consumed]);
    let data = match field {
        FieldRef::Leaf(slot) => Data::Leaf(slot.value()),
        FieldRef::Container(slot) => slot.get().map_or(Data::Missing, Data::Node),
        FieldRef::List(list) => Data::List(list),
    };
    retrieve(child, data, &path[consumed..], traversed, args, trace)
}

fn retrieve_list<'a>(
    schema: EntryRef<'a>,
    list: &'a dyn KeyedList,
    path: &[PathElem],
    traversed: Path,
    args: RetrieveArgs,
    trace: Trace,
) -> Result<Vec<TreeNode<'a>>, NodeError> {
    let keys = schema.key();
    if keys.is_empty() {
        return Err(NodeError::invalid_argument(format!(
            "schema {} is a list without a key",
            schema.name()
        )));
    }
    let step = &path[0];
    if !step.has_key() {
        return Err(NodeError::invalid_argument(format!(
            "path element {} selects list {} without a key",
            step,
            schema.name()
        )));
    }

    let mut matches = Vec::new();
    for (key, entry) in list.entries() {
        if key.len() != keys.len() {
            return Err(NodeError::schema_mismatch(format!(
                "list {} declares {} keys but entry key {} has {}",
                schema.name(),
                keys.len(),
                key,
                key.len()
            )));
        }
        if !key_matches(schema, keys, &key, step, args.partial_key_match)? {
            continue;
        }
        trace.log(format_args!("matched entry {} of {}", key, schema.name()));
        let elem = PathElem {
            name: step.name.clone(),
            key: keys
                .iter()
                .cloned()
                .zip(key.values().iter().map(Value::to_string))
                .collect(),
        };
        let found = retrieve(
            schema,
            Data::Node(entry),
            &path[1..],
            traversed.with(elem),
            args,
            trace.enter(),
        );
        match found {
            Ok(found) => matches.extend(found),
            // A wildcard match whose subtree lacks the rest of the path adds nothing.
            Err(e) if args.partial_key_match && e.is_not_found() => {
                trace.log(format_args!("skipping entry {}: {}", key, e));
            }
            Err(e) => return Err(e),
        }
        if !args.partial_key_match {
            break;
        }
    }

    if matches.is_empty() && !args.skip_missing {
        return Err(NodeError::not_found(format!(
            "could not find entry {} of list {} in {}",
            step,
            schema.name(),
            traversed
        )));
    }
    Ok(matches)
}

/// Compares an entry key with the keys of a path step, component by component
/// in declaration order.
fn key_matches(
    schema: EntryRef<'_>,
    keys: &[String],
    key: &ListKey,
    step: &PathElem,
    partial: bool,
) -> Result<bool, NodeError> {
    for (name, value) in keys.iter().zip(key.values()) {
        match step.key.get(name) {
            Some(want) if partial && want == "*" => {}
            Some(want) => {
                if *want != value.to_string() {
                    return Ok(false);
                }
            }
            None if partial => {}
            None => {
                return Err(NodeError::not_found(format!(
                    "key {} of list {} missing from path element {}",
                    name,
                    schema.name(),
                    step
                )))
            }
        }
    }
    Ok(true)
}

/// Returns a zero-valued instance of the type found at `path` below
/// `root_type`. List steps select the element type; their keys are ignored.
pub fn new_node(root_type: &'static NodeType, path: &Path) -> Result<Box<dyn SchemaNode>, NodeError> {
    new_node_at(root_type, path.relative_elems())
}

fn new_node_at(ty: &'static NodeType, path: &[PathElem]) -> Result<Box<dyn SchemaNode>, NodeError> {
    if path.is_empty() {
        return Ok(ty.new_node());
    }
    let Some((index, segs)) = match_field(ty, path) else {
        return Err(NodeError::not_found(format!(
            "no match found in {} for path {}",
            ty.name,
            display_elems(path)
        )));
    };
    let meta = &ty.fields[index];
    let rest = &path[segs..];
    match &meta.kind {
        FieldKind::Container(t) => new_node_at(t(), rest),
        FieldKind::List { element, .. } => new_node_at(element(), rest),
        FieldKind::Leaf | FieldKind::LeafList => Err(NodeError::invalid_argument(format!(
            "path {} addresses leaf {} of {}, which is not a container",
            display_elems(path),
            meta.name,
            ty.name
        ))),
    }
}

pub(crate) fn display_elems(elems: &[PathElem]) -> Path {
    Path::from_elems(elems.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::GeneratedNode;
    use crate::testdata::*;

    #[test]
    fn test_get_leaf() {
        init_logging();
        let schema = device_schema();
        let device = sample_device();
        let path = Path::parse("/interfaces/interface[name=eth1]/config/mtu").unwrap();
        let got = get_node(schema.root(), &device, &path, &[]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].data.leaf(), Some(&Value::Uint(9000)));
        assert_eq!(got[0].schema.name(), "mtu");
        assert_eq!(got[0].path, path);
    }

    #[test]
    fn test_get_empty_path_returns_root() {
        let schema = device_schema();
        let device = sample_device();
        let got = get_node(schema.root(), &device, &Path::new(), &[]).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].data.node().unwrap().eq_node(&device));
    }

    #[test]
    fn test_get_absent_container() {
        let schema = device_schema();
        let device = sample_device();
        let got = get_node(schema.root(), &device, &Path::from_names(["bgp"]), &[]).unwrap();
        assert!(got[0].data.node().is_none());

        let err = get_node(
            schema.root(),
            &device,
            &Path::from_names(["bgp", "neighbors"]),
            &[],
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_key_leaf_resolves_leafref() {
        let schema = device_schema();
        let device = sample_device();
        let path = Path::parse("/interfaces/interface[name=eth0]/name").unwrap();
        let got = get_node(schema.root(), &device, &path, &[]).unwrap();
        assert_eq!(got[0].data.leaf(), Some(&Value::from("eth0")));
        assert_eq!(got[0].schema.parent().unwrap().name(), "config");
    }

    #[test]
    fn test_get_list_errors() {
        let schema = device_schema();
        let device = sample_device();

        let no_key = Path::from_names(["interfaces", "interface", "config"]);
        let err = get_node(schema.root(), &device, &no_key, &[]).unwrap_err();
        assert!(matches!(err, NodeError::InvalidArgument { .. }), "{}", err);

        let missing = Path::parse("/interfaces/interface[name=eth9]/config").unwrap();
        let err = get_node(schema.root(), &device, &missing, &[]).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message().contains("eth9"), "{}", err);

        let bad_leaf = Path::parse("/interfaces/interface[name=eth0]/config/speed").unwrap();
        let err = get_node(schema.root(), &device, &bad_leaf, &[]).unwrap_err();
        assert!(err.message().contains("InterfaceConfig"), "{}", err);
    }

    #[test]
    fn test_get_compressed_aliases() {
        let schema = device_schema();
        let device = sample_c_device();

        for text in [
            "/interfaces/interface[name=eth0]/config/name",
            "/interfaces/interface[name=eth0]/name",
        ] {
            let got = get_node(schema.root(), &device, &Path::parse(text).unwrap(), &[]).unwrap();
            assert_eq!(got[0].data.leaf(), Some(&Value::from("eth0")), "{}", text);
        }

        let host = Path::parse("/system/config/hostname").unwrap();
        let got = get_node(schema.root(), &device, &host, &[]).unwrap();
        assert_eq!(got[0].data.leaf(), Some(&Value::from("edge1")));
    }

    #[test]
    fn test_new_node() {
        let node = new_node(
            Device::static_type(),
            &Path::parse("/interfaces/interface[name=eth0]/config").unwrap(),
        )
        .unwrap();
        assert!(node.eq_node(&InterfaceConfig::default()));

        let node = new_node(CDevice::static_type(), &Path::from_names(["interfaces", "interface"])).unwrap();
        assert!(node.downcast_ref::<CInterface>().is_some());

        let root = new_node(Device::static_type(), &Path::new()).unwrap();
        assert!(root.eq_node(&Device::default()));

        let err = new_node(
            Device::static_type(),
            &Path::parse("/system/config/hostname").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, NodeError::InvalidArgument { .. }));

        let err = new_node(Device::static_type(), &Path::from_names(["nope"])).unwrap_err();
        assert!(err.is_not_found());
    }
}
