use super::*;
use crate::node::SchemaNode;
use crate::path::Path;
use crate::testdata::*;
use crate::value::Value;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn update(path: &str, value: impl Into<Value>) -> Update {
    Update::new(Path::parse(path).unwrap(), value.into())
}

fn as_set(updates: Vec<Update>) -> BTreeSet<Update> {
    updates.into_iter().collect()
}

#[test]
fn test_diff_identical_is_empty() {
    init_logging();
    let a = sample_device();
    assert_eq!(diff(&a, &a.clone()).unwrap(), vec![]);
    let c = sample_c_device();
    assert_eq!(diff(&c, &c).unwrap(), vec![]);
}

#[test]
fn test_diff_new_neighbor_emits_key_leaves() {
    let a = sample_c_device();
    let mut b = a.clone();
    b.neighbor
        .get_or_insert_with(Default::default)
        .insert("192.0.2.1".to_string(), c_neighbor("192.0.2.1", 65001));

    let got = as_set(diff(&a, &b).unwrap());
    let want = as_set(vec![
        update(
            "/bgp/neighbors/neighbor[neighbor-address=192.0.2.1]/config/neighbor-address",
            "192.0.2.1",
        ),
        update(
            "/bgp/neighbors/neighbor[neighbor-address=192.0.2.1]/neighbor-address",
            "192.0.2.1",
        ),
        update(
            "/bgp/neighbors/neighbor[neighbor-address=192.0.2.1]/config/peer-as",
            Value::Uint(65001),
        ),
    ]);
    assert_eq!(got, want);
}

#[test]
fn test_diff_changed_leaf_and_new_container() {
    let a = sample_device();
    let mut b = a.clone();
    {
        let eth0 = b
            .interfaces
            .as_mut()
            .unwrap()
            .interface
            .as_mut()
            .unwrap()
            .get_mut("eth0")
            .unwrap();
        eth0.config.as_mut().unwrap().mtu = Some(1400);
    }
    b.bgp = Some(Box::new(Bgp {
        neighbors: Some(Box::new(Neighbors { neighbor: None })),
    }));

    // An empty container adds no leaves.
    let got = diff(&a, &b).unwrap();
    assert_eq!(
        got,
        vec![update(
            "/interfaces/interface[name=eth0]/config/mtu",
            Value::Uint(1400)
        )]
    );
}

#[test]
fn test_diff_is_forward_only() {
    let a = sample_device();
    let mut b = a.clone();
    b.system = None;
    b.interfaces
        .as_mut()
        .unwrap()
        .interface
        .as_mut()
        .unwrap()
        .remove("eth1");

    assert_eq!(diff(&a, &b).unwrap(), vec![]);

    let removed = deletions(&a, &b).unwrap();
    assert!(removed.contains(&Path::parse("/system/config/hostname").unwrap()));
    assert!(removed.contains(&Path::parse("/interfaces/interface[name=eth1]/config/mtu").unwrap()));
    assert!(!removed.iter().any(|p| p.to_string().contains("eth0")));
}

#[test]
fn test_diff_applied_reaches_target() {
    use crate::ytypes::{set_node, NodeOption};

    let schema = device_schema();
    let mut a = sample_device();
    let mut b = a.clone();
    b.interfaces
        .as_mut()
        .unwrap()
        .interface
        .as_mut()
        .unwrap()
        .insert("eth2".to_string(), interface("eth2", 1280, &[4]));
    b.system.as_mut().unwrap().config.as_mut().unwrap().hostname = Some("core2".to_string());

    for u in diff(&a, &b).unwrap() {
        set_node(
            schema.root(),
            &mut a,
            &u.path,
            u.value,
            &[NodeOption::InitMissingElements],
        )
        .unwrap();
    }
    assert_eq!(a, b);
}

#[test]
fn test_diff_type_mismatch() {
    let err = diff(&sample_device(), &sample_c_device()).unwrap_err();
    assert!(err.message().contains("Device"), "{}", err);
    assert!(deletions(&System::default(), &Bgp::default()).is_err());
}

#[test]
fn test_collect_leaves_counts_alternatives() {
    let leaves = collect_leaves(&c_neighbor("192.0.2.9", 1));
    assert_eq!(leaves.len(), 3);
    let boxed: Box<dyn SchemaNode> = Box::new(sample_device());
    let paths: Vec<String> = collect_leaves(boxed.as_ref())
        .iter()
        .map(|u| u.path.to_string())
        .collect();
    assert!(paths.contains(&"/interfaces/interface[name=eth1]/subinterfaces/subinterface[index=1]/config/index".to_string()));
}
