//! Shared test fixtures: a small device schema and its generated types.

use crate::schema::Schema;
use crate::schema_node;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

pub const DEVICE_SCHEMA: &str = r#"
name: device
fakeroot: true
children:
- name: interfaces
  module: openconfig-interfaces
  children:
  - name: interface
    kind: list
    key: name
    children:
    - name: name
      kind: leaf
      type: {kind: leafref, path: "../config/name"}
    - name: config
      children:
      - name: name
        kind: leaf
        type: {kind: string}
      - name: mtu
        kind: leaf
        type: {kind: uint16, range: "64..9216"}
      - name: description
        kind: leaf
        type: {kind: string, length: "0..64"}
      - name: type
        kind: leaf
        type: {kind: enumeration, enum: [ethernet, loopback, lag]}
      - name: enabled
        kind: leaf
        type: {kind: boolean}
      - name: primary-subinterface
        kind: leaf
        type: {kind: leafref, path: "../../subinterfaces/subinterface/index"}
      - name: aliases
        kind: leaf-list
        type: {kind: string}
    - name: state
      children:
      - name: mtu
        kind: leaf
        type: {kind: uint16}
    - name: subinterfaces
      children:
      - name: subinterface
        kind: list
        key: index
        children:
        - name: index
          kind: leaf
          type: {kind: leafref, path: "../config/index"}
        - name: config
          children:
          - name: index
            kind: leaf
            type: {kind: uint32}
          - name: description
            kind: leaf
            type: {kind: string}
- name: system
  module: openconfig-system
  children:
  - name: config
    children:
    - name: hostname
      kind: leaf
      type: {kind: string, pattern: ['[a-z][a-z0-9-]*']}
    - name: mgmt-interface
      kind: leaf
      type: {kind: leafref, path: "/interfaces/interface[name=current()/../mgmt-interface]/name"}
- name: bgp
  module: openconfig-bgp
  children:
  - name: neighbors
    children:
    - name: neighbor
      kind: list
      key: neighbor-address
      children:
      - name: neighbor-address
        kind: leaf
        type: {kind: leafref, path: "../config/neighbor-address"}
      - name: config
        children:
        - name: neighbor-address
          kind: leaf
          type: {kind: string}
        - name: peer-as
          kind: leaf
          type: {kind: uint32}
        - name: description
          kind: leaf
          type: {kind: string}
"#;

static DEVICE: Lazy<Schema> = Lazy::new(|| match Schema::from_yaml(DEVICE_SCHEMA) {
    Ok(schema) => schema,
    Err(e) => panic!("device schema: {}", e),
});

pub fn device_schema() -> &'static Schema {
    &DEVICE
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

schema_node! {
    pub struct Device {
        interfaces: container(Interfaces) = "interfaces",
        system: container(System) = "system",
        bgp: container(Bgp) = "bgp",
    }
}

schema_node! {
    pub struct Interfaces {
        interface: list(String => Interface; "name") = "interface",
    }
}

schema_node! {
    pub struct Interface {
        name: leaf(String) = "name",
        config: container(InterfaceConfig) = "config",
        subinterfaces: container(Subinterfaces) = "subinterfaces",
    }
}

schema_node! {
    pub struct InterfaceConfig {
        name: leaf(String) = "name",
        mtu: leaf(u16) = "mtu",
        description: leaf(String) = "description",
        if_type: leaf(String) = "type",
        enabled: leaf(bool) = "enabled",
        primary_subinterface: leaf(u32) = "primary-subinterface",
        aliases: leaf_list(String) = "aliases",
    }
}

schema_node! {
    pub struct Subinterfaces {
        subinterface: list(u32 => Subinterface; "index") = "subinterface",
    }
}

schema_node! {
    pub struct Subinterface {
        index: leaf(u32) = "index",
        config: container(SubinterfaceConfig) = "config",
    }
}

schema_node! {
    pub struct SubinterfaceConfig {
        index: leaf(u32) = "index",
        description: leaf(String) = "description",
    }
}

schema_node! {
    pub struct System {
        config: container(SystemConfig) = "config",
    }
}

schema_node! {
    pub struct SystemConfig {
        hostname: leaf(String) = "hostname",
        mgmt_interface: leaf(String) = "mgmt-interface",
    }
}

schema_node! {
    pub struct Bgp {
        neighbors: container(Neighbors) = "neighbors",
    }
}

schema_node! {
    pub struct Neighbors {
        neighbor: list(String => Neighbor; "neighbor-address") = "neighbor",
    }
}

schema_node! {
    pub struct Neighbor {
        neighbor_address: leaf(String) = "neighbor-address",
        config: container(NeighborConfig) = "config",
    }
}

schema_node! {
    pub struct NeighborConfig {
        neighbor_address: leaf(String) = "neighbor-address",
        peer_as: leaf(u32) = "peer-as",
        description: leaf(String) = "description",
    }
}

// Compressed forms: config/state wrappers and surrounding containers are
// folded into the parent type.

schema_node! {
    pub struct CDevice {
        interface: list(String => CInterface; "name") = "interfaces/interface",
        hostname: leaf(String) = "system/config/hostname",
        mgmt_interface: leaf(String) = "system/config/mgmt-interface",
        neighbor: list(String => CNeighbor; "neighbor-address") = "bgp/neighbors/neighbor",
    }
}

schema_node! {
    pub struct CInterface {
        name: leaf(String) = "config/name|name",
        mtu: leaf(u16) = "config/mtu" shadow "state/mtu",
        description: leaf(String) = "config/description",
        if_type: leaf(String) = "config/type",
        enabled: leaf(bool) = "config/enabled",
        primary_subinterface: leaf(u32) = "config/primary-subinterface",
        aliases: leaf_list(String) = "config/aliases",
        subinterface: list(u32 => CSubinterface; "index") = "subinterfaces/subinterface",
    }
}

schema_node! {
    pub struct CSubinterface {
        index: leaf(u32) = "config/index|index",
        description: leaf(String) = "config/description",
    }
}

schema_node! {
    pub struct CNeighbor {
        neighbor_address: leaf(String) = "config/neighbor-address|neighbor-address",
        peer_as: leaf(u32) = "config/peer-as",
        description: leaf(String) = "config/description",
    }
}

pub fn interface(name: &str, mtu: u16, subinterfaces: &[u32]) -> Interface {
    let subs: BTreeMap<u32, Subinterface> = subinterfaces
        .iter()
        .map(|&i| {
            (
                i,
                Subinterface {
                    index: Some(i),
                    config: Some(Box::new(SubinterfaceConfig {
                        index: Some(i),
                        description: None,
                    })),
                },
            )
        })
        .collect();
    Interface {
        name: Some(name.to_string()),
        config: Some(Box::new(InterfaceConfig {
            name: Some(name.to_string()),
            mtu: Some(mtu),
            if_type: Some("ethernet".to_string()),
            ..Default::default()
        })),
        subinterfaces: Some(Box::new(Subinterfaces {
            subinterface: Some(subs),
        })),
    }
}

/// A device with interfaces eth0 (subinterface 0) and eth1 (subinterfaces 0
/// and 1) and a system hostname.
pub fn sample_device() -> Device {
    let interfaces: BTreeMap<String, Interface> = [
        interface("eth0", 1500, &[0]),
        interface("eth1", 9000, &[0, 1]),
    ]
    .into_iter()
    .map(|i| (i.name.clone().unwrap_or_default(), i))
    .collect();
    Device {
        interfaces: Some(Box::new(Interfaces {
            interface: Some(interfaces),
        })),
        system: Some(Box::new(System {
            config: Some(Box::new(SystemConfig {
                hostname: Some("edge1".to_string()),
                mgmt_interface: None,
            })),
        })),
        bgp: None,
    }
}

pub fn c_interface(name: &str, mtu: u16) -> CInterface {
    CInterface {
        name: Some(name.to_string()),
        mtu: Some(mtu),
        ..Default::default()
    }
}

pub fn c_neighbor(address: &str, peer_as: u32) -> CNeighbor {
    CNeighbor {
        neighbor_address: Some(address.to_string()),
        peer_as: Some(peer_as),
        description: None,
    }
}

/// A compressed device with interfaces eth0 and eth1.
pub fn sample_c_device() -> CDevice {
    CDevice {
        interface: Some(
            [c_interface("eth0", 1500), c_interface("eth1", 9000)]
                .into_iter()
                .map(|i| (i.name.clone().unwrap_or_default(), i))
                .collect(),
        ),
        hostname: Some("edge1".to_string()),
        ..Default::default()
    }
}
