//! Loading of schema descriptor trees from YAML.

use super::elements::{EntrySpec, Schema};

/// Parser builds a schema descriptor tree from a YAML document.
#[derive(Debug, Clone)]
pub struct Parser {
    pub schema: Schema,
}

impl Parser {
    /// Creates a new parser from a YAML schema string.
    pub fn new(schema_yaml: &str) -> Result<Parser, ParseError> {
        let spec: EntrySpec = serde_yaml::from_str(schema_yaml)
            .map_err(|e| ParseError::new(format!("failed to parse schema: {}", e)))?;
        let schema = Schema::build(spec).map_err(|e| ParseError::new(e.to_string()))?;
        log::debug!(
            "loaded schema {} with {} entries",
            schema.root().name(),
            schema.len()
        );
        Ok(Parser { schema })
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }
}

impl Schema {
    /// Parses and builds a schema from YAML.
    pub fn from_yaml(schema_yaml: &str) -> Result<Schema, ParseError> {
        Parser::new(schema_yaml).map(Parser::into_schema)
    }
}

/// Error type for schema loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntryKind, TypeKind};

    const TEST_SCHEMA: &str = r#"
name: device
fakeroot: true
module: oc
children:
- name: system
  children:
  - name: config
    children:
    - name: hostname
      kind: leaf
      type:
        kind: string
        length: "1..253"
        pattern: ['[a-z0-9.-]+']
- name: vlans
  children:
  - name: vlan
    kind: list
    key: vlan-id
    module: oc-vlan
    children:
    - name: vlan-id
      kind: leaf
      type: {kind: uint16, range: "1..4094"}
    - name: members
      kind: leaf-list
      type:
        kind: union
        types:
        - {kind: uint16}
        - {kind: enumeration, enum: [all]}
"#;

    #[test]
    fn test_parser_new() {
        let schema = Parser::new(TEST_SCHEMA).unwrap().into_schema();
        let root = schema.root();
        assert!(root.is_fake_root());
        assert_eq!(root.module(), Some("oc"));

        let hostname = schema.find("system/config/hostname").unwrap();
        let ty = hostname.leaf_type().unwrap();
        assert_eq!(ty.kind, TypeKind::String);
        assert!(ty.length_set().unwrap().contains_int(253));
        assert_eq!(hostname.module(), Some("oc"));

        let vlan = schema.find("vlans/vlan").unwrap();
        assert_eq!(vlan.kind(), EntryKind::List);
        assert_eq!(vlan.module(), Some("oc-vlan"));
        assert_eq!(vlan.child("vlan-id").unwrap().module(), Some("oc-vlan"));

        let members = vlan.child("members").unwrap();
        assert_eq!(members.kind(), EntryKind::LeafList);
        assert_eq!(members.leaf_type().unwrap().types.len(), 2);
    }

    #[test]
    fn test_parser_errors() {
        assert!(Parser::new("name: [").is_err());

        let err = Schema::from_yaml(
            r#"
name: root
children:
- name: bad
  kind: leaf
  type: {kind: uint8, range: "1..oops"}
"#,
        )
        .unwrap_err();
        assert!(err.message.contains("bad"), "{}", err);
    }
}
