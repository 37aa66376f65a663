//! Declarative generation of schema-bound types.

/// Declares a generated type together with its descriptor table and its
/// [`SchemaNode`](crate::node::SchemaNode) implementation.
///
/// Each field is written as `name: shape(args) = "path"` where shape is one of
///
/// - `leaf(T)`: an optional scalar stored as `Option<T>`
/// - `leaf_list(T)`: stored as `Vec<T>`
/// - `container(T)`: an optional child stored as `Option<Box<T>>`
/// - `list(K => T; "key", ...)`: a keyed list stored as
///   `Option<BTreeMap<K, T>>`, with the key leaf names in declaration order
///
/// A path may be followed by `shadow "path"` naming schema paths that mirror
/// the field without being stored in it.
///
/// ```
/// use yang_tree::schema_node;
///
/// schema_node! {
///     pub struct Config {
///         name: leaf(String) = "name",
///         mtu: leaf(u16) = "mtu",
///     }
/// }
///
/// schema_node! {
///     pub struct Interface {
///         name: leaf(String) = "config/name|name" shadow "state/name",
///         config: container(Config) = "config",
///     }
/// }
/// ```
#[macro_export]
macro_rules! schema_node {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $field:ident : $shape:ident ( $($args:tt)* ) = $path:literal $(shadow $shadow:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fattr])*
                pub $field: $crate::__node_field_type!($shape($($args)*)),
            )*
        }

        impl $crate::node::GeneratedNode for $name {
            fn static_type() -> &'static $crate::node::NodeType {
                static TYPE: $crate::node::NodeType = $crate::node::NodeType {
                    name: stringify!($name),
                    fields: &[
                        $(
                            $crate::node::FieldMeta {
                                name: stringify!($field),
                                path: $path,
                                shadow: concat!("" $(, $shadow)?),
                                kind: $crate::__node_field_kind!($shape($($args)*)),
                            },
                        )*
                    ],
                    new: <$name as $crate::node::GeneratedNode>::boxed_default,
                };
                &TYPE
            }
        }

        impl $crate::node::SchemaNode for $name {
            fn node_type(&self) -> &'static $crate::node::NodeType {
                <$name as $crate::node::GeneratedNode>::static_type()
            }

            fn fields(&self) -> ::std::vec::Vec<$crate::node::FieldRef<'_>> {
                ::std::vec![
                    $( $crate::__node_field_ref!($shape, &self.$field), )*
                ]
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<$crate::node::FieldMut<'_>> {
                ::std::vec![
                    $( $crate::__node_field_mut!($shape, &mut self.$field), )*
                ]
            }

            fn clone_node(&self) -> ::std::boxed::Box<dyn $crate::node::SchemaNode> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn eq_node(&self, other: &dyn $crate::node::SchemaNode) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$name>()
                    .is_some_and(|o| o == self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __node_field_type {
    (leaf($t:ty)) => { ::std::option::Option<$t> };
    (leaf_list($t:ty)) => { ::std::vec::Vec<$t> };
    (container($t:ty)) => { ::std::option::Option<::std::boxed::Box<$t>> };
    (list($k:ty => $t:ty; $($key:literal),+ $(,)?)) => {
        ::std::option::Option<::std::collections::BTreeMap<$k, $t>>
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __node_field_kind {
    (leaf($t:ty)) => { $crate::node::FieldKind::Leaf };
    (leaf_list($t:ty)) => { $crate::node::FieldKind::LeafList };
    (container($t:ty)) => {
        $crate::node::FieldKind::Container(<$t as $crate::node::GeneratedNode>::static_type)
    };
    (list($k:ty => $t:ty; $($key:literal),+ $(,)?)) => {
        $crate::node::FieldKind::List {
            element: <$t as $crate::node::GeneratedNode>::static_type,
            keys: &[$($key),+],
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __node_field_ref {
    (leaf, $e:expr) => { $crate::node::FieldRef::Leaf($e) };
    (leaf_list, $e:expr) => { $crate::node::FieldRef::Leaf($e) };
    (container, $e:expr) => { $crate::node::FieldRef::Container($e) };
    (list, $e:expr) => { $crate::node::FieldRef::List($e) };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __node_field_mut {
    (leaf, $e:expr) => { $crate::node::FieldMut::Leaf($e) };
    (leaf_list, $e:expr) => { $crate::node::FieldMut::Leaf($e) };
    (container, $e:expr) => { $crate::node::FieldMut::Container($e) };
    (list, $e:expr) => { $crate::node::FieldMut::List($e) };
}

#[cfg(test)]
mod tests {
    use crate::node::{downcast_node, FieldKind, FieldMut, FieldRef, GeneratedNode, SchemaNode};
    use crate::value::{ListKey, Value};

    crate::schema_node! {
        struct Member {
            key1: leaf(String) = "key1",
            key2: leaf(u32) = "config/key2|key2",
            tags: leaf_list(String) = "tags",
        }
    }

    crate::schema_node! {
        struct Group {
            name: leaf(String) = "name",
            inner: container(Member) = "inner",
            member: list((String, u32) => Member; "key1", "key2") = "members/member",
        }
    }

    #[test]
    fn test_descriptor_table() {
        let ty = Group::static_type();
        assert_eq!(ty.name, "Group");
        assert_eq!(ty.fields.len(), 3);
        assert!(matches!(ty.fields[0].kind, FieldKind::Leaf));
        match &ty.fields[2].kind {
            FieldKind::List { element, keys } => {
                assert_eq!(element().name, "Member");
                assert_eq!(*keys, ["key1", "key2"]);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(std::ptr::eq(Group::default().node_type(), ty));

        let member = Member::static_type();
        assert_eq!(member.key_field("key1"), Some(0));
        assert_eq!(member.key_field("key2"), Some(1));
        assert_eq!(member.key_field("tags"), None);
        assert_eq!(member.field("tags").map(|(i, _)| i), Some(2));
    }

    #[test]
    fn test_leaf_slots() {
        let mut m = Member::default();
        match m.field_mut(1) {
            Some(FieldMut::Leaf(slot)) => slot.set_value(Some(Value::Uint(42))).unwrap(),
            _ => panic!("expected leaf"),
        }
        assert_eq!(m.key2, Some(42));

        match m.field_mut(1) {
            Some(FieldMut::Leaf(slot)) => {
                assert!(slot.set_value(Some(Value::from("x"))).is_err());
                assert_eq!(slot.type_name(), "u32");
            }
            _ => panic!("expected leaf"),
        }

        m.tags = vec!["a".into(), "b".into()];
        match m.field(2) {
            Some(FieldRef::Leaf(slot)) => assert_eq!(
                slot.value(),
                Some(Value::LeafList(vec![Value::from("a"), Value::from("b")]))
            ),
            _ => panic!("expected leaf-list"),
        }
    }

    #[test]
    fn test_container_slot() {
        let mut g = Group::default();
        match g.field_mut(1) {
            Some(FieldMut::Container(slot)) => {
                assert!(slot.get().is_none());
                slot.get_or_init();
                assert!(slot.replace(Some(Box::new(Group::default()))).is_err());
            }
            _ => panic!("expected container"),
        }
        assert_eq!(g.inner, Some(Box::default()));
    }

    #[test]
    fn test_keyed_list_slot() {
        let mut g = Group::default();
        let FieldMut::List(list) = g.fields_mut().remove(2) else {
            panic!("expected list");
        };
        assert!(!list.is_present());
        let (key, entry) = list.insert_new(&["forty-two", "42"]).unwrap();
        assert_eq!(key.to_string(), "forty-two,42");
        assert_eq!(entry.node_type().name, "Member");
        assert!(list.insert_new(&["only-one"]).is_err());
        assert_eq!(list.len(), 1);

        let key = ListKey::new(vec![Value::from("forty-two"), Value::Uint(42)]);
        assert!(list.get(&key).is_some());
        assert!(list.remove(&key).is_some());
        assert!(list.is_present());
        assert!(list.is_empty());

        list.set_present(false);
        assert!(g.member.is_none());
    }

    #[test]
    fn test_dyn_equality_and_downcast() {
        let mut a = Group::default();
        a.name = Some("g".into());
        let boxed: Box<dyn SchemaNode> = Box::new(a.clone());
        assert!(boxed.eq_node(&a));
        assert!(boxed.same_type(&Group::default()));
        assert!(!boxed.same_type(&Member::default()));
        assert_eq!(boxed.downcast_ref::<Group>(), Some(&a));
        assert!(downcast_node::<Member>(boxed.clone()).is_err());
        assert_eq!(*downcast_node::<Group>(boxed).unwrap(), a);
    }
}
