//! Typed scalar values carried by leaves and leaf-lists.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Value is the engine-level representation of a leaf value.
///
/// Generated types store leaves in their native Rust types; the engine moves
/// values between them through this enum.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Decimal(f64),
    String(String),
    Binary(Vec<u8>),
    /// The single value of a YANG `empty` leaf.
    Empty,
    /// The contents of a leaf-list.
    LeafList(Vec<Value>),
}

/// ValueError reports a failed conversion between a `Value` and a leaf type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("cannot convert {value} ({kind}) to {target}")]
    Convert {
        value: String,
        kind: &'static str,
        target: &'static str,
    },

    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: &'static str },

    #[error("expected {expected} key components, got {actual}")]
    KeyArity { expected: usize, actual: usize },
}

impl ValueError {
    fn convert(value: &Value, target: &'static str) -> Self {
        ValueError::Convert {
            value: value.to_string(),
            kind: value.kind_name(),
            target,
        }
    }

    fn parse(input: &str, target: &'static str) -> Self {
        ValueError::Parse {
            input: input.to_string(),
            target,
        }
    }
}

impl Value {
    /// Returns a short name for the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Empty => "empty",
            Value::LeafList(_) => "leaf-list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a signed 128-bit integer if it is integral.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i as i128),
            Value::Uint(u) => Some(*u as i128),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_leaf_list(&self) -> Option<&[Value]> {
        match self {
            Value::LeafList(l) => Some(l),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        fn type_order(v: &Value) -> u8 {
            match v {
                Value::Bool(_) => 0,
                Value::Int(_) | Value::Uint(_) => 1,
                Value::Decimal(_) => 2,
                Value::String(_) => 3,
                Value::Binary(_) => 4,
                Value::Empty => 5,
                Value::LeafList(_) => 6,
            }
        }

        let type_cmp = type_order(self).cmp(&type_order(other));
        if type_cmp != Ordering::Equal {
            return type_cmp;
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            // Signed and unsigned integers compare by numeric value.
            (a @ (Value::Int(_) | Value::Uint(_)), b) => a.as_i128().cmp(&b.as_i128()),
            (Value::Decimal(a), Value::Decimal(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Empty, Value::Empty) => Ordering::Equal,
            (Value::LeafList(a), Value::LeafList(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Bool(b) => {
                0u8.hash(state);
                b.hash(state);
            }
            // Int and Uint hash identically so equal numbers hash equally.
            Value::Int(_) | Value::Uint(_) => {
                1u8.hash(state);
                self.as_i128().hash(state);
            }
            Value::Decimal(d) => {
                2u8.hash(state);
                d.to_bits().hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::Binary(b) => {
                4u8.hash(state);
                b.hash(state);
            }
            Value::Empty => 5u8.hash(state),
            Value::LeafList(l) => {
                6u8.hash(state);
                l.hash(state);
            }
        }
    }
}

/// The string form of a value is what keyed-list lookups compare against.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Binary(b) => write!(f, "{}", BASE64.encode(b)),
            Value::Empty => Ok(()),
            Value::LeafList(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

/// LeafType is implemented by every Rust type a generated leaf may hold.
pub trait LeafType: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Name used in conversion errors.
    const NAME: &'static str;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self, ValueError>;

    /// Parses the string form produced by `Value`'s `Display`.
    fn parse_str(s: &str) -> Result<Self, ValueError>;
}

macro_rules! signed_leaf {
    ($($t:ty),*) => {$(
        impl LeafType for $t {
            const NAME: &'static str = stringify!($t);

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn from_value(value: &Value) -> Result<Self, ValueError> {
                value
                    .as_i128()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or_else(|| ValueError::convert(value, Self::NAME))
            }

            fn parse_str(s: &str) -> Result<Self, ValueError> {
                s.parse().map_err(|_| ValueError::parse(s, Self::NAME))
            }
        }
    )*};
}

macro_rules! unsigned_leaf {
    ($($t:ty),*) => {$(
        impl LeafType for $t {
            const NAME: &'static str = stringify!($t);

            fn to_value(&self) -> Value {
                Value::Uint(*self as u64)
            }

            fn from_value(value: &Value) -> Result<Self, ValueError> {
                value
                    .as_i128()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or_else(|| ValueError::convert(value, Self::NAME))
            }

            fn parse_str(s: &str) -> Result<Self, ValueError> {
                s.parse().map_err(|_| ValueError::parse(s, Self::NAME))
            }
        }
    )*};
}

signed_leaf!(i8, i16, i32, i64);
unsigned_leaf!(u8, u16, u32, u64);

impl LeafType for bool {
    const NAME: &'static str = "bool";

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(ValueError::convert(value, Self::NAME)),
        }
    }

    fn parse_str(s: &str) -> Result<Self, ValueError> {
        s.parse().map_err(|_| ValueError::parse(s, Self::NAME))
    }
}

impl LeafType for f64 {
    const NAME: &'static str = "decimal64";

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_f64()
            .ok_or_else(|| ValueError::convert(value, Self::NAME))
    }

    fn parse_str(s: &str) -> Result<Self, ValueError> {
        s.parse().map_err(|_| ValueError::parse(s, Self::NAME))
    }
}

impl LeafType for String {
    const NAME: &'static str = "string";

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ValueError::convert(value, Self::NAME)),
        }
    }

    fn parse_str(s: &str) -> Result<Self, ValueError> {
        Ok(s.to_string())
    }
}

/// Binary is the generated type of a YANG `binary` leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binary(pub Vec<u8>);

impl LeafType for Binary {
    const NAME: &'static str = "binary";

    fn to_value(&self) -> Value {
        Value::Binary(self.0.clone())
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Binary(b) => Ok(Binary(b.clone())),
            _ => Err(ValueError::convert(value, Self::NAME)),
        }
    }

    fn parse_str(s: &str) -> Result<Self, ValueError> {
        BASE64
            .decode(s)
            .map(Binary)
            .map_err(|_| ValueError::parse(s, Self::NAME))
    }
}

/// Empty is the generated type of a YANG `empty` leaf; presence is `Some(Empty)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Empty;

impl LeafType for Empty {
    const NAME: &'static str = "empty";

    fn to_value(&self) -> Value {
        Value::Empty
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Empty => Ok(Empty),
            _ => Err(ValueError::convert(value, Self::NAME)),
        }
    }

    fn parse_str(s: &str) -> Result<Self, ValueError> {
        if s.is_empty() {
            Ok(Empty)
        } else {
            Err(ValueError::parse(s, Self::NAME))
        }
    }
}

/// ListKey is the canonical key of a keyed-list entry: one value per declared
/// key leaf, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListKey(Vec<Value>);

impl ListKey {
    pub fn new(values: Vec<Value>) -> Self {
        ListKey(values)
    }

    pub fn single(value: Value) -> Self {
        ListKey(vec![value])
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// ListKeyType is implemented by the map key types of generated keyed lists:
/// scalar leaf types for single-key lists, tuples for compound keys.
pub trait ListKeyType: Ord + Clone + fmt::Debug + Send + Sync + 'static {
    fn to_key(&self) -> ListKey;

    fn from_key(key: &ListKey) -> Result<Self, ValueError>;

    /// Builds a key from per-component string forms, in key order.
    fn parse_key(parts: &[&str]) -> Result<Self, ValueError>;
}

fn check_arity(expected: usize, actual: usize) -> Result<(), ValueError> {
    if expected != actual {
        return Err(ValueError::KeyArity { expected, actual });
    }
    Ok(())
}

macro_rules! single_key {
    ($($t:ty),*) => {$(
        impl ListKeyType for $t {
            fn to_key(&self) -> ListKey {
                ListKey::single(self.to_value())
            }

            fn from_key(key: &ListKey) -> Result<Self, ValueError> {
                check_arity(1, key.len())?;
                <$t as LeafType>::from_value(&key.values()[0])
            }

            fn parse_key(parts: &[&str]) -> Result<Self, ValueError> {
                check_arity(1, parts.len())?;
                <$t as LeafType>::parse_str(parts[0])
            }
        }
    )*};
}

single_key!(String, bool, i8, i16, i32, i64, u8, u16, u32, u64, Binary);

impl<A, B> ListKeyType for (A, B)
where
    A: LeafType + Ord,
    B: LeafType + Ord,
{
    fn to_key(&self) -> ListKey {
        ListKey::new(vec![self.0.to_value(), self.1.to_value()])
    }

    fn from_key(key: &ListKey) -> Result<Self, ValueError> {
        check_arity(2, key.len())?;
        let v = key.values();
        Ok((A::from_value(&v[0])?, B::from_value(&v[1])?))
    }

    fn parse_key(parts: &[&str]) -> Result<Self, ValueError> {
        check_arity(2, parts.len())?;
        Ok((A::parse_str(parts[0])?, B::parse_str(parts[1])?))
    }
}

impl<A, B, C> ListKeyType for (A, B, C)
where
    A: LeafType + Ord,
    B: LeafType + Ord,
    C: LeafType + Ord,
{
    fn to_key(&self) -> ListKey {
        ListKey::new(vec![
            self.0.to_value(),
            self.1.to_value(),
            self.2.to_value(),
        ])
    }

    fn from_key(key: &ListKey) -> Result<Self, ValueError> {
        check_arity(3, key.len())?;
        let v = key.values();
        Ok((
            A::from_value(&v[0])?,
            B::from_value(&v[1])?,
            C::from_value(&v[2])?,
        ))
    }

    fn parse_key(parts: &[&str]) -> Result<Self, ValueError> {
        check_arity(3, parts.len())?;
        Ok((
            A::parse_str(parts[0])?,
            B::parse_str(parts[1])?,
            C::parse_str(parts[2])?,
        ))
    }
}
