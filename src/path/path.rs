//! Structured path types.

use std::collections::BTreeMap;
use std::fmt;

/// PathElem is one step of a structured path: a schema node name and, when
/// the step selects an entry of a keyed list, the key values by key name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathElem {
    pub name: String,
    pub key: BTreeMap<String, String>,
}

impl PathElem {
    /// Creates a step with no key.
    pub fn new(name: impl Into<String>) -> Self {
        PathElem {
            name: name.into(),
            key: BTreeMap::new(),
        }
    }

    /// Adds a key value to the step.
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.key.insert(name.into(), value.into());
        self
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Returns the name with any `module:` prefix removed.
    pub fn local_name(&self) -> &str {
        strip_module_prefix(&self.name)
    }
}

/// Path is an ordered sequence of steps, optionally qualified by an origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    origin: Option<String>,
    elems: Vec<PathElem>,
}

impl Path {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Path {
            origin: None,
            elems: Vec::new(),
        }
    }

    /// Creates a path from a vector of steps.
    pub fn from_elems(elems: Vec<PathElem>) -> Self {
        Path { origin: None, elems }
    }

    /// Creates a path of unkeyed steps from names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(PathElem::new).collect()
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElem> {
        self.elems.iter()
    }

    pub fn push(&mut self, elem: PathElem) {
        self.elems.push(elem);
    }

    pub fn pop(&mut self) -> Option<PathElem> {
        self.elems.pop()
    }

    pub fn last(&self) -> Option<&PathElem> {
        self.elems.last()
    }

    /// Creates a new path with the given step appended.
    pub fn with(&self, elem: PathElem) -> Self {
        let mut new_path = self.clone();
        new_path.push(elem);
        new_path
    }

    /// Creates a new path with the given steps appended.
    pub fn join(&self, elems: &[PathElem]) -> Self {
        let mut new_path = self.clone();
        new_path.elems.extend_from_slice(elems);
        new_path
    }

    /// Returns the steps to match against schema metadata: a leading step with
    /// an empty name marks an absolute path and is dropped.
    pub fn relative_elems(&self) -> &[PathElem] {
        match self.elems.first() {
            Some(first) if first.name.is_empty() => &self.elems[1..],
            _ => &self.elems,
        }
    }
}

impl FromIterator<PathElem> for Path {
    fn from_iter<T: IntoIterator<Item = PathElem>>(iter: T) -> Self {
        Path {
            origin: None,
            elems: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElem;
    type IntoIter = std::slice::Iter<'a, PathElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter()
    }
}

/// Strips a `module:` qualifier from a schema node name.
pub fn strip_module_prefix(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Reports whether the steps begin with the given schema path segments,
/// comparing names with module qualifiers removed.
pub fn matches_prefix(elems: &[PathElem], prefix: &[&str]) -> bool {
    elems.len() >= prefix.len()
        && elems
            .iter()
            .zip(prefix)
            .all(|(e, p)| e.local_name() == strip_module_prefix(p))
}

fn escape_key_value(v: &str) -> String {
    v.replace('\\', "\\\\").replace(']', "\\]")
}

impl fmt::Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in &self.key {
            write!(f, "[{}={}]", k, escape_key_value(v))?;
        }
        Ok(())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = &self.origin {
            write!(f, "{}:", origin)?;
        }
        let elems = self.relative_elems();
        if elems.is_empty() {
            return write!(f, "/");
        }
        for elem in elems {
            write!(f, "/{}", elem)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_operations() {
        let mut path = Path::new();
        assert!(path.is_empty());

        path.push(PathElem::new("interfaces"));
        path.push(PathElem::new("interface").with_key("name", "eth0"));
        assert_eq!(path.len(), 2);
        assert!(path.last().unwrap().has_key());

        let popped = path.pop().unwrap();
        assert_eq!(popped.key.get("name").map(String::as_str), Some("eth0"));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_path_display() {
        let path = Path::from_elems(vec![
            PathElem::new("interfaces"),
            PathElem::new("interface").with_key("name", "eth[0]"),
            PathElem::new("mtu"),
        ]);
        assert_eq!(path.to_string(), "/interfaces/interface[name=eth[0\\]]/mtu");
        assert_eq!(Path::new().to_string(), "/");
        assert_eq!(
            Path::from_names(["a"]).with_origin("openconfig").to_string(),
            "openconfig:/a"
        );
    }

    #[test]
    fn test_absolute_marker_dropped() {
        let path = Path::from_names(["", "system", "config"]);
        assert_eq!(path.relative_elems().len(), 2);
        assert_eq!(path.relative_elems()[0].name, "system");
    }

    #[test]
    fn test_matches_prefix_ignores_modules() {
        let path = Path::from_names(["oc-if:interfaces", "interface"]);
        assert!(matches_prefix(path.elems(), &["interfaces"]));
        assert!(matches_prefix(path.elems(), &["interfaces", "oc-if:interface"]));
        assert!(!matches_prefix(path.elems(), &["interfaces", "interface", "config"]));
        assert!(!matches_prefix(path.elems(), &["system"]));
    }
}
