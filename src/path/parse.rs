//! Parsing of the textual path form `/a/b[k=v][k2=v2]/c`.

use super::path::{Path, PathElem};
use thiserror::Error;

/// PathError reports a malformed textual path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty element at position {position} in {input:?}")]
    EmptyElement { input: String, position: usize },

    #[error("unterminated key in {input:?}")]
    UnterminatedKey { input: String },

    #[error("malformed key {key:?} in {input:?}, expected name=value")]
    MalformedKey { input: String, key: String },

    #[error("unexpected character {found:?} after key in {input:?}")]
    TrailingCharacters { input: String, found: char },
}

impl Path {
    /// Parses a textual path. A leading `/` is optional; key values may escape
    /// `]` and `\` with a backslash.
    pub fn parse(input: &str) -> Result<Path, PathError> {
        let mut elems = Vec::new();
        let trimmed = input.strip_prefix('/').unwrap_or(input);
        if trimmed.is_empty() {
            return Ok(Path::new());
        }

        let mut chars = trimmed.chars().peekable();
        loop {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(PathError::EmptyElement {
                    input: input.to_string(),
                    position: elems.len(),
                });
            }

            let mut elem = PathElem::new(name);
            while chars.peek() == Some(&'[') {
                chars.next();
                let raw = read_key(&mut chars).ok_or_else(|| PathError::UnterminatedKey {
                    input: input.to_string(),
                })?;
                let (k, v) = raw.split_once('=').ok_or_else(|| PathError::MalformedKey {
                    input: input.to_string(),
                    key: raw.clone(),
                })?;
                if k.is_empty() {
                    return Err(PathError::MalformedKey {
                        input: input.to_string(),
                        key: raw.clone(),
                    });
                }
                elem.key.insert(k.to_string(), v.to_string());
            }
            elems.push(elem);

            match chars.next() {
                None => break,
                Some('/') => continue,
                Some(c) => {
                    return Err(PathError::TrailingCharacters {
                        input: input.to_string(),
                        found: c,
                    })
                }
            }
        }

        Ok(Path::from_elems(elems))
    }
}

/// Reads up to the closing `]`, unescaping `\]` and `\\`.
fn read_key(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            ']' => return Some(out),
            _ => out.push(c),
        }
    }
    None
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keyed_path() {
        let path = Path::parse("/interfaces/interface[name=eth0]/config/mtu").unwrap();
        assert_eq!(
            path,
            Path::from_elems(vec![
                PathElem::new("interfaces"),
                PathElem::new("interface").with_key("name", "eth0"),
                PathElem::new("config"),
                PathElem::new("mtu"),
            ])
        );
    }

    #[test]
    fn test_parse_compound_key_and_escapes() {
        let path = Path::parse("list[key1=forty-two][key2=42][key3=a\\]b]/outer").unwrap();
        let list = &path.elems()[0];
        assert_eq!(list.key.len(), 3);
        assert_eq!(list.key["key3"], "a]b");
        assert_eq!(path.elems()[1].name, "outer");
    }

    #[test]
    fn test_display_round_trips() {
        let text = "/a/b[k=x\\]y]/c";
        assert_eq!(Path::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Path::parse("/a//b"),
            Err(PathError::EmptyElement { position: 1, .. })
        ));
        assert!(matches!(
            Path::parse("/a[k=v"),
            Err(PathError::UnterminatedKey { .. })
        ));
        assert!(matches!(
            Path::parse("/a[kv]"),
            Err(PathError::MalformedKey { .. })
        ));
        assert!(matches!(
            Path::parse("/a[k=v]x"),
            Err(PathError::TrailingCharacters { found: 'x', .. })
        ));
        assert_eq!(Path::parse("/").unwrap(), Path::new());
    }
}
