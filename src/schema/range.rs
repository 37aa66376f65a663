//! YANG range and length expressions.

use std::fmt;

/// Bound is one end of a range part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Min,
    Max,
    Int(i128),
    Float(f64),
}

impl Bound {
    fn parse(s: &str) -> Result<Bound, String> {
        match s {
            "min" => Ok(Bound::Min),
            "max" => Ok(Bound::Max),
            _ => {
                if let Ok(i) = s.parse::<i128>() {
                    Ok(Bound::Int(i))
                } else {
                    s.parse::<f64>()
                        .map(Bound::Float)
                        .map_err(|_| format!("invalid range bound {:?}", s))
                }
            }
        }
    }

    fn as_f64(self) -> Option<f64> {
        match self {
            Bound::Int(i) => Some(i as f64),
            Bound::Float(f) => Some(f),
            Bound::Min | Bound::Max => None,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min => write!(f, "min"),
            Bound::Max => write!(f, "max"),
            Bound::Int(i) => write!(f, "{}", i),
            Bound::Float(v) => write!(f, "{}", v),
        }
    }
}

/// RangeSet is a parsed `lo..hi | lo..hi | value` expression. A value is in
/// the set if any part contains it; `min` and `max` are open ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSet {
    parts: Vec<(Bound, Bound)>,
}

impl RangeSet {
    pub fn parse(expr: &str) -> Result<RangeSet, String> {
        let mut parts = Vec::new();
        for part in expr.split('|') {
            let part = part.trim();
            if part.is_empty() {
                return Err(format!("empty range part in {:?}", expr));
            }
            let (lo, hi) = match part.split_once("..") {
                Some((lo, hi)) => (Bound::parse(lo.trim())?, Bound::parse(hi.trim())?),
                None => {
                    let b = Bound::parse(part)?;
                    (b, b)
                }
            };
            parts.push((lo, hi));
        }
        Ok(RangeSet { parts })
    }

    pub fn contains_int(&self, v: i128) -> bool {
        self.parts.iter().any(|&(lo, hi)| {
            let above = match lo {
                Bound::Min => true,
                Bound::Max => false,
                Bound::Int(l) => v >= l,
                Bound::Float(l) => v as f64 >= l,
            };
            let below = match hi {
                Bound::Max => true,
                Bound::Min => false,
                Bound::Int(h) => v <= h,
                Bound::Float(h) => v as f64 <= h,
            };
            above && below
        })
    }

    pub fn contains_float(&self, v: f64) -> bool {
        self.parts.iter().any(|&(lo, hi)| {
            let above = lo.as_f64().map_or(lo == Bound::Min, |l| v >= l);
            let below = hi.as_f64().map_or(hi == Bound::Max, |h| v <= h);
            above && below
        })
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (lo, hi)) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            if lo == hi {
                write!(f, "{}", lo)?;
            } else {
                write!(f, "{}..{}", lo, hi)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_contains() {
        let r = RangeSet::parse("1..10 | 20..max").unwrap();
        assert!(r.contains_int(1));
        assert!(r.contains_int(10));
        assert!(!r.contains_int(11));
        assert!(r.contains_int(20));
        assert!(r.contains_int(i64::MAX as i128));
        assert!(!r.contains_int(0));
        assert_eq!(r.to_string(), "1..10 | 20..max");
    }

    #[test]
    fn test_single_values_and_decimals() {
        let r = RangeSet::parse("min..-1 | 0 | 2.5..3.5").unwrap();
        assert!(r.contains_int(-100));
        assert!(r.contains_int(0));
        assert!(!r.contains_int(1));
        assert!(r.contains_float(3.0));
        assert!(!r.contains_float(1.5));
    }

    #[test]
    fn test_parse_errors() {
        assert!(RangeSet::parse("1..x").is_err());
        assert!(RangeSet::parse("1.. | ").is_err());
    }
}
