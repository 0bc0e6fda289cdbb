//! Named field values handed from the statistics code to the sinks.
//!
//! Every group of results (general, ping drop, run length, status, bulk) is
//! exposed as a [`FieldSet`]: an insertion-ordered list of `(name, value)`
//! pairs. Downstream consumers key on the names and the CSV sink relies on
//! the order, so both are part of the output contract.

use std::fmt;

/// A single output value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UInt(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// No value for this sample (e.g. latency during a full ping drop).
    Absent,
    /// A fixed- or variable-length sequence, flattened by the sinks.
    Seq(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    /// Scalar rendering used in CSV cells. Sequences join with commas.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Absent => Ok(()),
            Self::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

/// Insertion-ordered set of named values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a value, replacing an existing one of the same name in place.
    pub fn insert(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append all fields of `other`, replacing duplicates.
    pub fn extend(&mut self, other: FieldSet) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_and_replaces() {
        let mut set = FieldSet::new().with("b", 2u64).with("a", 1u64);
        set.insert("b", 3u64);
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(set.get("b"), Some(&FieldValue::UInt(3)));
    }

    #[test]
    fn test_option_maps_to_absent() {
        let none: Option<f64> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Absent);
        assert_eq!(FieldValue::from(Some(1.5)), FieldValue::Float(1.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::from(7u64).to_string(), "7");
        assert_eq!(FieldValue::from(0.25).to_string(), "0.25");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::Absent.to_string(), "");
        assert_eq!(FieldValue::from(vec![1u64, 2, 3]).to_string(), "1,2,3");
    }

    #[test]
    fn test_extend_merges() {
        let mut a = FieldSet::new().with("x", 1u64);
        a.extend(FieldSet::new().with("y", 2u64).with("x", 5u64));
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("x").and_then(FieldValue::as_u64), Some(5));
    }
}
