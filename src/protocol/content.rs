use std::fmt;

use bytes::BufMut;
use indexmap::IndexMap;

use crate::core::{Error, FieldValue, Result};

/// Ordered mapping from field name to value
///
/// Field order is wire order. A table built for a header is *fixed*: its key
/// set cannot grow after construction, only existing values may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTable {
    fields: IndexMap<String, FieldValue>,
    fixed: bool,
}

/// Anything that can be laid out as a sequence of wire bytes through a field
/// table
pub trait ByteContainer {
    /// The underlying field table
    fn fields(&self) -> &FieldTable;

    /// Wire bytes of every field in order
    fn to_bytes(&self) -> Vec<u8> {
        self.fields().to_bytes()
    }

    /// Looks up a field by name
    fn get_parameter(&self, name: &str) -> Option<&FieldValue> {
        self.fields().get(name)
    }
}

impl FieldTable {
    /// Creates an empty, growable table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from ordered `(name, value)` pairs
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut table = Self::new();
        for (name, value) in fields {
            table.insert(name, value)?;
        }
        Ok(table)
    }

    /// Locks the key set
    pub fn into_fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Whether the key set is locked
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Appends a new field
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        let name = name.into();
        if self.fixed {
            return Err(Error::parameter_not_found(format!(
                "'{}' is not a declared field and the field set is fixed",
                name
            )));
        }
        if self.fields.contains_key(&name) {
            return Err(Error::duplicate_parameter(name));
        }
        self.fields.insert(name, value.into());
        Ok(())
    }

    /// Overwrites the value of an existing field
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(Error::parameter_not_found(name)),
        }
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether a field named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the table has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates field names in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of wire bytes the table serializes to
    pub fn encoded_len(&self) -> usize {
        self.fields.values().map(FieldValue::encoded_len).sum()
    }

    /// Appends the wire bytes of every field to `dst`
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        for value in self.fields.values() {
            value.encode(dst);
        }
    }

    /// Wire bytes of every field
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf
    }

    /// Values as one comma-separated line, in declaration order
    pub fn to_csv(&self) -> String {
        self.fields
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ByteContainer for FieldTable {
    fn fields(&self) -> &FieldTable {
        self
    }
}

impl fmt::Display for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Packet contents:")?;
        for (name, value) in &self.fields {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FieldTable {
        FieldTable::from_fields([("size", 10u8), ("type", 137), ("test_value", 123)]).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "Packet contents:\nsize: 10\ntype: 137\ntest_value: 123\n"
        );
    }

    #[test]
    fn test_order_preserved() {
        let table = sample();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["size", "type", "test_value"]);
        assert_eq!(table.to_bytes(), vec![10, 137, 123]);
        assert_eq!(table.to_csv(), "10,137,123");
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = FieldTable::from_fields([("a", 1u8), ("a", 2)]);
        assert!(matches!(result, Err(Error::DuplicateParameter(_))));
    }

    #[test]
    fn test_fixed_table() {
        let mut table = sample().into_fixed();
        table.set("type", 1u8).unwrap();
        assert_eq!(table.get("type"), Some(&FieldValue::Byte(1)));

        assert!(matches!(table.insert("extra", 1u8), Err(Error::ParameterNotFound(_))));
        assert!(matches!(table.set("extra", 1u8), Err(Error::ParameterNotFound(_))));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_text_fields_expand() {
        let table = FieldTable::from_fields([
            ("id", FieldValue::Byte(1)),
            ("name", FieldValue::from("AB")),
        ])
        .unwrap();
        assert_eq!(table.encoded_len(), 3);
        assert_eq!(table.to_bytes(), vec![1, b'A', b'B']);
    }
}
