use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::enums::{ReviewStatus, TypeTag};

/// One document tracked by the review registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub name: String,
    pub type_tag: TypeTag,
    pub status: ReviewStatus,
    #[serde(default)]
    pub fields: Fields,
    pub ingested_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// A fresh `pending` record with a new v4 id and no cells.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            type_tag,
            status: ReviewStatus::Pending,
            fields: Fields::default(),
            ingested_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }
}

/// Ordered column → cell mapping.
///
/// Serializes as a JSON object whose key order is the insertion order, which
/// is what the export endpoint relies on to lay out spreadsheet columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    /// One empty cell per column.
    pub fn blank(columns: &[String]) -> Self {
        Self(columns.iter().map(|c| (c.clone(), String::new())).collect())
    }

    /// Set a cell, keeping its position if the column already exists.
    /// Returns the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == column) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the keys equal `columns` in both content and order.
    pub fn matches_columns(&self, columns: &[String]) -> bool {
        self.0.len() == columns.len() && self.keys().zip(columns).all(|(k, c)| k == c)
    }

    pub fn key_list(&self) -> Vec<String> {
        self.keys().map(str::to_string).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::default();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to string cells")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Fields, A::Error> {
                let mut fields = Fields::default();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    fields.insert(k, v);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// Partial update merged into a record by `Registry::update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub type_tag: Option<TypeTag>,
    pub status: Option<ReviewStatus>,
    pub fields: Option<Fields>,
}

impl DocumentPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn type_tag(mut self, type_tag: TypeTag) -> Self {
        self.type_tag = Some(type_tag);
        self
    }

    pub fn status(mut self, status: ReviewStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub(crate) fn apply(self, record: &mut DocumentRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(type_tag) = self.type_tag {
            record.type_tag = type_tag;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(fields) = self.fields {
            record.fields = fields;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_record_is_pending_without_cells() {
        let record = DocumentRecord::new("factura.pdf", TypeTag::Invoice);
        assert_eq!(record.status, ReviewStatus::Pending);
        assert!(record.fields.is_empty());
        assert_ne!(record.id, Uuid::nil());
    }

    #[test]
    fn insert_keeps_column_position() {
        let mut fields: Fields = [("Data", "01.03.2024"), ("Suma", "120")].into_iter().collect();
        assert_eq!(fields.insert("Data", "02.03.2024"), Some("01.03.2024".into()));
        assert_eq!(fields.key_list(), columns(&["Data", "Suma"]));
        assert_eq!(fields.get("Data"), Some("02.03.2024"));
    }

    #[test]
    fn matches_columns_is_order_sensitive() {
        let fields: Fields = [("A", "1"), ("B", "2")].into_iter().collect();
        assert!(fields.matches_columns(&columns(&["A", "B"])));
        assert!(!fields.matches_columns(&columns(&["B", "A"])));
        assert!(!fields.matches_columns(&columns(&["A"])));
    }

    #[test]
    fn blank_has_empty_cell_per_column() {
        let fields = Fields::blank(&columns(&["Column 1", "Column 2"]));
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn fields_serialize_in_column_order() {
        let fields: Fields = [("Zeta", "z"), ("Alpha", "a")].into_iter().collect();
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"Zeta":"z","Alpha":"a"}"#);

        let back: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key_list(), columns(&["Zeta", "Alpha"]));
    }

    #[test]
    fn patch_only_touches_given_parts() {
        let mut record = DocumentRecord::new("old.pdf", TypeTag::Unknown)
            .with_status(ReviewStatus::Validated);
        DocumentPatch::default()
            .name("new.pdf")
            .apply(&mut record);
        assert_eq!(record.name, "new.pdf");
        assert_eq!(record.type_tag, TypeTag::Unknown);
        assert_eq!(record.status, ReviewStatus::Validated);
    }
}
