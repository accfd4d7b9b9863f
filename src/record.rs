/// Flat records and the per-entity tables they accumulate into
use std::collections::HashMap;

use crate::cell::CellValue;

/// Ordered field → value mapping produced from one sheet row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing the value in place if the field already exists
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Insert fields ahead of the existing ones, keeping their given order
    pub fn prepend(&mut self, leading: Vec<(String, CellValue)>) {
        let mut fields = Vec::with_capacity(leading.len() + self.fields.len());
        for (name, value) in leading {
            self.fields.retain(|(existing, _)| *existing != name);
            fields.push((name, value));
        }
        fields.append(&mut self.fields);
        self.fields = fields;
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Text form of a field, empty when missing or null
    pub fn get_str(&self, field: &str) -> String {
        self.get(field).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.set(field, value);
        }
        record
    }
}

/// All records of one entity type, with the union of their columns
///
/// Column order is first-seen order unless a fixed column list was given
/// up front; records missing a column read as null for it.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub entity_type: String,
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn with_columns(entity_type: impl Into<String>, columns: &[String]) -> Self {
        let mut table = Self::new(entity_type);
        for column in columns {
            table.add_column(column);
        }
        table
    }

    fn add_column(&mut self, column: &str) {
        if !self.column_index.contains_key(column) {
            self.column_index
                .insert(column.to_string(), self.columns.len());
            self.columns.push(column.to_string());
        }
    }

    pub fn push(&mut self, record: Record) {
        for name in record.field_names() {
            self.add_column(name);
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one record laid out in table column order
    pub fn row_values<'a>(&'a self, record: &'a Record) -> Vec<&'a CellValue> {
        static NULL: CellValue = CellValue::Null;
        self.columns
            .iter()
            .map(|column| record.get(column).unwrap_or(&NULL))
            .collect()
    }
}
