// Layout registry
//
// A layout describes where one entity type lives in a WEBPRO workbook:
// the sheet name, the first data row, and which column maps to which field.
// Layouts are plain configuration: built-in tables live in `layout::webpro`,
// custom ones can be loaded from JSON. Nothing mutates a registry once built.

pub mod webpro;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::cell::CellValue;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate entity type: {0}")]
    DuplicateEntity(String),

    #[error("Invalid layout '{entity}': {msg}")]
    Invalid { entity: String, msg: String },
}

/// Conversion applied to a cell when it is copied into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    #[default]
    Raw,
    /// Float-then-int, raw value kept when not numeric
    Int,
    /// `■` → 1, anything else → 0
    Flag,
    /// "2番目" → 2, unparseable → null
    Priority,
    /// Blank → null
    NullIfBlank,
    /// Blank → empty string
    EmptyIfBlank,
}

impl Coercion {
    pub fn apply(self, value: &CellValue) -> CellValue {
        match self {
            Coercion::Raw => value.clone(),
            Coercion::Int => value.clone().coerce_int(),
            Coercion::Flag => value.marker_flag(),
            Coercion::Priority => value.parse_priority(),
            Coercion::NullIfBlank => value.clone().blank_to_null(),
            Coercion::EmptyIfBlank => value.clone().blank_to_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub index: usize,
    pub field: String,
    #[serde(default)]
    pub coercion: Coercion,
}

impl ColumnSpec {
    pub fn new(index: usize, field: impl Into<String>) -> Self {
        Self {
            index,
            field: field.into(),
            coercion: Coercion::Raw,
        }
    }

    pub fn coerced(index: usize, field: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            index,
            field: field.into(),
            coercion,
        }
    }
}

/// Synthetic identifier stamped onto each record of a flat layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdSpec {
    /// `{file_id}_{prefix}{n:03}` numbered over emitted records
    Sequence { field: String, prefix: String },
    /// `{file_id}_{value}` taken verbatim from a mapped column
    FromColumn { field: String, column: usize },
}

impl IdSpec {
    pub fn field(&self) -> &str {
        match self {
            IdSpec::Sequence { field, .. } | IdSpec::FromColumn { field, .. } => field,
        }
    }
}

/// Header + units row fusion for whole-sheet consolidation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderFusion {
    pub header_row: usize,
    #[serde(default)]
    pub unit_row: Option<usize>,
    /// Number of leading columns taken from the sheet
    pub width: usize,
}

/// Structural rows (e.g. 室内側 / 室外側 boundary labels) to skip in grouped sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipMarker {
    pub column: usize,
    pub values: Vec<String>,
}

impl SkipMarker {
    pub fn matches(&self, row: &[CellValue]) -> bool {
        row.get(self.column)
            .and_then(CellValue::as_str)
            .map(|s| self.values.iter().any(|v| v == s.trim()))
            .unwrap_or(false)
    }
}

/// Parent/child split of a sheet
///
/// A row starts a new parent when every `parent_markers` column is present;
/// it is a child row when any `child_markers` column is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub parent_entity: String,
    pub child_entity: String,
    pub parent_markers: Vec<usize>,
    pub child_markers: Vec<usize>,
    #[serde(default)]
    pub skip_markers: Vec<SkipMarker>,
    /// Fields whose values, joined by `_`, form the parent id suffix
    pub parent_name_fields: Vec<String>,
    pub parent_id_field: String,
    pub child_id_field: String,
    #[serde(default)]
    pub child_order_field: Option<String>,
    pub parent_fields: Vec<String>,
    pub child_fields: Vec<String>,
    /// Parent fields copied onto every child record
    #[serde(default)]
    pub parent_context: Vec<String>,
    /// The parent-introducing row also counts as the group's first child
    #[serde(default)]
    pub parent_row_is_child: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub entity_type: String,
    pub sheet_name: String,
    /// 0-based absolute sheet row of the first data row
    pub data_start_row: usize,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// Columns of which at least one must be present; empty means any mapped column
    #[serde(default)]
    pub required_any: Vec<usize>,
    #[serde(default)]
    pub id: Option<IdSpec>,
    #[serde(default)]
    pub header_fusion: Option<HeaderFusion>,
    #[serde(default)]
    pub grouping: Option<GroupSpec>,
}

impl LayoutSpec {
    pub fn flat(
        entity_type: impl Into<String>,
        sheet_name: impl Into<String>,
        data_start_row: usize,
        columns: Vec<ColumnSpec>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            sheet_name: sheet_name.into(),
            data_start_row,
            columns,
            required_any: Vec::new(),
            id: None,
            header_fusion: None,
            grouping: None,
        }
    }

    pub fn with_required(mut self, required_any: &[usize]) -> Self {
        self.required_any = required_any.to_vec();
        self
    }

    pub fn with_id(mut self, id: IdSpec) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_header_fusion(mut self, fusion: HeaderFusion) -> Self {
        self.header_fusion = Some(fusion);
        self
    }

    pub fn with_grouping(mut self, grouping: GroupSpec) -> Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn column_by_field(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Entity types this layout feeds, in output order
    pub fn output_entities(&self) -> Vec<&str> {
        match &self.grouping {
            Some(group) => vec![group.parent_entity.as_str(), group.child_entity.as_str()],
            None => vec![self.entity_type.as_str()],
        }
    }

    fn invalid(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Invalid {
            entity: self.entity_type.clone(),
            msg: msg.into(),
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.entity_type.trim().is_empty() {
            return Err(self.invalid("entity type is empty"));
        }
        if self.sheet_name.is_empty() {
            return Err(self.invalid("sheet name is empty"));
        }
        if self.columns.is_empty() && self.header_fusion.is_none() {
            return Err(self.invalid("no columns mapped"));
        }
        if let Some(fusion) = &self.header_fusion {
            if fusion.width == 0 {
                return Err(self.invalid("header fusion width is zero"));
            }
            if fusion.header_row >= self.data_start_row {
                return Err(self.invalid("header row must precede data rows"));
            }
        }

        let mapped: HashSet<usize> = self.columns.iter().map(|c| c.index).collect();
        if mapped.len() != self.columns.len() {
            return Err(self.invalid("column index mapped twice"));
        }
        if let Some(col) = self.required_any.iter().find(|c| !mapped.contains(c)) {
            return Err(self.invalid(format!("required column {col} is not mapped")));
        }
        if let Some(IdSpec::FromColumn { column, .. }) = &self.id {
            if !mapped.contains(column) {
                return Err(self.invalid(format!("id column {column} is not mapped")));
            }
        }

        if let Some(group) = &self.grouping {
            if group.parent_markers.is_empty() || group.child_markers.is_empty() {
                return Err(self.invalid("grouping needs parent and child markers"));
            }
            if group.parent_name_fields.is_empty() {
                return Err(self.invalid("grouping needs at least one parent name field"));
            }
            for col in group.parent_markers.iter().chain(&group.child_markers) {
                if !mapped.contains(col) {
                    return Err(self.invalid(format!("marker column {col} is not mapped")));
                }
            }
            let fields: HashSet<&str> = self.columns.iter().map(|c| c.field.as_str()).collect();
            let referenced = group
                .parent_fields
                .iter()
                .chain(&group.child_fields)
                .chain(&group.parent_name_fields);
            for field in referenced {
                if !fields.contains(field.as_str()) {
                    return Err(self.invalid(format!("field '{field}' is not mapped")));
                }
            }
            if let Some(field) = group
                .parent_context
                .iter()
                .find(|f| !group.parent_fields.contains(f))
            {
                return Err(self.invalid(format!("context field '{field}' is not a parent field")));
            }
        }
        Ok(())
    }
}

/// Where the vertical basic-information form lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfoSpec {
    pub sheet_name: String,
    /// Table receiving one row per building; `None` extracts the context only
    #[serde(default)]
    pub entity_type: Option<String>,
}

/// Immutable, ordered catalog of layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    #[serde(default)]
    pub basic_info: Option<BasicInfoSpec>,
    pub layouts: Vec<LayoutSpec>,
}

impl LayoutRegistry {
    pub fn new(
        basic_info: Option<BasicInfoSpec>,
        layouts: Vec<LayoutSpec>,
    ) -> Result<Self, LayoutError> {
        let registry = Self { basic_info, layouts };
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let registry: LayoutRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for entity in self.entity_types() {
            if !seen.insert(entity) {
                return Err(LayoutError::DuplicateEntity(entity.to_string()));
            }
        }
        for layout in &self.layouts {
            layout.validate()?;
        }
        Ok(())
    }

    /// Every output entity type in registry order, buildings first
    pub fn entity_types(&self) -> Vec<&str> {
        let mut entities = Vec::new();
        if let Some(entity) = self
            .basic_info
            .as_ref()
            .and_then(|info| info.entity_type.as_deref())
        {
            entities.push(entity);
        }
        for layout in &self.layouts {
            entities.extend(layout.output_entities());
        }
        entities
    }

    /// Field names of all layouts in registry order, without duplicates
    pub fn all_fields(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.layouts
            .iter()
            .flat_map(|layout| layout.columns.iter())
            .filter(|column| seen.insert(column.field.as_str()))
            .map(|column| column.field.clone())
            .collect()
    }

    pub fn get(&self, entity_type: &str) -> Option<&LayoutSpec> {
        self.layouts.iter().find(|l| l.entity_type == entity_type)
    }
}
