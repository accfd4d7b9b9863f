// Parent/child grouping of a sheet
//
// One forward pass over the data rows. A row whose parent markers are all
// present opens a new parent; following rows with a child marker become its
// children until the next parent row. The pass is a fold over rows with the
// open parent carried in `AssemblyState`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cell::CellValue;
use crate::extract::{build_record, row_has_data};
use crate::layout::{ColumnSpec, GroupSpec, LayoutSpec};
use crate::record::Record;
use crate::sheet::SheetGrid;

/// Rows that fit no pattern of the grouped layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Child-shaped rows seen before any parent row
    pub orphan_children: usize,
    /// Non-blank rows that are neither parent, child nor structural
    pub unmatched_rows: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.orphan_children + self.unmatched_rows
    }

    pub fn add(&mut self, other: DropCounts) {
        self.orphan_children += other.orphan_children;
        self.unmatched_rows += other.unmatched_rows;
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupedRecords {
    pub parents: Vec<Record>,
    pub children: Vec<Record>,
    pub dropped: DropCounts,
}

#[derive(Debug)]
struct OpenParent {
    id: String,
    record: Record,
    child_count: usize,
}

#[derive(Debug, Default)]
struct AssemblyState {
    current: Option<OpenParent>,
    out: GroupedRecords,
}

/// Row classification, in precedence order
enum RowKind {
    Parent,
    Structural,
    Child,
    Unmatched,
}

/// Column lookups resolved once per sheet
struct Plan<'a> {
    group: &'a GroupSpec,
    file_id: &'a str,
    parent_columns: Vec<&'a ColumnSpec>,
    child_columns: Vec<&'a ColumnSpec>,
}

impl<'a> Plan<'a> {
    fn new(spec: &'a LayoutSpec, group: &'a GroupSpec, file_id: &'a str) -> Self {
        let lookup = |fields: &'a [String]| -> Vec<&'a ColumnSpec> {
            fields
                .iter()
                .filter_map(|field| spec.column_by_field(field))
                .collect()
        };
        Self {
            group,
            file_id,
            parent_columns: lookup(group.parent_fields.as_slice()),
            child_columns: lookup(group.child_fields.as_slice()),
        }
    }

    fn classify(&self, row: &[CellValue]) -> RowKind {
        let present = |idx: &usize| row.get(*idx).is_some_and(CellValue::is_present);
        if self.group.parent_markers.iter().all(present) {
            RowKind::Parent
        } else if self.group.skip_markers.iter().any(|m| m.matches(row)) {
            RowKind::Structural
        } else if self.group.child_markers.iter().any(present) {
            RowKind::Child
        } else {
            RowKind::Unmatched
        }
    }

    fn has_child_marker(&self, row: &[CellValue]) -> bool {
        self.group
            .child_markers
            .iter()
            .any(|idx| row.get(*idx).is_some_and(CellValue::is_present))
    }

    fn open_parent(&self, row: &[CellValue]) -> OpenParent {
        let mut record = build_record(row, self.parent_columns.iter().copied());
        let name = self
            .group
            .parent_name_fields
            .iter()
            .map(|field| record.get_str(field))
            .collect::<Vec<_>>()
            .join("_");
        let id = format!("{}_{}", self.file_id, name);
        record.prepend(vec![(
            self.group.parent_id_field.clone(),
            CellValue::Text(id.clone()),
        )]);
        OpenParent {
            id,
            record,
            child_count: 0,
        }
    }

    fn child(&self, parent: &mut OpenParent, row: &[CellValue]) -> Record {
        parent.child_count += 1;

        let mut leading = vec![
            (
                self.group.child_id_field.clone(),
                CellValue::Text(format!("{}_U{:02}", parent.id, parent.child_count)),
            ),
            (
                self.group.parent_id_field.clone(),
                CellValue::Text(parent.id.clone()),
            ),
        ];
        if let Some(order_field) = &self.group.child_order_field {
            leading.push((order_field.clone(), CellValue::Int(parent.child_count as i64)));
        }
        for field in &self.group.parent_context {
            let value = parent.record.get(field).cloned().unwrap_or_default();
            leading.push((field.clone(), value));
        }

        let mut record = build_record(row, self.child_columns.iter().copied());
        record.prepend(leading);
        record
    }

    fn step(&self, mut state: AssemblyState, row: &[CellValue]) -> AssemblyState {
        match self.classify(row) {
            RowKind::Parent => {
                if let Some(previous) = state.current.take() {
                    state.out.parents.push(previous.record);
                }
                let mut parent = self.open_parent(row);
                if self.group.parent_row_is_child && self.has_child_marker(row) {
                    let child = self.child(&mut parent, row);
                    state.out.children.push(child);
                }
                state.current = Some(parent);
            }
            RowKind::Structural => {}
            RowKind::Child => match state.current.as_mut() {
                Some(parent) => {
                    let child = self.child(parent, row);
                    state.out.children.push(child);
                }
                None => state.out.dropped.orphan_children += 1,
            },
            RowKind::Unmatched => state.out.dropped.unmatched_rows += 1,
        }
        state
    }
}

/// Split a grouped sheet into parent and child records
///
/// Parent ids are `{file_id}_{name}` with the name fields joined by `_`;
/// child ids are `{parent_id}_U{nn}`. Every child carries its parent's id
/// and no child refers to a parent emitted after it. Rows with nothing in
/// any mapped column are skipped without being counted.
pub fn assemble_groups(grid: &SheetGrid, spec: &LayoutSpec, file_id: &str) -> GroupedRecords {
    let Some(group) = &spec.grouping else {
        return GroupedRecords::default();
    };
    let plan = Plan::new(spec, group, file_id);

    let state = grid
        .rows_from(spec.data_start_row)
        .filter(|(_, row)| row_has_data(row, spec))
        .fold(AssemblyState::default(), |state, (_, row)| plan.step(state, row));

    let mut out = state.out;
    if let Some(last) = state.current {
        out.parents.push(last.record);
    }

    if out.dropped.total() > 0 {
        warn!(
            "Sheet '{}' (file {}): dropped {} orphan child rows and {} unmatched rows",
            spec.sheet_name, file_id, out.dropped.orphan_children, out.dropped.unmatched_rows
        );
    }
    out
}
