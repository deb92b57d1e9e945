use crate::candidates::Candidate;

pub const COLUMN_GAP: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutRow {
    Header(String),
    Items(Vec<usize>),
}

impl LayoutRow {
    pub fn items(&self) -> Option<&[usize]> {
        match self {
            LayoutRow::Items(items) => Some(items),
            LayoutRow::Header(_) => None,
        }
    }
}

pub fn column_count(candidates: &[Candidate], width: u16, reserved: u16) -> usize {
    let widest = candidates
        .iter()
        .map(|c| c.text.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let cell = widest
        .saturating_add(reserved)
        .saturating_add(COLUMN_GAP)
        .max(1);
    (width.saturating_add(COLUMN_GAP) / cell).max(1) as usize
}

pub fn layout_rows(candidates: &[Candidate], columns: usize) -> Vec<LayoutRow> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut current_group: Option<&str> = None;
    let mut current_row: Vec<usize> = Vec::with_capacity(columns);

    for (idx, candidate) in candidates.iter().enumerate() {
        let group = candidate.group.as_deref();
        if idx == 0 || group != current_group {
            if !current_row.is_empty() {
                rows.push(LayoutRow::Items(std::mem::take(&mut current_row)));
            }
            if let Some(title) = group {
                rows.push(LayoutRow::Header(title.to_string()));
            }
            current_group = group;
        }
        current_row.push(idx);
        if current_row.len() == columns {
            rows.push(LayoutRow::Items(std::mem::take(&mut current_row)));
        }
    }
    if !current_row.is_empty() {
        rows.push(LayoutRow::Items(current_row));
    }
    rows
}
