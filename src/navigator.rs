use crate::text_layout::LayoutRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Input,
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

/// Which surface has the keyboard, plus the display's own cursor. `point`
/// outlives a focus change so the input can still act on the candidate last
/// visited in the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPointer {
    pub surface: Surface,
    pub point: Option<GridPos>,
    pub goal_col: Option<usize>,
}

impl Default for FocusPointer {
    fn default() -> Self {
        Self {
            surface: Surface::Input,
            point: None,
            goal_col: None,
        }
    }
}

impl FocusPointer {
    pub fn in_display(&self) -> bool {
        self.surface == Surface::Display
    }

    pub fn focus_input(&mut self) {
        self.surface = Surface::Input;
    }

    pub fn focus_display_at(&mut self, pos: GridPos) {
        self.surface = Surface::Display;
        self.point = Some(pos);
        self.goal_col = Some(pos.col);
    }

    pub fn reset_point(&mut self) {
        self.point = None;
        self.goal_col = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(GridPos),
    Boundary,
}

pub fn first_position(rows: &[LayoutRow]) -> Option<GridPos> {
    rows.iter()
        .position(|row| row.items().is_some_and(|items| !items.is_empty()))
        .map(|row| GridPos { row, col: 0 })
}

pub fn last_position(rows: &[LayoutRow]) -> Option<GridPos> {
    rows.iter().enumerate().rev().find_map(|(row, r)| {
        r.items()
            .filter(|items| !items.is_empty())
            .map(|items| GridPos {
                row,
                col: items.len() - 1,
            })
    })
}

/// Running past the first or last candidate row, even partway, is a
/// [`Step::Boundary`]. Header rows are stepped over.
pub fn step(rows: &[LayoutRow], from: GridPos, goal_col: usize, delta: isize) -> Step {
    let item_rows: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.items().is_some_and(|items| !items.is_empty()))
        .map(|(idx, _)| idx)
        .collect();
    let Some(current) = item_rows.iter().position(|row| *row == from.row) else {
        return Step::Boundary;
    };
    let target = current as isize + delta;
    if target < 0 || target >= item_rows.len() as isize {
        return Step::Boundary;
    }
    let row = item_rows[target as usize];
    let width = rows[row].items().map(<[usize]>::len).unwrap_or(1);
    Step::Moved(GridPos {
        row,
        col: goal_col.min(width.saturating_sub(1)),
    })
}

pub fn candidate_at(rows: &[LayoutRow], pos: GridPos) -> Option<usize> {
    rows.get(pos.row)?.items()?.get(pos.col).copied()
}

pub fn position_of(rows: &[LayoutRow], index: usize) -> Option<GridPos> {
    rows.iter().enumerate().find_map(|(row, r)| {
        r.items()?
            .iter()
            .position(|item| *item == index)
            .map(|col| GridPos { row, col })
    })
}
