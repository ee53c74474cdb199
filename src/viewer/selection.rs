//! Focus and selection marks over the shared index space.
//!
//! Both arrays are caller-owned and may be shared by sibling grids. Rows and
//! columns address the same one-dimensional index space, so column 3 and
//! row 3 share a mark.

use tracing::warn;

use crate::error::{GridError, Result};
use crate::layout::{CellPosition, PointerContext};
use crate::types::{FocusState, GridSize, SelectState, SharedStates, SourceId};

/// Change notification: source id, column index, row index (`-1` when not
/// applicable on that axis).
pub type ChangeCallback = Box<dyn FnMut(SourceId, i32, i32)>;

/// A click target for [`SelectionFocusModel::update_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionHit {
    /// The top-left corner: select or clear everything.
    Corner,
    /// Column header strip at this column.
    Column(u32),
    /// Row header strip at this row.
    Row(u32),
    /// A body cell.
    Cell { column: u32, row: u32 },
}

impl SelectionHit {
    /// Map a hit-test result onto a selection target. Scroll-bar regions
    /// select nothing.
    pub fn from_position(position: CellPosition) -> Option<Self> {
        match (position.column, position.row) {
            (PointerContext::Header, PointerContext::Header) => Some(Self::Corner),
            (PointerContext::Body(column), PointerContext::Header) => Some(Self::Column(column)),
            (PointerContext::Header, PointerContext::Body(row)) => Some(Self::Row(row)),
            (PointerContext::Body(column), PointerContext::Body(row)) => {
                Some(Self::Cell { column, row })
            }
            _ => None,
        }
    }

    /// `(column, row)` in callback encoding.
    pub fn to_wire(self) -> (i32, i32) {
        let wire = |i: u32| i32::try_from(i).unwrap_or(-1);
        match self {
            Self::Corner => (-1, -1),
            Self::Column(c) => (wire(c), -1),
            Self::Row(r) => (-1, wire(r)),
            Self::Cell { column, row } => (wire(column), wire(row)),
        }
    }
}

fn wire_index(index: Option<u32>) -> i32 {
    index.and_then(|i| i32::try_from(i).ok()).unwrap_or(-1)
}

pub struct SelectionFocusModel {
    source_id: SourceId,
    focused: SharedStates<FocusState>,
    selected: SharedStates<SelectState>,
    previous_focus: (Option<u32>, Option<u32>),
    on_focus_change: Option<ChangeCallback>,
    on_selection_change: Option<ChangeCallback>,
}

impl std::fmt::Debug for SelectionFocusModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionFocusModel")
            .field("source_id", &self.source_id)
            .field("previous_focus", &self.previous_focus)
            .finish_non_exhaustive()
    }
}

impl SelectionFocusModel {
    /// Wrap the caller's arrays.
    ///
    /// # Errors
    /// Returns [`GridError::StateLength`] when either array is shorter than
    /// the grid's index space (`max(numColumns, numRows)`).
    pub fn new(
        source_id: SourceId,
        grid: GridSize,
        focused: SharedStates<FocusState>,
        selected: SharedStates<SelectState>,
    ) -> Result<Self> {
        let expected = grid.index_space();
        let focused_len = focused.borrow().len();
        if focused_len < expected {
            return Err(GridError::StateLength {
                name: "focusedStates",
                expected,
                actual: focused_len,
            });
        }
        let selected_len = selected.borrow().len();
        if selected_len < expected {
            return Err(GridError::StateLength {
                name: "selectedStates",
                expected,
                actual: selected_len,
            });
        }
        Ok(Self {
            source_id,
            focused,
            selected,
            previous_focus: (None, None),
            on_focus_change: None,
            on_selection_change: None,
        })
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn focused(&self) -> &SharedStates<FocusState> {
        &self.focused
    }

    pub fn selected(&self) -> &SharedStates<SelectState> {
        &self.selected
    }

    pub fn previous_focus(&self) -> (Option<u32>, Option<u32>) {
        self.previous_focus
    }

    pub fn set_on_focus_change(&mut self, callback: Option<ChangeCallback>) {
        self.on_focus_change = callback;
    }

    pub fn set_on_selection_change(&mut self, callback: Option<ChangeCallback>) {
        self.on_selection_change = callback;
    }

    /// Mark the hovered column and row.
    ///
    /// Returns `false` without touching anything when the indices match the
    /// previous call. Otherwise clears every mark, marks `column` as
    /// horizontally focused and `row` as vertically focused, then fires the
    /// focus callback.
    pub fn update_focus(&mut self, column: Option<u32>, row: Option<u32>) -> bool {
        if (column, row) == self.previous_focus {
            return false;
        }
        self.mark_focus(column, row);
        self.previous_focus = (column, row);
        let source_id = self.source_id;
        if let Some(callback) = self.on_focus_change.as_mut() {
            callback(source_id, wire_index(column), wire_index(row));
        }
        true
    }

    /// Apply focus reported by a sibling grid. Records it as the previous
    /// focus and does not fire the callback.
    pub fn refresh_focus(&mut self, column: Option<u32>, row: Option<u32>) {
        self.mark_focus(column, row);
        self.previous_focus = (column, row);
    }

    fn mark_focus(&self, column: Option<u32>, row: Option<u32>) {
        let mut focused = self.focused.borrow_mut();
        focused.fill(FocusState::Default);
        let marks = [
            (column, FocusState::HorizontalFocused),
            (row, FocusState::VerticalFocused),
        ];
        for (index, mark) in marks {
            let Some(index) = index else { continue };
            match focused.get_mut(index as usize) {
                Some(slot) => *slot = mark,
                None => warn!(index, len = focused.len(), "focus index out of range"),
            }
        }
    }

    /// Toggle selection for a click target and fire the selection callback.
    pub fn update_selection(&mut self, hit: SelectionHit) {
        {
            let mut selected = self.selected.borrow_mut();
            match hit {
                SelectionHit::Corner => {
                    let any = selected.iter().any(|s| *s == SelectState::Selected);
                    selected.fill(if any {
                        SelectState::Default
                    } else {
                        SelectState::Selected
                    });
                }
                SelectionHit::Column(index) | SelectionHit::Row(index) => {
                    toggle(&mut selected, index);
                }
                SelectionHit::Cell { column, row } => {
                    toggle(&mut selected, row);
                    if column != row {
                        toggle(&mut selected, column);
                    }
                }
            }
        }
        let (column, row) = hit.to_wire();
        let source_id = self.source_id;
        if let Some(callback) = self.on_selection_change.as_mut() {
            callback(source_id, column, row);
        }
    }
}

fn toggle(states: &mut [SelectState], index: u32) {
    let len = states.len();
    match states.get_mut(index as usize) {
        Some(slot) => *slot = slot.toggled(),
        None => warn!(index, len, "selection index out of range"),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::shared_states;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn model(len: usize) -> SelectionFocusModel {
        let grid = GridSize::new(u32::try_from(len).unwrap(), 1);
        SelectionFocusModel::new(SourceId(0), grid, shared_states(len), shared_states(len)).unwrap()
    }

    #[test]
    fn short_arrays_are_rejected() {
        let result = SelectionFocusModel::new(
            SourceId(0),
            GridSize::new(4, 6),
            shared_states(6),
            shared_states(5),
        );
        assert!(matches!(
            result,
            Err(GridError::StateLength {
                name: "selectedStates",
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn focus_marks_column_and_row() {
        let mut m = model(5);
        assert!(m.update_focus(Some(1), Some(3)));
        assert_eq!(
            *m.focused().borrow(),
            vec![
                FocusState::Default,
                FocusState::HorizontalFocused,
                FocusState::Default,
                FocusState::VerticalFocused,
                FocusState::Default,
            ]
        );
        assert!(m.update_focus(None, Some(0)));
        let focused = m.focused().borrow();
        assert_eq!(focused.iter().filter(|f| **f != FocusState::Default).count(), 1);
        assert_eq!(focused.first(), Some(&FocusState::VerticalFocused));
    }

    #[test]
    fn identical_focus_is_a_no_op() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut m = model(4);
        m.set_on_focus_change(Some(Box::new(move |_, _, _| *counter.borrow_mut() += 1)));
        m.update_focus(Some(2), None);
        assert!(!m.update_focus(Some(2), None));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn refresh_focus_suppresses_callback_and_later_hover() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut m = model(4);
        m.set_on_focus_change(Some(Box::new(move |_, _, _| *counter.borrow_mut() += 1)));
        m.refresh_focus(Some(1), Some(2));
        assert!(!m.update_focus(Some(1), Some(2)));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn out_of_range_focus_is_ignored() {
        let mut m = model(3);
        m.update_focus(Some(9), Some(1));
        assert_eq!(m.focused().borrow().get(1), Some(&FocusState::VerticalFocused));
    }

    #[test]
    fn corner_selects_all_then_clears() {
        let mut m = model(3);
        m.update_selection(SelectionHit::Corner);
        assert!(m.selected().borrow().iter().all(|s| *s == SelectState::Selected));
        m.update_selection(SelectionHit::Row(1));
        m.update_selection(SelectionHit::Corner);
        assert!(m.selected().borrow().iter().all(|s| *s == SelectState::Default));
    }

    #[test]
    fn cell_on_diagonal_toggles_once() {
        let mut m = model(3);
        m.update_selection(SelectionHit::Cell { column: 2, row: 2 });
        assert_eq!(m.selected().borrow().get(2), Some(&SelectState::Selected));
    }

    #[test]
    fn selection_callback_reports_wire_indices() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut m = model(3);
        m.set_on_selection_change(Some(Box::new(move |id, c, r| sink.borrow_mut().push((id, c, r)))));
        m.update_selection(SelectionHit::Column(2));
        m.update_selection(SelectionHit::Corner);
        assert_eq!(*seen.borrow(), vec![(SourceId(0), 2, -1), (SourceId(0), -1, -1)]);
    }

    #[test]
    fn hit_mapping() {
        use PointerContext::*;
        assert_eq!(
            SelectionHit::from_position(CellPosition::new(Header, Header)),
            Some(SelectionHit::Corner)
        );
        assert_eq!(
            SelectionHit::from_position(CellPosition::new(Body(4), Header)),
            Some(SelectionHit::Column(4))
        );
        assert_eq!(
            SelectionHit::from_position(CellPosition::new(ScrollbarOther, ScrollbarHandle)),
            None
        );
    }
}
