use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::NoUninit;
use serde::{Deserialize, Serialize};

/// Per-index focus mark. Uploaded verbatim as a `u32` storage array.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NoUninit)]
pub enum FocusState {
    #[default]
    Default = 0,
    /// The index is the hovered column.
    HorizontalFocused = 1,
    /// The index is the hovered row.
    VerticalFocused = 2,
}

/// Per-index selection mark. Uploaded verbatim as a `u32` storage array.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NoUninit)]
pub enum SelectState {
    #[default]
    Default = 0,
    Selected = 1,
}

impl SelectState {
    /// `Selected` becomes `Default` and vice versa.
    pub fn toggled(self) -> Self {
        match self {
            Self::Default => Self::Selected,
            Self::Selected => Self::Default,
        }
    }
}

/// Which scroll-bar axis the pointer currently targets.
///
/// Encoded as bit flags in the integer uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollbarFocus {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl ScrollbarFocus {
    pub fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Horizontal => 1,
            Self::Vertical => 2,
            Self::Both => 3,
        }
    }

    /// True while a single scroll bar owns the pointer. Drags then move the
    /// handle instead of panning, and overscroll is not accumulated.
    pub fn is_single_axis(self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical)
    }
}

/// Identifier of a grid instance, passed to every change callback so a
/// coordinator can skip the instance that originated a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u32);

impl SourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A caller-owned state array, shared between grid instances.
pub type SharedStates<T> = Rc<RefCell<Vec<T>>>;

/// Allocate a shared state array of `len` default entries.
pub fn shared_states<T: Default + Clone>(len: usize) -> SharedStates<T> {
    Rc::new(RefCell::new(vec![T::default(); len]))
}
