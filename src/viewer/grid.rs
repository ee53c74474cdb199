//! One grid instance: navigation state, selection, inertia and GPU sync.
//!
//! `Grid` is plain Rust and generic over [`GpuBackend`]. The browser host
//! forwards DOM events and timer ticks to it; native tests drive it directly.

use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::layout::{Viewport, ViewportModel, VisibleCells};
use crate::render::{F32Uniforms, GpuBackend, GpuResourceSync, U32Uniforms};
use crate::types::{
    shared_states, FocusState, GeometryState, GridConfig, Offset, Point, ScrollbarFocus,
    SelectState, SharedStates, SourceId,
};

use super::inertia::{InertiaScheduler, SchedulerState};
use super::input::{Cursor, InputInterpreter, PointerDown};
use super::selection::{ChangeCallback, SelectionFocusModel, SelectionHit};

/// Caller-owned table of published viewports, one slot per source id.
pub type ViewportStates = SharedStates<Option<Viewport>>;

/// Allocate a viewport table for `len` sibling grids.
pub fn viewport_states(len: usize) -> ViewportStates {
    shared_states(len)
}

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEffect {
    pub cursor: Cursor,
    /// The inertia scheduler just left idle; arm the periodic tick.
    pub arm_timer: bool,
}

pub struct Grid<B: GpuBackend> {
    source_id: SourceId,
    geometry: GeometryState,
    model: ViewportModel,
    input: InputInterpreter,
    selection: SelectionFocusModel,
    inertia: InertiaScheduler,
    sync: GpuResourceSync<B>,
    visible: VisibleCells,
    viewport_states: Option<ViewportStates>,
    published: Option<Viewport>,
    on_viewport_change: Option<ChangeCallback>,
    torn_down: bool,
}

impl<B: GpuBackend> Grid<B> {
    /// Build a grid and upload its initial data, marks and uniforms.
    ///
    /// # Errors
    /// - [`GridError::InvalidConfig`] when `config` fails validation
    /// - [`GridError::DataLength`] when `data` is not `numColumns × numRows`
    /// - [`GridError::StateLength`] when a state array is too short
    /// - backend allocation failures
    pub fn new(
        config: &GridConfig,
        backend: B,
        data: &[f32],
        focused: SharedStates<FocusState>,
        selected: SharedStates<SelectState>,
        viewport_states: Option<ViewportStates>,
    ) -> Result<Self> {
        config.validate()?;
        let geometry = config.geometry();
        // Row-major: cell (column, row) lives at `row * numColumns + column`.
        let expected = geometry
            .grid_size
            .cell_count()
            .ok_or_else(|| GridError::InvalidConfig("cell count overflows".into()))?;
        if data.len() != expected {
            return Err(GridError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let selection =
            SelectionFocusModel::new(config.source_id, geometry.grid_size, focused, selected)?;
        let model = ViewportModel::new(
            geometry.grid_size,
            config.initial_viewport,
            config.initial_overscroll,
        );
        let mut sync = GpuResourceSync::new(backend, geometry.grid_size)?;
        sync.update_data(data)?;
        sync.update_focused(&selection.focused().borrow())?;
        sync.update_selected(&selection.selected().borrow())?;

        debug!(
            source_id = config.source_id.0,
            columns = geometry.grid_size.num_columns,
            rows = geometry.grid_size.num_rows,
            "grid created"
        );

        let mut grid = Self {
            source_id: config.source_id,
            geometry,
            model,
            input: InputInterpreter::new(),
            selection,
            inertia: InertiaScheduler::new(),
            sync,
            visible: VisibleCells::default(),
            viewport_states,
            published: None,
            on_viewport_change: None,
            torn_down: false,
        };
        grid.visible = grid.model.visible_cells();
        grid.upload_uniforms();
        Ok(grid)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.torn_down {
            Err(GridError::TornDown)
        } else {
            Ok(())
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn geometry(&self) -> &GeometryState {
        &self.geometry
    }

    pub fn viewport(&self) -> Viewport {
        self.model.viewport()
    }

    pub fn overscroll(&self) -> Offset {
        self.model.overscroll()
    }

    pub fn velocity(&self) -> Offset {
        self.model.velocity()
    }

    pub fn visible_cells(&self) -> VisibleCells {
        self.visible
    }

    pub fn scrollbar_focus(&self) -> ScrollbarFocus {
        self.input.scrollbar_focus()
    }

    pub fn cursor(&self) -> Cursor {
        self.input.cursor()
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    pub fn inertia_state(&self) -> SchedulerState {
        self.inertia.state()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn sync(&self) -> &GpuResourceSync<B> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut GpuResourceSync<B> {
        &mut self.sync
    }

    pub fn set_on_focus_change(&mut self, callback: Option<ChangeCallback>) {
        self.selection.set_on_focus_change(callback);
    }

    pub fn set_on_selection_change(&mut self, callback: Option<ChangeCallback>) {
        self.selection.set_on_selection_change(callback);
    }

    pub fn set_on_viewport_change(&mut self, callback: Option<ChangeCallback>) {
        self.on_viewport_change = callback;
    }

    /// Proposed viewport for the active drag.
    ///
    /// # Errors
    /// [`GridError::DragInactive`] when no pointer is down.
    pub fn drag_proposal(&self) -> Result<Viewport> {
        self.ensure_live()?;
        self.input.drag_proposal(&self.geometry)
    }

    fn effect(&mut self) -> InputEffect {
        InputEffect {
            cursor: self.input.cursor(),
            arm_timer: self.inertia.start(),
        }
    }

    fn upload_uniforms(&mut self) {
        self.sync.update_f32_uniforms(&F32Uniforms::new(
            &self.geometry,
            &self.model.viewport(),
            self.model.overscroll(),
        ));
        self.sync.update_u32_uniforms(&U32Uniforms::new(
            self.geometry.grid_size,
            self.visible,
            self.input.scrollbar_focus(),
        ));
    }

    fn upload_focused(&mut self) -> Result<()> {
        let focused = self.selection.focused().borrow();
        self.sync.update_focused(&focused)
    }

    fn upload_selected(&mut self) -> Result<()> {
        let selected = self.selection.selected().borrow();
        self.sync.update_selected(&selected)
    }

    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn pointer_down(&mut self, point: Point) -> Result<InputEffect> {
        self.ensure_live()?;
        match self
            .input
            .pointer_down(&self.geometry, &mut self.model, point)
        {
            PointerDown::Drag {
                selection: Some(hit),
            } => {
                self.selection.update_selection(hit);
                self.upload_selected()?;
            }
            PointerDown::Drag { selection: None } | PointerDown::Paged(_) => {}
            PointerDown::Ignored => {
                return Ok(InputEffect {
                    cursor: self.input.cursor(),
                    arm_timer: false,
                })
            }
        }
        Ok(self.effect())
    }

    /// Drag when a pointer is down, hover otherwise.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn pointer_move(&mut self, point: Point) -> Result<InputEffect> {
        self.ensure_live()?;
        if self.input.is_dragging() {
            self.input
                .drag_move(&self.geometry, &mut self.model, point)?;
        } else {
            self.hover(point)?;
        }
        Ok(self.effect())
    }

    fn hover(&mut self, point: Point) -> Result<()> {
        let position = self.input.hover(&self.geometry, &self.model, point);
        self.sync.update_u32_uniforms(&U32Uniforms::new(
            self.geometry.grid_size,
            self.visible,
            self.input.scrollbar_focus(),
        ));
        if self
            .selection
            .update_focus(position.column.index(), position.row.index())
        {
            self.upload_focused()?;
        }
        Ok(())
    }

    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn pointer_up(&mut self) -> Result<InputEffect> {
        self.ensure_live()?;
        self.input.pointer_up();
        if self.selection.update_focus(None, None) {
            self.upload_focused()?;
        }
        Ok(self.effect())
    }

    /// Clears focus and lets momentum continue. An active drag survives.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn pointer_leave(&mut self) -> Result<InputEffect> {
        self.ensure_live()?;
        self.input.pointer_leave();
        if self.selection.update_focus(None, None) {
            self.upload_focused()?;
        }
        Ok(self.effect())
    }

    /// # Errors
    /// [`GridError::TornDown`].
    pub fn pointer_enter(&mut self) -> Result<InputEffect> {
        self.ensure_live()?;
        Ok(self.effect())
    }

    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn touch_start(&mut self, first: Point) -> Result<InputEffect> {
        self.pointer_down(first)
    }

    /// Drags by the first touch when two or more touches are down during a
    /// drag, hovers otherwise.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn touch_move(&mut self, first: Point, touches: u32) -> Result<InputEffect> {
        self.ensure_live()?;
        if touches >= 2 && self.input.is_dragging() {
            self.input
                .drag_move(&self.geometry, &mut self.model, first)?;
        } else {
            self.hover(first)?;
        }
        Ok(self.effect())
    }

    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn touch_end(&mut self) -> Result<InputEffect> {
        self.pointer_up()
    }

    /// Zoom about `point`. A zero `delta_y` is ignored.
    ///
    /// # Errors
    /// [`GridError::TornDown`].
    pub fn wheel(&mut self, point: Point, delta_y: f64) -> Result<InputEffect> {
        self.ensure_live()?;
        if self
            .input
            .wheel(&self.geometry, &mut self.model, point, delta_y)
            .is_none()
        {
            return Ok(InputEffect {
                cursor: self.input.cursor(),
                arm_timer: false,
            });
        }
        Ok(self.effect())
    }

    /// Advance inertia by one period. Returns whether the timer should keep
    /// running. The host renders one frame per tick regardless.
    ///
    /// # Errors
    /// [`GridError::TornDown`].
    pub fn tick(&mut self) -> Result<bool> {
        self.ensure_live()?;
        let dragging = self.input.is_dragging();
        Ok(self.inertia.tick(&mut self.model, dragging))
    }

    /// Apply the drag or momentum proposal, upload uniforms, then draw.
    ///
    /// Fires the viewport callback after the frame when the viewport moved
    /// since the last published one.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend submission failures.
    pub fn render_frame(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.update_viewport()?;
        self.visible = self.model.visible_cells();
        self.upload_uniforms();
        self.sync.render(self.visible)?;
        self.publish_viewport();
        Ok(())
    }

    fn update_viewport(&mut self) -> Result<()> {
        if let Some(drag) = self.input.drag().copied() {
            let proposal = self.input.drag_proposal(&self.geometry)?;
            self.model.regulate(
                drag.start_size,
                drag.start_cell_size,
                proposal,
                self.input.accumulates_overscroll(),
            );
        } else {
            let viewport = self.model.viewport();
            let velocity = self.model.velocity();
            let proposal = if self.input.scrollbar_focus().is_single_axis() {
                viewport
            } else {
                viewport.translated(velocity.x, velocity.y)
            };
            self.model.regulate(
                viewport.size(),
                viewport.cell_size(self.geometry.body_extent()),
                proposal,
                false,
            );
        }
        Ok(())
    }

    fn publish_viewport(&mut self) {
        let viewport = self.model.viewport();
        if self.published == Some(viewport) {
            return;
        }
        self.published = Some(viewport);
        self.store_viewport(viewport);
        if let Some(callback) = self.on_viewport_change.as_mut() {
            callback(self.source_id, floor_index(viewport.left), floor_index(viewport.top));
        }
    }

    fn store_viewport(&self, viewport: Viewport) {
        let Some(states) = self.viewport_states.as_ref() else {
            return;
        };
        let mut states = states.borrow_mut();
        let len = states.len();
        match states.get_mut(self.source_id.index()) {
            Some(slot) => *slot = Some(viewport),
            None => warn!(
                source_id = self.source_id.0,
                len, "viewport slot out of range"
            ),
        }
    }

    /// Mirror a sibling's focus into the shared array. Own id is ignored.
    ///
    /// Returns whether the host should arm the tick timer.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn refresh_focus(&mut self, source: SourceId, column: i32, row: i32) -> Result<bool> {
        self.ensure_live()?;
        if source == self.source_id {
            return Ok(false);
        }
        self.selection
            .refresh_focus(u32::try_from(column).ok(), u32::try_from(row).ok());
        self.upload_focused()?;
        Ok(self.inertia.start())
    }

    /// Re-upload the shared selection array after a sibling toggled it.
    /// Own id is ignored.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn refresh_selection(&mut self, source: SourceId, _column: i32, _row: i32) -> Result<bool> {
        self.ensure_live()?;
        if source == self.source_id {
            return Ok(false);
        }
        self.upload_selected()?;
        Ok(self.inertia.start())
    }

    /// Pull the viewport a sibling published and apply it. Own id is ignored.
    ///
    /// The mirrored viewport is recorded as published so it is not echoed
    /// back through the viewport callback.
    ///
    /// # Errors
    /// [`GridError::TornDown`].
    pub fn refresh_viewport(&mut self, source: SourceId) -> Result<bool> {
        self.ensure_live()?;
        if source == self.source_id {
            return Ok(false);
        }
        let pulled = self
            .viewport_states
            .as_ref()
            .and_then(|states| states.borrow().get(source.index()).copied().flatten());
        let Some(viewport) = pulled else {
            return Ok(false);
        };
        if !viewport.is_well_formed() {
            warn!(source_id = source.0, ?viewport, "ignoring malformed shared viewport");
            return Ok(false);
        }
        let applied = self.model.regulate(
            viewport.size(),
            viewport.cell_size(self.geometry.body_extent()),
            viewport,
            false,
        );
        self.published = Some(applied);
        self.store_viewport(applied);
        Ok(self.inertia.start())
    }

    /// Toggle selection directly, as a header or cell click would.
    ///
    /// # Errors
    /// [`GridError::TornDown`], or backend upload failures.
    pub fn update_selection(&mut self, hit: SelectionHit) -> Result<bool> {
        self.ensure_live()?;
        self.selection.update_selection(hit);
        self.upload_selected()?;
        Ok(self.inertia.start())
    }

    /// Stop ticking and refuse every further operation.
    pub fn tear_down(&mut self) {
        if !self.torn_down {
            debug!(source_id = self.source_id.0, "grid torn down");
        }
        self.torn_down = true;
        self.inertia.stop();
        self.input.pointer_up();
        self.on_viewport_change = None;
        self.selection.set_on_focus_change(None);
        self.selection.set_on_selection_change(None);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_index(value: f64) -> i32 {
    value.floor() as i32
}
