//! `GridView`, the WASM-exported browser host around [`Grid`].
//!
//! This module wires DOM input events, the inertia interval timer and
//! `requestAnimationFrame` to a `Grid<WgpuBackend>`. Change notifications are
//! queued while the grid is borrowed and delivered to the JS callbacks only
//! after the borrow is released, so a callback may call straight back into
//! any instance (including this one).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Function;
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use super::grid::{viewport_states, Grid, InputEffect, ViewportStates};
use super::inertia::TICK_INTERVAL_MS;
use super::selection::ChangeCallback;
use crate::error::{GridError, Result};
use crate::render::{GpuBackend, WgpuBackend};
use crate::types::{
    shared_states, FocusState, GridConfig, Point, SelectState, SharedStates, SourceId,
};

/// Focus and selection arrays shared by sibling grids.
///
/// Allocate once in JS and pass the same instance to every `GridView` that
/// should mirror the same index space.
#[wasm_bindgen]
pub struct IndexStates {
    focused: SharedStates<FocusState>,
    selected: SharedStates<SelectState>,
}

#[wasm_bindgen]
impl IndexStates {
    /// `len` must be at least `max(numColumns, numRows)` of every grid using it.
    #[wasm_bindgen(constructor)]
    pub fn new(len: usize) -> IndexStates {
        IndexStates {
            focused: shared_states(len),
            selected: shared_states(len),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.selected.borrow().len()
    }

    /// 0 = none, 1 = focused column, 2 = focused row.
    #[wasm_bindgen(js_name = "focusAt")]
    pub fn focus_at(&self, index: usize) -> u32 {
        self.focused
            .borrow()
            .get(index)
            .map_or(0, |state| *state as u32)
    }

    #[wasm_bindgen(js_name = "isSelected")]
    pub fn is_selected(&self, index: usize) -> bool {
        matches!(self.selected.borrow().get(index), Some(SelectState::Selected))
    }
}

/// Published viewports, one slot per source id.
#[wasm_bindgen(js_name = "ViewportStates")]
pub struct ViewportTable {
    inner: ViewportStates,
}

#[wasm_bindgen(js_class = "ViewportStates")]
impl ViewportTable {
    #[wasm_bindgen(constructor)]
    pub fn new(len: usize) -> ViewportTable {
        ViewportTable {
            inner: viewport_states(len),
        }
    }

    /// `{ left, top, right, bottom }` for `source_id`, or `undefined` before
    /// that grid has rendered.
    #[wasm_bindgen(js_name = "viewportAt")]
    pub fn viewport_at(&self, source_id: usize) -> JsValue {
        self.inner
            .borrow()
            .get(source_id)
            .copied()
            .flatten()
            .and_then(|viewport| serde_wasm_bindgen::to_value(&viewport).ok())
            .unwrap_or(JsValue::UNDEFINED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotificationKind {
    Focus,
    Selection,
    Viewport,
}

#[derive(Debug, Clone, Copy)]
struct Notification {
    kind: NotificationKind,
    source: SourceId,
    column: i32,
    row: i32,
}

type Outbox = Rc<RefCell<Vec<Notification>>>;

fn queue_into(outbox: &Outbox, kind: NotificationKind) -> ChangeCallback {
    let outbox = Rc::clone(outbox);
    Box::new(move |source, column, row| {
        outbox.borrow_mut().push(Notification {
            kind,
            source,
            column,
            row,
        });
    })
}

#[derive(Default)]
struct JsCallbacks {
    focus: Option<Function>,
    selection: Option<Function>,
    viewport: Option<Function>,
}

impl JsCallbacks {
    fn get(&self, kind: NotificationKind) -> Option<Function> {
        match kind {
            NotificationKind::Focus => self.focus.clone(),
            NotificationKind::Selection => self.selection.clone(),
            NotificationKind::Viewport => self.viewport.clone(),
        }
    }
}

#[derive(Default)]
struct TimerState {
    interval: Option<i32>,
    tick_closure: Option<Closure<dyn FnMut()>>,
    frame_pending: Option<i32>,
    frame_closure: Option<Closure<dyn FnMut()>>,
}

struct Shared<B: GpuBackend> {
    grid: RefCell<Grid<B>>,
    canvas: HtmlCanvasElement,
    outbox: Outbox,
    callbacks: RefCell<JsCallbacks>,
    timer: RefCell<TimerState>,
}

impl<B: GpuBackend + 'static> Shared<B> {
    /// Route the grid's change callbacks into a fresh outbox.
    fn new(mut grid: Grid<B>, canvas: HtmlCanvasElement) -> Rc<Self> {
        let outbox: Outbox = Rc::new(RefCell::new(Vec::new()));
        grid.set_on_focus_change(Some(queue_into(&outbox, NotificationKind::Focus)));
        grid.set_on_selection_change(Some(queue_into(&outbox, NotificationKind::Selection)));
        grid.set_on_viewport_change(Some(queue_into(&outbox, NotificationKind::Viewport)));
        Rc::new(Self {
            grid: RefCell::new(grid),
            canvas,
            outbox,
            callbacks: RefCell::new(JsCallbacks::default()),
            timer: RefCell::new(TimerState::default()),
        })
    }

    fn apply(self: &Rc<Self>, effect: Result<InputEffect>) {
        match effect {
            Ok(effect) => {
                let _ = self
                    .canvas
                    .style()
                    .set_property("cursor", effect.cursor.css());
                if effect.arm_timer {
                    self.arm_timer();
                }
            }
            Err(e) => warn!(error = %e, "input event rejected"),
        }
        self.flush();
    }

    /// Deliver queued notifications. No borrow is held while JS runs.
    fn flush(&self) {
        let pending = std::mem::take(&mut *self.outbox.borrow_mut());
        for note in pending {
            let Some(callback) = self.callbacks.borrow().get(note.kind) else {
                continue;
            };
            let _ = callback.call3(
                &JsValue::NULL,
                &JsValue::from(note.source.0),
                &JsValue::from(note.column),
                &JsValue::from(note.row),
            );
        }
    }

    fn arm_timer(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let mut timer = self.timer.borrow_mut();
        if timer.interval.is_some() {
            return;
        }
        if timer.tick_closure.is_none() {
            let weak = Rc::downgrade(self);
            timer.tick_closure = Some(Closure::wrap(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick();
                }
            }) as Box<dyn FnMut()>));
        }
        let Some(callback) = timer.tick_closure.as_ref() else {
            return;
        };
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            TICK_INTERVAL_MS,
        ) {
            Ok(id) => timer.interval = Some(id),
            Err(_) => warn!("failed to arm inertia timer"),
        }
    }

    fn clear_timer(&self) {
        let mut timer = self.timer.borrow_mut();
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(id) = timer.interval.take() {
            window.clear_interval_with_handle(id);
        }
        if let Some(id) = timer.frame_pending.take() {
            let _ = window.cancel_animation_frame(id);
        }
    }

    fn tick(self: &Rc<Self>) {
        let keep_running = self.grid.borrow_mut().tick();
        match keep_running {
            Ok(true) => {}
            Ok(false) => {
                if let Some(id) = self.timer.borrow_mut().interval.take() {
                    if let Some(window) = web_sys::window() {
                        window.clear_interval_with_handle(id);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "inertia tick failed");
                self.clear_timer();
                return;
            }
        }
        self.request_frame();
    }

    fn request_frame(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let mut timer = self.timer.borrow_mut();
        if timer.frame_pending.is_some() {
            return;
        }
        if timer.frame_closure.is_none() {
            let weak: Weak<Self> = Rc::downgrade(self);
            timer.frame_closure = Some(Closure::wrap(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.timer.borrow_mut().frame_pending = None;
                    shared.render();
                }
            }) as Box<dyn FnMut()>));
        }
        let Some(callback) = timer.frame_closure.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            timer.frame_pending = Some(id);
        }
    }

    fn render(&self) {
        let result = self.grid.borrow_mut().render_frame();
        if let Err(e) = result {
            warn!(error = %e, "frame failed");
        }
        self.flush();
    }

    /// Stop the timer and any pending frame, tear the grid down and drop
    /// undelivered notifications.
    fn tear_down(&self) {
        self.clear_timer();
        self.grid.borrow_mut().tear_down();
        *self.callbacks.borrow_mut() = JsCallbacks::default();
        self.outbox.borrow_mut().clear();
    }
}

type MouseHandler<B> = fn(&mut Grid<B>, Point) -> Result<InputEffect>;
type TouchHandler<B> = fn(&mut Grid<B>, Option<(Point, u32)>) -> Option<Result<InputEffect>>;

/// Canvas-local position of a mouse event.
fn mouse_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

/// Canvas-local position of the first touch, with the touch count.
fn first_touch(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<(Point, u32)> {
    let touches = event.touches();
    let touch = touches.get(0)?;
    let rect = canvas.get_bounding_client_rect();
    Some((
        Point::new(
            f64::from(touch.client_x()) - rect.left(),
            f64::from(touch.client_y()) - rect.top(),
        ),
        touches.length(),
    ))
}

/// DOM listeners registered on the canvas. Each holds only a `Weak` to the
/// shared state.
#[derive(Default)]
struct Listeners {
    mouse: Vec<(&'static str, Closure<dyn FnMut(MouseEvent)>)>,
    touch: Vec<(&'static str, Closure<dyn FnMut(TouchEvent)>)>,
    wheel: Option<Closure<dyn FnMut(WheelEvent)>>,
}

impl Listeners {
    fn attach<B: GpuBackend + 'static>(shared: &Rc<Shared<B>>) -> Self {
        let canvas = &shared.canvas;
        let mut listeners = Self::default();

        let mouse_handlers: [(&'static str, MouseHandler<B>); 5] = [
            ("mousedown", |grid, point| grid.pointer_down(point)),
            ("mousemove", |grid, point| grid.pointer_move(point)),
            ("mouseup", |grid, _| grid.pointer_up()),
            ("mouseleave", |grid, _| grid.pointer_leave()),
            ("mouseenter", |grid, _| grid.pointer_enter()),
        ];
        for (name, handler) in mouse_handlers {
            let weak = Rc::downgrade(shared);
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let point = mouse_point(&shared.canvas, &event);
                let effect = handler(&mut shared.grid.borrow_mut(), point);
                shared.apply(effect);
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
            listeners.mouse.push((name, closure));
        }

        let touch_handlers: [(&'static str, TouchHandler<B>); 3] = [
            ("touchstart", |grid, touch| {
                touch.map(|(point, _)| grid.touch_start(point))
            }),
            ("touchmove", |grid, touch| {
                touch.map(|(point, count)| grid.touch_move(point, count))
            }),
            ("touchend", |grid, _| Some(grid.touch_end())),
        ];
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        for (name, handler) in touch_handlers {
            let weak = Rc::downgrade(shared);
            let closure = Closure::wrap(Box::new(move |event: TouchEvent| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                event.prevent_default();
                let touch = first_touch(&shared.canvas, &event);
                let effect = handler(&mut shared.grid.borrow_mut(), touch);
                if let Some(effect) = effect {
                    shared.apply(effect);
                }
            }) as Box<dyn FnMut(TouchEvent)>);
            canvas
                .add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    closure.as_ref().unchecked_ref(),
                    &options,
                )
                .ok();
            listeners.touch.push((name, closure));
        }

        let weak = Rc::downgrade(shared);
        let closure = Closure::wrap(Box::new(move |event: WheelEvent| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            event.prevent_default();
            let point = mouse_point(&shared.canvas, &event);
            let effect = shared.grid.borrow_mut().wheel(point, event.delta_y());
            shared.apply(effect);
        }) as Box<dyn FnMut(WheelEvent)>);
        canvas
            .add_event_listener_with_callback_and_add_event_listener_options(
                "wheel",
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .ok();
        listeners.wheel = Some(closure);
        listeners
    }

    fn detach(&mut self, canvas: &HtmlCanvasElement) {
        for (name, closure) in self.mouse.drain(..) {
            let _ = canvas
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        for (name, closure) in self.touch.drain(..) {
            let _ = canvas
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        if let Some(closure) = self.wheel.take() {
            let _ = canvas
                .remove_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.mouse.is_empty() && self.touch.is_empty() && self.wheel.is_none()
    }
}

/// The main grid viewer exported to JavaScript.
#[wasm_bindgen]
pub struct GridView {
    shared: Rc<Shared<WgpuBackend>>,
    listeners: Listeners,
}

#[wasm_bindgen]
impl GridView {
    /// Create a viewer on `canvas`. Resolves to a `GridView`.
    ///
    /// `config` is a plain object decoded into [`GridConfig`]. `data` holds
    /// `numColumns × numRows` values in row-major order, so cell
    /// `(column, row)` is at `row * numColumns + column`. `Infinity` marks an
    /// empty cell. The returned promise rejects when WebGPU is unavailable or
    /// an argument has the wrong size.
    #[wasm_bindgen]
    pub fn create(
        canvas: HtmlCanvasElement,
        config: JsValue,
        data: &[f32],
        states: &IndexStates,
        viewports: &ViewportTable,
    ) -> js_sys::Promise {
        console_error_panic_hook::set_once();

        let data = data.to_vec();
        let focused = Rc::clone(&states.focused);
        let selected = Rc::clone(&states.selected);
        let viewports = Rc::clone(&viewports.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            let view = Self::build(canvas, config, data, focused, selected, viewports).await?;
            Ok(view.into())
        })
    }

    #[wasm_bindgen(getter, js_name = "sourceId")]
    pub fn source_id(&self) -> u32 {
        self.shared.grid.borrow().source_id().0
    }

    /// `{ left, top, right, bottom }` in cell units.
    #[wasm_bindgen]
    pub fn viewport(&self) -> JsValue {
        let viewport = self.shared.grid.borrow().viewport();
        serde_wasm_bindgen::to_value(&viewport).unwrap_or(JsValue::UNDEFINED)
    }

    /// `callback(sourceId, column, row)` after the hovered indices change.
    #[wasm_bindgen(js_name = "setOnFocusChange")]
    pub fn set_on_focus_change(&self, callback: Option<Function>) {
        self.shared.callbacks.borrow_mut().focus = callback;
    }

    /// `callback(sourceId, column, row)` after a header click toggles selection.
    #[wasm_bindgen(js_name = "setOnSelectionChange")]
    pub fn set_on_selection_change(&self, callback: Option<Function>) {
        self.shared.callbacks.borrow_mut().selection = callback;
    }

    /// `callback(sourceId, left, top)` after a frame moved the viewport.
    #[wasm_bindgen(js_name = "setOnViewportChange")]
    pub fn set_on_viewport_change(&self, callback: Option<Function>) {
        self.shared.callbacks.borrow_mut().viewport = callback;
    }

    /// Mirror focus from the grid identified by `source_id`.
    ///
    /// # Errors
    /// Rejects after `destroy`.
    #[wasm_bindgen(js_name = "refreshFocus")]
    pub fn refresh_focus(
        &self,
        source_id: u32,
        column: i32,
        row: i32,
    ) -> std::result::Result<(), JsValue> {
        let arm = self
            .shared
            .grid
            .borrow_mut()
            .refresh_focus(SourceId(source_id), column, row)?;
        self.after_refresh(arm);
        Ok(())
    }

    /// Re-upload the shared selection after `source_id` toggled it.
    ///
    /// # Errors
    /// Rejects after `destroy`.
    #[wasm_bindgen(js_name = "refreshSelection")]
    pub fn refresh_selection(
        &self,
        source_id: u32,
        column: i32,
        row: i32,
    ) -> std::result::Result<(), JsValue> {
        let arm = self
            .shared
            .grid
            .borrow_mut()
            .refresh_selection(SourceId(source_id), column, row)?;
        self.after_refresh(arm);
        Ok(())
    }

    /// Apply the viewport `source_id` published in the shared table.
    ///
    /// # Errors
    /// Rejects after `destroy`.
    #[wasm_bindgen(js_name = "refreshViewport")]
    pub fn refresh_viewport(&self, source_id: u32) -> std::result::Result<(), JsValue> {
        let arm = self
            .shared
            .grid
            .borrow_mut()
            .refresh_viewport(SourceId(source_id))?;
        self.after_refresh(arm);
        Ok(())
    }

    /// Remove listeners, stop the timer and tear the grid down.
    #[wasm_bindgen]
    pub fn destroy(&mut self) {
        self.listeners.detach(&self.shared.canvas);
        self.shared.tear_down();
    }
}

impl GridView {
    async fn build(
        canvas: HtmlCanvasElement,
        config: JsValue,
        data: Vec<f32>,
        focused: SharedStates<FocusState>,
        selected: SharedStates<SelectState>,
        viewports: ViewportStates,
    ) -> Result<GridView> {
        let config: GridConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| GridError::Config(e.to_string()))?;
        let backend = WgpuBackend::new(canvas.clone()).await?;
        let grid = Grid::new(&config, backend, &data, focused, selected, Some(viewports))?;

        let shared = Shared::new(grid, canvas);
        let listeners = Listeners::attach(&shared);
        shared.render();
        Ok(GridView { shared, listeners })
    }

    fn after_refresh(&self, arm: bool) {
        if arm {
            self.shared.arm_timer();
        }
        self.shared.flush();
    }
}

impl Drop for GridView {
    fn drop(&mut self) {
        if !self.shared.grid.borrow().is_torn_down() {
            self.destroy();
        }
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
    use std::cell::Cell;

    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    use super::*;
    use crate::render::DrawRegion;
    use crate::types::{CanvasSize, GridSize, HeaderOffset};

    wasm_bindgen_test_configure!(run_in_browser);

    /// Backend with no GPU behind it. Counts submissions.
    #[derive(Default)]
    struct NullBackend {
        submits: Rc<Cell<usize>>,
    }

    impl GpuBackend for NullBackend {
        type Buffer = ();
        type BindGroup = ();
        type Pipeline = ();
        type Bundle = ();

        fn create_uniform_buffer(&mut self, _label: &str, _size: u64) -> Result<()> {
            Ok(())
        }

        fn create_storage_buffer(&mut self, _label: &str, _size: u64) -> Result<()> {
            Ok(())
        }

        fn create_vertex_buffer(&mut self, _label: &str, _contents: &[u8]) -> Result<()> {
            Ok(())
        }

        fn write_buffer(&mut self, _buffer: &(), _offset: u64, _data: &[u8]) {}

        fn create_bind_group(&mut self, _buffers: [&(); 5]) {}

        fn create_pipeline(&mut self, _region: DrawRegion) -> Result<()> {
            Ok(())
        }

        fn create_render_bundle(
            &mut self,
            _region: DrawRegion,
            _pipeline: &(),
            _bind_group: &(),
            _vertices: &(),
            _vertex_count: u32,
            _instance_count: u32,
        ) {
        }

        fn submit(&mut self, _bundles: &[()]) -> Result<()> {
            self.submits.set(self.submits.get() + 1);
            Ok(())
        }
    }

    fn canvas() -> HtmlCanvasElement {
        web_sys::window()
            .unwrap()
            .document()
            .unwrap()
            .create_element("canvas")
            .unwrap()
            .dyn_into::<HtmlCanvasElement>()
            .unwrap()
    }

    /// A 10x10 grid with 20px headers on an unattached canvas, so a mouse
    /// event at client (0, 0) lands on the corner header.
    fn host(backend: NullBackend) -> Rc<Shared<NullBackend>> {
        let config = GridConfig::new(
            GridSize::new(10, 10),
            CanvasSize {
                width: 120.0,
                height: 120.0,
            },
            HeaderOffset {
                left: 20.0,
                top: 20.0,
            },
        );
        let grid = Grid::new(
            &config,
            backend,
            &[0.0; 100],
            shared_states(10),
            shared_states(10),
            None,
        )
        .unwrap();
        Shared::new(grid, canvas())
    }

    fn dispatch(shared: &Shared<NullBackend>, name: &str) {
        let event = MouseEvent::new(name).unwrap();
        shared.canvas.dispatch_event(&event).unwrap();
    }

    type Log = Rc<RefCell<Vec<(u32, i32, i32)>>>;

    fn logging_callback(log: &Log) -> Closure<dyn FnMut(u32, i32, i32)> {
        let sink = Rc::clone(log);
        Closure::wrap(Box::new(move |source, column, row| {
            sink.borrow_mut().push((source, column, row));
        }) as Box<dyn FnMut(u32, i32, i32)>)
    }

    // ============================================================================
    // Notification delivery
    // ============================================================================

    #[wasm_bindgen_test]
    fn selection_callback_runs_after_the_grid_is_released() {
        let shared = host(NullBackend::default());
        let mut listeners = Listeners::attach(&shared);

        let reentered = Rc::new(Cell::new(false));
        let weak = Rc::downgrade(&shared);
        let flag = Rc::clone(&reentered);
        let callback = Closure::wrap(Box::new(move |_source: u32, _column: i32, _row: i32| {
            let shared = weak.upgrade().unwrap();
            // Panics with BorrowMutError if the grid were still borrowed.
            let arm = shared
                .grid
                .borrow_mut()
                .refresh_focus(SourceId(9), 1, 1)
                .unwrap();
            flag.set(!arm);
        }) as Box<dyn FnMut(u32, i32, i32)>);
        shared.callbacks.borrow_mut().selection =
            Some(callback.as_ref().unchecked_ref::<Function>().clone());

        dispatch(&shared, "mousedown");

        assert!(reentered.get());
        assert!(shared.outbox.borrow().is_empty());
        listeners.detach(&shared.canvas);
        shared.tear_down();
    }

    #[wasm_bindgen_test]
    fn corner_press_notifies_selection_once() {
        let shared = host(NullBackend::default());
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let focus = logging_callback(&log);
        let selection = logging_callback(&log);
        {
            let mut callbacks = shared.callbacks.borrow_mut();
            callbacks.focus = Some(focus.as_ref().unchecked_ref::<Function>().clone());
            callbacks.selection = Some(selection.as_ref().unchecked_ref::<Function>().clone());
        }

        let effect = shared.grid.borrow_mut().pointer_down(Point::new(5.0, 5.0));
        shared.apply(effect);
        let effect = shared.grid.borrow_mut().pointer_move(Point::new(50.0, 50.0));
        shared.apply(effect);
        assert_eq!(*log.borrow(), vec![(0, -1, -1)]);

        // Focus was never set, so release reports nothing.
        let effect = shared.grid.borrow_mut().pointer_up();
        shared.apply(effect);
        assert_eq!(log.borrow().len(), 1);
        shared.tear_down();
    }

    // ============================================================================
    // Teardown
    // ============================================================================

    #[wasm_bindgen_test]
    fn detached_listeners_ignore_events() {
        let shared = host(NullBackend::default());
        let mut listeners = Listeners::attach(&shared);
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let callback = logging_callback(&log);
        shared.callbacks.borrow_mut().selection =
            Some(callback.as_ref().unchecked_ref::<Function>().clone());

        listeners.detach(&shared.canvas);
        dispatch(&shared, "mousedown");

        assert!(listeners.is_empty());
        assert!(log.borrow().is_empty());
        assert!(shared.timer.borrow().interval.is_none());
    }

    #[wasm_bindgen_test]
    fn tear_down_stops_timer_and_drops_callbacks() {
        let shared = host(NullBackend::default());
        let mut listeners = Listeners::attach(&shared);
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let callback = logging_callback(&log);
        shared.callbacks.borrow_mut().viewport =
            Some(callback.as_ref().unchecked_ref::<Function>().clone());

        dispatch(&shared, "mousedown");
        assert!(shared.timer.borrow().interval.is_some());
        shared.request_frame();
        assert!(shared.timer.borrow().frame_pending.is_some());

        listeners.detach(&shared.canvas);
        shared.tear_down();

        let timer = shared.timer.borrow();
        assert!(timer.interval.is_none());
        assert!(timer.frame_pending.is_none());
        assert!(shared.grid.borrow().is_torn_down());
        assert!(shared.callbacks.borrow().viewport.is_none());
        assert!(shared.outbox.borrow().is_empty());
    }

    #[wasm_bindgen_test]
    fn torn_down_grid_rejects_input_without_panicking() {
        let shared = host(NullBackend::default());
        shared.tear_down();
        let effect = shared.grid.borrow_mut().pointer_down(Point::new(5.0, 5.0));
        assert!(matches!(effect, Err(GridError::TornDown)));
        shared.apply(effect);
        shared.render();
        assert!(shared.timer.borrow().interval.is_none());
    }

    // ============================================================================
    // Timer
    // ============================================================================

    #[wasm_bindgen_test]
    fn settled_tick_clears_interval_and_requests_one_frame() {
        let shared = host(NullBackend::default());
        let mut listeners = Listeners::attach(&shared);

        dispatch(&shared, "mousedown");
        dispatch(&shared, "mouseup");
        assert!(shared.timer.borrow().interval.is_some());

        shared.tick();
        {
            let timer = shared.timer.borrow();
            assert!(timer.interval.is_none());
            assert!(timer.frame_pending.is_some());
        }

        // A pending frame is not requested twice.
        let pending = shared.timer.borrow().frame_pending;
        shared.request_frame();
        assert_eq!(shared.timer.borrow().frame_pending, pending);

        listeners.detach(&shared.canvas);
        shared.tear_down();
        assert!(shared.timer.borrow().frame_pending.is_none());
    }

    #[wasm_bindgen_test]
    fn render_submits_one_frame() {
        let backend = NullBackend::default();
        let submits = Rc::clone(&backend.submits);
        let shared = host(backend);
        shared.render();
        assert_eq!(submits.get(), 1);
        shared.tear_down();
    }
}
