//! Canvas interaction engine - drag-create, drag-move and resize gestures.
//!
//! Exactly one gesture is active at a time. Pointer positions are client
//! coordinates; the engine translates them into the canvas's local space
//! using [`CanvasSurface`].
//!
//! Resizing keeps its geometry in the gesture until release and commits it to
//! the [`ElementStore`] in one update. While a resize is active the engine
//! holds a [`ListenerGuard`]; hosts route global pointer-move/up events to the
//! engine only while [`ListenerRegistry::is_listening`] is true. The guard is
//! released on commit, on [`CanvasEngine::cancel`] and when the engine is
//! dropped.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{ElementId, ElementKind, ElementPatch, ElementStore, Geometry, Point, Styles};

/// Smallest width/height a resize may produce.
pub const MIN_SIZE: f32 = 20.0;

/// The design surface elements are placed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSurface {
    /// Top-left corner of the canvas in client coordinates.
    pub origin: Point,
    /// Rendered width.
    pub width: f32,
    /// Rendered height, always twice the width.
    pub height: f32,
}

impl CanvasSurface {
    /// Create a surface at `origin` with the given rendered width.
    #[must_use]
    pub fn new(origin: Point, width: f32) -> Self {
        Self {
            origin,
            width,
            height: width * 2.0,
        }
    }

    /// Track a new rendered width; the height follows at twice the width.
    pub fn resize(&mut self, width: f32) {
        self.width = width;
        self.height = width * 2.0;
    }

    /// Whether a client point lies over the canvas.
    #[must_use]
    pub fn contains(&self, client: Point) -> bool {
        let local = self.to_local(client);
        local.x >= 0.0 && local.y >= 0.0 && local.x <= self.width && local.y <= self.height
    }

    /// Translate a client point into canvas coordinates.
    #[must_use]
    pub fn to_local(&self, client: Point) -> Point {
        client - self.origin
    }
}

/// Resize handle around a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    /// Top-left corner.
    TopLeft,
    /// Top edge.
    Top,
    /// Top-right corner.
    TopRight,
    /// Right edge.
    Right,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom edge.
    Bottom,
    /// Bottom-left corner.
    BottomLeft,
    /// Left edge.
    Left,
}

impl ResizeHandle {
    /// All eight handles, clockwise from the top-left corner.
    pub const ALL: [ResizeHandle; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    /// Style keys written when a resize with this handle is committed.
    ///
    /// Untouched axes keep their stored values (`auto`, percentages).
    #[must_use]
    pub fn committed_styles(self, geometry: Geometry) -> Styles {
        let mut styles = Styles::new();
        if self.moves_left() {
            styles.set_px("left", geometry.left);
        }
        if self.moves_left() || self.moves_right() {
            styles.set_px("width", geometry.width);
        }
        if self.moves_top() {
            styles.set_px("top", geometry.top);
        }
        if self.moves_top() || self.moves_bottom() {
            styles.set_px("height", geometry.height);
        }
        styles
    }
}

/// Geometry after dragging `handle` by `delta` from `start`.
///
/// Far edges (right/bottom) change only the size. Near edges (left/top)
/// change the size and shift the origin by the delta. The size is clamped to
/// [`MIN_SIZE`] after the origin has moved, so the origin keeps following the
/// pointer even once the size stops shrinking.
#[must_use]
pub fn apply_resize(start: Geometry, handle: ResizeHandle, delta: Point) -> Geometry {
    let mut next = start;

    if handle.moves_right() {
        next.width = start.width + delta.x;
    }
    if handle.moves_left() {
        next.width = start.width - delta.x;
        next.left = start.left + delta.x;
    }
    if handle.moves_bottom() {
        next.height = start.height + delta.y;
    }
    if handle.moves_top() {
        next.height = start.height - delta.y;
        next.top = start.top + delta.y;
    }

    next.width = next.width.max(MIN_SIZE);
    next.height = next.height.max(MIN_SIZE);
    next
}

/// Shared count of attached pointer listeners.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    active: Rc<Cell<usize>>,
}

impl ListenerRegistry {
    /// Create a registry with nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach listeners until the returned guard is dropped.
    #[must_use]
    pub fn acquire(&self) -> ListenerGuard {
        self.active.set(self.active.get() + 1);
        ListenerGuard {
            active: Rc::clone(&self.active),
        }
    }

    /// Number of attached listener sets.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.get()
    }

    /// Whether global pointer events should be routed to the engine.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.active() > 0
    }
}

/// Keeps pointer listeners attached for the lifetime of a resize.
#[derive(Debug)]
pub struct ListenerGuard {
    active: Rc<Cell<usize>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

/// Which gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    /// No gesture.
    Idle,
    /// A palette item is being dragged.
    Creating(ElementKind),
    /// A placed element is being dragged.
    Moving(ElementId),
    /// A placed element is being resized.
    Resizing(ElementId),
}

#[derive(Debug)]
struct ResizeGesture {
    id: ElementId,
    handle: ResizeHandle,
    start_pointer: Point,
    start: Geometry,
    current: Geometry,
    _listeners: ListenerGuard,
}

#[derive(Debug)]
enum Gesture {
    Idle,
    Creating(ElementKind),
    Moving { id: ElementId, offset: Point },
    Resizing(ResizeGesture),
}

/// Gesture state machine driving the element store from pointer input.
#[derive(Debug)]
pub struct CanvasEngine {
    surface: CanvasSurface,
    gesture: Gesture,
    listeners: ListenerRegistry,
}

impl CanvasEngine {
    /// Create an idle engine over `surface`.
    #[must_use]
    pub fn new(surface: CanvasSurface) -> Self {
        Self {
            surface,
            gesture: Gesture::Idle,
            listeners: ListenerRegistry::new(),
        }
    }

    /// The canvas surface.
    #[must_use]
    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    /// Track a new rendered canvas width (on mount and on every resize).
    pub fn resize_canvas(&mut self, width: f32) {
        self.surface.resize(width);
    }

    /// Move the canvas origin, e.g. after scrolling.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.surface.origin = origin;
    }

    /// Listener registry for the resize gesture.
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// The current gesture.
    #[must_use]
    pub fn mode(&self) -> GestureMode {
        match &self.gesture {
            Gesture::Idle => GestureMode::Idle,
            Gesture::Creating(kind) => GestureMode::Creating(*kind),
            Gesture::Moving { id, .. } => GestureMode::Moving(*id),
            Gesture::Resizing(resize) => GestureMode::Resizing(resize.id),
        }
    }

    /// Pick up a palette item.
    ///
    /// Returns `false` if another gesture is in progress.
    pub fn begin_create(&mut self, kind: ElementKind) -> bool {
        if !matches!(self.gesture, Gesture::Idle) {
            return false;
        }
        self.gesture = Gesture::Creating(kind);
        true
    }

    /// Pick up a placed element at `pointer`.
    ///
    /// Returns `false` if the element is unknown or another gesture (a resize
    /// in particular) is in progress.
    pub fn begin_move(&mut self, store: &ElementStore, id: ElementId, pointer: Point) -> bool {
        if !matches!(self.gesture, Gesture::Idle) {
            tracing::debug!(%id, mode = ?self.mode(), "Move suppressed");
            return false;
        }
        let Some(element) = store.get(id) else {
            return false;
        };

        let geometry = element
            .styles
            .geometry((self.surface.width, self.surface.height), MIN_SIZE);
        let element_origin = Point::new(
            self.surface.origin.x + geometry.left,
            self.surface.origin.y + geometry.top,
        );
        self.gesture = Gesture::Moving {
            id,
            offset: pointer - element_origin,
        };
        true
    }

    /// Release a create or move drag at `pointer`.
    ///
    /// Creates or moves the element when released over the canvas and returns
    /// its id. A release outside the canvas ends the gesture without touching
    /// the store. Resize gestures are unaffected; use
    /// [`CanvasEngine::pointer_up`].
    pub fn drop_at(&mut self, store: &mut ElementStore, pointer: Point) -> Option<ElementId> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let over_canvas = self.surface.contains(pointer);

        match gesture {
            Gesture::Creating(kind) if over_canvas => {
                Some(store.create(kind, self.surface.to_local(pointer)))
            }
            Gesture::Moving { id, offset } if over_canvas => {
                let position = self.surface.to_local(pointer) - offset;
                let mut styles = Styles::new();
                styles.set_px("left", position.x);
                styles.set_px("top", position.y);
                store.update(id, ElementPatch::styles(styles)).then_some(id)
            }
            Gesture::Resizing(resize) => {
                self.gesture = Gesture::Resizing(resize);
                None
            }
            Gesture::Creating(_) | Gesture::Moving { .. } => {
                tracing::debug!(x = pointer.x, y = pointer.y, "Dropped outside canvas");
                None
            }
            Gesture::Idle => None,
        }
    }

    /// Start resizing `id` from `handle`, attaching pointer listeners.
    ///
    /// Returns `false` if the element is unknown or another gesture is in
    /// progress.
    pub fn begin_resize(
        &mut self,
        store: &ElementStore,
        id: ElementId,
        handle: ResizeHandle,
        pointer: Point,
    ) -> bool {
        if !matches!(self.gesture, Gesture::Idle) {
            return false;
        }
        let Some(element) = store.get(id) else {
            return false;
        };

        let start = element
            .styles
            .geometry((self.surface.width, self.surface.height), MIN_SIZE);
        tracing::debug!(%id, ?handle, "Resize started");
        self.gesture = Gesture::Resizing(ResizeGesture {
            id,
            handle,
            start_pointer: pointer,
            start,
            current: start,
            _listeners: self.listeners.acquire(),
        });
        true
    }

    /// Feed a pointer move; returns the in-flight geometry while resizing.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Geometry> {
        let Gesture::Resizing(resize) = &mut self.gesture else {
            return None;
        };
        resize.current = apply_resize(resize.start, resize.handle, pointer - resize.start_pointer);
        Some(resize.current)
    }

    /// In-flight resize geometry, if a resize is active.
    #[must_use]
    pub fn preview(&self) -> Option<(ElementId, Geometry)> {
        match &self.gesture {
            Gesture::Resizing(resize) => Some((resize.id, resize.current)),
            _ => None,
        }
    }

    /// Release the pointer, committing an active resize to the store.
    ///
    /// Detaches the resize listeners and returns the resized element id.
    pub fn pointer_up(&mut self, store: &mut ElementStore) -> Option<ElementId> {
        if !matches!(self.gesture, Gesture::Resizing(_)) {
            return None;
        }
        let Gesture::Resizing(resize) = std::mem::replace(&mut self.gesture, Gesture::Idle) else {
            return None;
        };

        let committed = store.update(
            resize.id,
            ElementPatch::styles(resize.handle.committed_styles(resize.current)),
        );
        tracing::debug!(id = %resize.id, committed, "Resize finished");
        committed.then_some(resize.id)
    }

    /// Abandon the current gesture without touching the store.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(left: f32, top: f32, width: f32, height: f32) -> Geometry {
        Geometry {
            left,
            top,
            width,
            height,
        }
    }

    fn engine() -> CanvasEngine {
        CanvasEngine::new(CanvasSurface::new(Point::new(100.0, 50.0), 600.0))
    }

    #[test]
    fn test_surface_height_follows_width() {
        let mut engine = engine();
        assert_eq!(engine.surface().height, 1200.0);
        engine.resize_canvas(400.0);
        assert_eq!(engine.surface().height, 800.0);
    }

    #[test]
    fn test_resize_top_left() {
        let start = geometry(50.0, 50.0, 100.0, 100.0);
        let next = apply_resize(start, ResizeHandle::TopLeft, Point::new(10.0, 10.0));
        assert_eq!(next, geometry(60.0, 60.0, 90.0, 90.0));
    }

    #[test]
    fn test_resize_clamps_after_shift() {
        let start = geometry(60.0, 60.0, 90.0, 90.0);
        let next = apply_resize(start, ResizeHandle::TopLeft, Point::new(1000.0, 1000.0));
        assert_eq!(next, geometry(1060.0, 1060.0, 20.0, 20.0));
    }

    #[test]
    fn test_resize_far_edges_keep_origin() {
        let start = geometry(50.0, 50.0, 100.0, 100.0);
        assert_eq!(
            apply_resize(start, ResizeHandle::BottomRight, Point::new(15.0, -30.0)),
            geometry(50.0, 50.0, 115.0, 70.0)
        );
        assert_eq!(
            apply_resize(start, ResizeHandle::Right, Point::new(-200.0, 40.0)),
            geometry(50.0, 50.0, 20.0, 100.0)
        );
        assert_eq!(
            apply_resize(start, ResizeHandle::Top, Point::new(40.0, 25.0)),
            geometry(50.0, 75.0, 100.0, 75.0)
        );
        assert_eq!(
            apply_resize(start, ResizeHandle::BottomLeft, Point::new(-10.0, 10.0)),
            geometry(40.0, 50.0, 110.0, 110.0)
        );
        assert_eq!(
            apply_resize(start, ResizeHandle::TopRight, Point::new(10.0, -10.0)),
            geometry(50.0, 40.0, 110.0, 110.0)
        );
    }

    #[test]
    fn test_create_drop_translates_to_canvas() {
        let mut engine = engine();
        let mut store = ElementStore::new();

        assert!(engine.begin_create(ElementKind::Heading));
        assert_eq!(engine.mode(), GestureMode::Creating(ElementKind::Heading));
        let id = engine
            .drop_at(&mut store, Point::new(130.0, 90.0))
            .expect("created");

        let element = store.get(id).expect("element");
        assert_eq!(element.kind, ElementKind::Heading);
        assert_eq!(element.styles.get("left"), Some("30px"));
        assert_eq!(element.styles.get("top"), Some("40px"));
        assert_eq!(engine.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_drop_outside_canvas_is_ignored() {
        let mut engine = engine();
        let mut store = ElementStore::new();

        engine.begin_create(ElementKind::Image);
        assert!(engine.drop_at(&mut store, Point::new(10.0, 10.0)).is_none());
        assert!(store.is_empty());
        assert_eq!(engine.mode(), GestureMode::Idle);
    }

    #[test]
    fn test_move_keeps_pointer_offset() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Paragraph, Point::new(20.0, 20.0));

        // Grab the element 5px inside its top-left corner.
        assert!(engine.begin_move(&store, id, Point::new(125.0, 75.0)));
        assert_eq!(engine.drop_at(&mut store, Point::new(305.0, 155.0)), Some(id));

        let element = store.get(id).expect("element");
        assert_eq!(element.styles.get("left"), Some("200px"));
        assert_eq!(element.styles.get("top"), Some("100px"));
    }

    #[test]
    fn test_resize_commits_on_release() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::new(50.0, 50.0));

        assert!(engine.begin_resize(&store, id, ResizeHandle::TopLeft, Point::new(0.0, 0.0)));
        assert!(engine.listeners().is_listening());

        let preview = engine.pointer_move(Point::new(10.0, 10.0));
        assert_eq!(preview, Some(geometry(60.0, 60.0, 90.0, 90.0)));
        // Not committed yet.
        assert_eq!(store.get(id).and_then(|e| e.styles.px("width")), Some(100.0));

        assert_eq!(engine.pointer_up(&mut store), Some(id));
        assert!(!engine.listeners().is_listening());

        let styles = &store.get(id).expect("element").styles;
        assert_eq!(styles.px("left"), Some(60.0));
        assert_eq!(styles.px("top"), Some(60.0));
        assert_eq!(styles.px("width"), Some(90.0));
        assert_eq!(styles.px("height"), Some(90.0));
    }

    #[test]
    fn test_sequential_resizes_clamp() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::new(50.0, 50.0));

        engine.begin_resize(&store, id, ResizeHandle::TopLeft, Point::default());
        engine.pointer_move(Point::new(10.0, 10.0));
        engine.pointer_up(&mut store);

        engine.begin_resize(&store, id, ResizeHandle::TopLeft, Point::default());
        engine.pointer_move(Point::new(1000.0, 1000.0));
        engine.pointer_up(&mut store);

        let element = store.get(id).expect("element");
        let g = element
            .styles
            .geometry((engine.surface().width, engine.surface().height), MIN_SIZE);
        assert_eq!(g, geometry(1060.0, 1060.0, 20.0, 20.0));
    }

    #[test]
    fn test_move_suppressed_while_resizing() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::new(50.0, 50.0));

        engine.begin_resize(&store, id, ResizeHandle::Right, Point::default());
        assert!(!engine.begin_move(&store, id, Point::new(160.0, 110.0)));
        assert!(engine.drop_at(&mut store, Point::new(300.0, 300.0)).is_none());
        assert_eq!(engine.mode(), GestureMode::Resizing(id));
    }

    #[test]
    fn test_cancel_detaches_and_discards() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::new(50.0, 50.0));
        let before = store.clone();

        engine.begin_resize(&store, id, ResizeHandle::Bottom, Point::default());
        engine.pointer_move(Point::new(0.0, 80.0));
        engine.cancel();

        assert!(!engine.listeners().is_listening());
        assert_eq!(engine.pointer_up(&mut store), None);
        assert_eq!(store, before);
    }

    #[test]
    fn test_repeated_resizes_do_not_leak_listeners() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::new(50.0, 50.0));

        for handle in ResizeHandle::ALL {
            assert!(engine.begin_resize(&store, id, handle, Point::default()));
            assert_eq!(engine.listeners().active(), 1);
            engine.pointer_move(Point::new(3.0, 3.0));
            engine.pointer_up(&mut store);
            assert_eq!(engine.listeners().active(), 0);
        }
    }

    #[test]
    fn test_teardown_detaches_listeners() {
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Image, Point::default());

        let mut engine = engine();
        let registry = engine.listeners().clone();
        engine.begin_resize(&store, id, ResizeHandle::Left, Point::default());
        assert!(registry.is_listening());

        drop(engine);
        assert!(!registry.is_listening());
    }

    #[test]
    fn test_table_resize_resolves_full_width() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Table, Point::default());

        engine.begin_resize(&store, id, ResizeHandle::Right, Point::default());
        let preview = engine.pointer_move(Point::new(-100.0, 0.0)).expect("resizing");
        assert_eq!(preview.width, 500.0);
        assert_eq!(preview.height, MIN_SIZE);
    }

    #[test]
    fn test_right_edge_resize_keeps_auto_height() {
        let mut engine = engine();
        let mut store = ElementStore::new();
        let id = store.create(ElementKind::Table, Point::default());

        engine.begin_resize(&store, id, ResizeHandle::Right, Point::default());
        engine.pointer_move(Point::new(-100.0, 0.0));
        assert_eq!(engine.pointer_up(&mut store), Some(id));

        let styles = &store.get(id).expect("element").styles;
        assert_eq!(styles.get("width"), Some("500px"));
        assert_eq!(styles.get("height"), Some("auto"));
        assert_eq!(styles.get("left"), Some("0px"));
        assert_eq!(styles.get("top"), Some("0px"));
    }

    #[test]
    fn test_committed_styles_per_handle() {
        let g = geometry(1.0, 2.0, 30.0, 40.0);

        let bottom = ResizeHandle::Bottom.committed_styles(g);
        assert_eq!(bottom.len(), 1);
        assert_eq!(bottom.px("height"), Some(40.0));

        let top_left = ResizeHandle::TopLeft.committed_styles(g);
        assert_eq!(top_left.len(), 4);

        let top_right = ResizeHandle::TopRight.committed_styles(g);
        assert_eq!(top_right.get("left"), None);
        assert_eq!(top_right.px("top"), Some(2.0));
        assert_eq!(top_right.px("width"), Some(30.0));
    }
}
