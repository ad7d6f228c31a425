//! Map surface seam.
//!
//! The engine never talks to a mapping SDK directly. It needs pointer
//! subscriptions, three overlay primitives and viewport fitting, which is
//! what [`MapSurface`] exposes. [`MemorySurface`] is a headless
//! implementation that records everything and can replay pointer and shape
//! events; the CLI drives scripted polygon searches through it.

use std::collections::BTreeMap;

use fieldfinder_core::{Bounds, Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Marker(Coordinate),
    Polyline(Vec<Coordinate>),
    Polygon {
        vertices: Vec<Coordinate>,
        editable: bool,
        draggable: bool,
    },
}

/// Mutations a user can make to an editable polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeEventKind {
    VertexMoved,
    VertexInserted,
    ShapeDragged,
}

impl ShapeEventKind {
    pub const ALL: [ShapeEventKind; 3] = [
        ShapeEventKind::VertexMoved,
        ShapeEventKind::VertexInserted,
        ShapeEventKind::ShapeDragged,
    ];
}

/// Receives the coordinate under the pointer.
pub type PointerHandler = Box<dyn Fn(Coordinate) + Send>;

/// Receives the polygon's full vertex ring after a mutation.
pub type ShapeHandler = Box<dyn Fn(Vec<Coordinate>) + Send>;

pub trait MapSurface {
    fn on_click(&mut self, handler: PointerHandler) -> ListenerId;

    fn on_double_click(&mut self, handler: PointerHandler) -> ListenerId;

    fn on_shape_event(
        &mut self,
        overlay: OverlayId,
        kind: ShapeEventKind,
        handler: ShapeHandler,
    ) -> ListenerId;

    /// Removing an unknown id is a no-op.
    fn remove_listener(&mut self, id: ListenerId);

    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId;

    /// Removing an unknown id is a no-op.
    fn remove_overlay(&mut self, id: OverlayId);

    fn fit_bounds(&mut self, bounds: Bounds);
}

/// Listener categories, for inspecting a [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Click,
    DoubleClick,
    Shape,
}

enum Listener {
    Click(PointerHandler),
    DoubleClick(PointerHandler),
    Shape {
        overlay: OverlayId,
        kind: ShapeEventKind,
        handler: ShapeHandler,
    },
}

impl Listener {
    fn kind(&self) -> ListenerKind {
        match self {
            Listener::Click(_) => ListenerKind::Click,
            Listener::DoubleClick(_) => ListenerKind::DoubleClick,
            Listener::Shape { .. } => ListenerKind::Shape,
        }
    }
}

/// In-memory map surface.
#[derive(Default)]
pub struct MemorySurface {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
    overlays: BTreeMap<OverlayId, Overlay>,
    viewport: Option<Bounds>,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn register(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next());
        self.listeners.insert(id, listener);
        id
    }

    #[must_use]
    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|l| l.kind() == kind).count()
    }

    #[must_use]
    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.get(&id)
    }

    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, overlay)| (*id, overlay))
    }

    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    #[must_use]
    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    /// Simulate a primary click at `at`.
    pub fn click(&self, at: Coordinate) {
        for listener in self.listeners.values() {
            if let Listener::Click(handler) = listener {
                handler(at);
            }
        }
    }

    pub fn double_click(&self, at: Coordinate) {
        for listener in self.listeners.values() {
            if let Listener::DoubleClick(handler) = listener {
                handler(at);
            }
        }
    }

    /// Simulate a user mutation of polygon `overlay`: the stored vertices are
    /// replaced and matching shape listeners are notified. Returns `false` if
    /// the overlay is not an editable polygon.
    pub fn edit_shape(
        &mut self,
        overlay: OverlayId,
        kind: ShapeEventKind,
        vertices: Vec<Coordinate>,
    ) -> bool {
        match self.overlays.get_mut(&overlay) {
            Some(Overlay::Polygon {
                vertices: current,
                editable: true,
                ..
            }) => current.clone_from(&vertices),
            _ => return false,
        }
        for listener in self.listeners.values() {
            if let Listener::Shape {
                overlay: target,
                kind: listened,
                handler,
            } = listener
            {
                if *target == overlay && *listened == kind {
                    handler(vertices.clone());
                }
            }
        }
        true
    }
}

impl MapSurface for MemorySurface {
    fn on_click(&mut self, handler: PointerHandler) -> ListenerId {
        self.register(Listener::Click(handler))
    }

    fn on_double_click(&mut self, handler: PointerHandler) -> ListenerId {
        self.register(Listener::DoubleClick(handler))
    }

    fn on_shape_event(
        &mut self,
        overlay: OverlayId,
        kind: ShapeEventKind,
        handler: ShapeHandler,
    ) -> ListenerId {
        self.register(Listener::Shape {
            overlay,
            kind,
            handler,
        })
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next());
        self.overlays.insert(id, overlay);
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.viewport = Some(bounds);
    }
}
