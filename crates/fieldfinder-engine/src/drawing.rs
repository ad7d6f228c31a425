//! Polygon drawing state machine.
//!
//! ```text
//!            start_drawing                 commit (>= 3 vertices)
//!   Idle ─────────────────────▶ Drawing ─────────────────────────▶ Editing
//!    ▲  ◀──── cancel / clear ───┘   │ click: append vertex           │ shape edits
//!    │                               │                                │ re-run search
//!    └─────────────────────────── clear ◀─────────────────────────────┘
//! ```
//!
//! Map listeners never capture controller state. Each one forwards a
//! [`DrawInput`] into the session's channel, and [`DrawingController::handle`]
//! interprets it against whatever state is current when it is dequeued.
//! Shape inputs are tagged with the overlay they were registered for, so
//! edits queued for a polygon that has since been removed are dropped.

use fieldfinder_core::{Coordinate, Polygon, Region};
use tokio::sync::mpsc::UnboundedSender;

use crate::surface::{ListenerId, MapSurface, Overlay, OverlayId, ShapeEventKind};

/// Messages produced by map listeners and keyboard shortcuts.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawInput {
    Click(Coordinate),
    DoubleClick(Coordinate),
    /// Enter key.
    Commit,
    /// Escape key.
    Cancel,
    ShapeChanged {
        overlay: OverlayId,
        kind: ShapeEventKind,
        vertices: Vec<Coordinate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    Idle,
    Drawing,
    Editing,
}

/// What the search side should do after a drawing transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Unchanged,
    /// Switch to (or stay in) containment mode with this polygon and search.
    Containment(Polygon),
    /// The polygon is gone; fall back to proximity mode and search.
    Proximity,
}

struct DrawingSession {
    path: Vec<Coordinate>,
    click: ListenerId,
    double_click: ListenerId,
    markers: Vec<OverlayId>,
    polyline: Option<OverlayId>,
}

struct EditingSession {
    overlay: OverlayId,
    polygon: Polygon,
    listeners: Vec<ListenerId>,
}

enum DrawState {
    Idle,
    Drawing(DrawingSession),
    Editing(EditingSession),
}

/// Sole owner of the map surface and the active polygon overlay.
pub struct DrawingController<S: MapSurface> {
    surface: S,
    inputs: UnboundedSender<DrawInput>,
    state: DrawState,
}

impl<S: MapSurface> DrawingController<S> {
    pub fn new(surface: S, inputs: UnboundedSender<DrawInput>) -> Self {
        Self {
            surface,
            inputs,
            state: DrawState::Idle,
        }
    }

    pub fn phase(&self) -> DrawPhase {
        match self.state {
            DrawState::Idle => DrawPhase::Idle,
            DrawState::Drawing(_) => DrawPhase::Drawing,
            DrawState::Editing(_) => DrawPhase::Editing,
        }
    }

    /// Vertices captured so far in the current drawing session.
    pub fn path(&self) -> &[Coordinate] {
        match &self.state {
            DrawState::Drawing(session) => &session.path,
            _ => &[],
        }
    }

    /// The committed polygon, while editing.
    pub fn active_polygon(&self) -> Option<&Polygon> {
        match &self.state {
            DrawState::Editing(session) => Some(&session.polygon),
            _ => None,
        }
    }

    pub fn active_overlay(&self) -> Option<OverlayId> {
        match &self.state {
            DrawState::Editing(session) => Some(session.overlay),
            _ => None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Begin capturing a new path. An existing polygon is torn down first,
    /// in which case the caller must fall back to proximity search.
    pub fn start_drawing(&mut self) -> DrawOutcome {
        let outcome = match self.state {
            DrawState::Idle => DrawOutcome::Unchanged,
            DrawState::Drawing(_) => {
                tracing::debug!("start_drawing ignored: already drawing");
                return DrawOutcome::Unchanged;
            }
            DrawState::Editing(_) => {
                self.teardown();
                DrawOutcome::Proximity
            }
        };

        let tx = self.inputs.clone();
        let click = self.surface.on_click(Box::new(move |at| {
            // The receiver only disappears when the session is dropped.
            let _ = tx.send(DrawInput::Click(at));
        }));
        let tx = self.inputs.clone();
        let double_click = self.surface.on_double_click(Box::new(move |at| {
            let _ = tx.send(DrawInput::DoubleClick(at));
        }));

        self.state = DrawState::Drawing(DrawingSession {
            path: Vec::new(),
            click,
            double_click,
            markers: Vec::new(),
            polyline: None,
        });
        tracing::debug!("drawing started");
        outcome
    }

    pub fn handle(&mut self, input: DrawInput) -> DrawOutcome {
        match input {
            DrawInput::Click(at) => {
                self.append_vertex(at);
                DrawOutcome::Unchanged
            }
            DrawInput::DoubleClick(_) | DrawInput::Commit => self.commit(),
            DrawInput::Cancel => self.cancel(),
            DrawInput::ShapeChanged {
                overlay,
                kind,
                vertices,
            } => self.shape_changed(overlay, kind, vertices),
        }
    }

    fn append_vertex(&mut self, at: Coordinate) {
        let DrawState::Drawing(session) = &mut self.state else {
            tracing::debug!(%at, "click ignored outside drawing");
            return;
        };

        session.path.push(at);
        session.markers.push(self.surface.add_overlay(Overlay::Marker(at)));

        // Replace the connecting line rather than stacking one per click.
        if let Some(previous) = session.polyline.take() {
            self.surface.remove_overlay(previous);
        }
        if session.path.len() >= 2 {
            let line = self
                .surface
                .add_overlay(Overlay::Polyline(session.path.clone()));
            session.polyline = Some(line);
        }
    }

    /// Close the current path into an editable polygon. With fewer than
    /// three distinct vertices this is a no-op and drawing continues.
    pub fn commit(&mut self) -> DrawOutcome {
        let DrawState::Drawing(session) = &self.state else {
            tracing::debug!("commit ignored outside drawing");
            return DrawOutcome::Unchanged;
        };

        match Polygon::new(session.path.clone()) {
            Ok(polygon) => self.enter_editing(polygon),
            Err(e) => {
                tracing::debug!(error = %e, "commit ignored");
                DrawOutcome::Unchanged
            }
        }
    }

    /// Commit an explicit path, replacing whatever is on the map. Paths
    /// with fewer than three distinct vertices leave the state unchanged.
    pub fn commit_path(&mut self, path: &[Coordinate]) -> DrawOutcome {
        match Polygon::new(path.to_vec()) {
            Ok(polygon) => self.enter_editing(polygon),
            Err(e) => {
                tracing::debug!(error = %e, "commit_path ignored");
                DrawOutcome::Unchanged
            }
        }
    }

    /// Abandon the current drawing session without creating a polygon.
    pub fn cancel(&mut self) -> DrawOutcome {
        if matches!(self.state, DrawState::Drawing(_)) {
            self.teardown();
            tracing::debug!("drawing cancelled");
        }
        DrawOutcome::Unchanged
    }

    /// Remove the polygon or in-progress path and return to proximity mode.
    pub fn clear(&mut self) -> DrawOutcome {
        if matches!(self.state, DrawState::Idle) {
            return DrawOutcome::Unchanged;
        }
        self.teardown();
        tracing::debug!("drawing cleared");
        DrawOutcome::Proximity
    }

    /// Show a saved region as the active polygon, skipping the drawing
    /// phase, and fit the viewport to it.
    pub fn load_region(&mut self, region: &Region) -> DrawOutcome {
        let outcome = self.enter_editing(region.coordinates.clone());
        self.surface.fit_bounds(region.coordinates.bounds());
        tracing::debug!(region = %region.name, "region loaded onto map");
        outcome
    }

    fn shape_changed(
        &mut self,
        overlay: OverlayId,
        kind: ShapeEventKind,
        vertices: Vec<Coordinate>,
    ) -> DrawOutcome {
        let DrawState::Editing(session) = &mut self.state else {
            tracing::debug!(%overlay, "shape edit ignored outside editing");
            return DrawOutcome::Unchanged;
        };
        if session.overlay != overlay {
            tracing::debug!(%overlay, "shape edit for a removed polygon ignored");
            return DrawOutcome::Unchanged;
        }
        match Polygon::new(vertices) {
            Ok(polygon) => {
                tracing::debug!(?kind, vertices = polygon.len(), "polygon edited");
                session.polygon = polygon.clone();
                DrawOutcome::Containment(polygon)
            }
            Err(e) => {
                tracing::warn!(error = %e, "shape edit left fewer than 3 vertices; ignored");
                DrawOutcome::Unchanged
            }
        }
    }

    fn enter_editing(&mut self, polygon: Polygon) -> DrawOutcome {
        self.teardown();

        let overlay = self.surface.add_overlay(Overlay::Polygon {
            vertices: polygon.vertices().to_vec(),
            editable: true,
            draggable: true,
        });
        let listeners = ShapeEventKind::ALL
            .iter()
            .map(|&kind| {
                let tx = self.inputs.clone();
                self.surface.on_shape_event(
                    overlay,
                    kind,
                    Box::new(move |vertices| {
                        let _ = tx.send(DrawInput::ShapeChanged {
                            overlay,
                            kind,
                            vertices,
                        });
                    }),
                )
            })
            .collect();

        tracing::debug!(%overlay, vertices = polygon.len(), "polygon committed");
        self.state = DrawState::Editing(EditingSession {
            overlay,
            polygon: polygon.clone(),
            listeners,
        });
        DrawOutcome::Containment(polygon)
    }

    /// Remove every overlay and listener owned by the current state and go
    /// back to idle.
    fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, DrawState::Idle) {
            DrawState::Idle => {}
            DrawState::Drawing(session) => {
                self.surface.remove_listener(session.click);
                self.surface.remove_listener(session.double_click);
                for marker in session.markers {
                    self.surface.remove_overlay(marker);
                }
                if let Some(line) = session.polyline {
                    self.surface.remove_overlay(line);
                }
            }
            DrawState::Editing(session) => {
                for listener in session.listeners {
                    self.surface.remove_listener(listener);
                }
                self.surface.remove_overlay(session.overlay);
            }
        }
    }
}

#[cfg(test)]
#[path = "drawing_test.rs"]
mod tests;
