// src/interaction.rs - Interaction mode controller
//
// Decides what a pointer gesture on the canvas means (move, connect, delete) and applies
// it to the circuit. The mode only changes through an explicit tool selection.

use crate::circuit::{Circuit, CircuitError};
use piforge_shared::{PinRef, Position, Wire};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Drag,
    Wire,
    Erase,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionMode::Drag => "DRAG",
            InteractionMode::Wire => "WIRE",
            InteractionMode::Erase => "ERASE",
        };
        f.write_str(name)
    }
}

/// Half-finished wire: the first pin clicked and where the rubber band currently ends.
#[derive(Debug, Clone, PartialEq)]
pub struct WireDraft {
    pub origin: PinRef,
    pub cursor: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Component(String),
    Board,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveDrag {
    target: DragTarget,
    last: Position,
}

/// Result of clicking a pin.
#[derive(Debug, Clone, PartialEq)]
pub enum PinClick {
    /// Not in WIRE mode.
    Ignored,
    DraftStarted,
    /// The draft's own origin was clicked again.
    DraftCancelled,
    Committed { wire_id: String },
    /// The circuit refused the wire; the draft is dropped.
    Rejected(CircuitError),
}

#[derive(Debug, Default)]
pub struct InteractionController {
    mode: InteractionMode,
    draft: Option<WireDraft>,
    drag: Option<ActiveDrag>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn draft(&self) -> Option<&WireDraft> {
        self.draft.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Switch tools. Any pending draft or drag is discarded, even when re-selecting the
    /// current mode.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if self.draft.take().is_some() {
            tracing::debug!("Discarding wire draft on switch to {}", mode);
        }
        self.drag = None;
        if self.mode != mode {
            tracing::info!("Interaction mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn click_pin(&mut self, circuit: &mut Circuit, pin: PinRef, at: Position) -> PinClick {
        if self.mode != InteractionMode::Wire {
            return PinClick::Ignored;
        }
        match self.draft.take() {
            None => {
                tracing::debug!("Wire draft started at {}", pin);
                self.draft = Some(WireDraft { origin: pin, cursor: at });
                PinClick::DraftStarted
            }
            Some(draft) if draft.origin == pin => {
                tracing::debug!("Wire draft at {} cancelled", pin);
                PinClick::DraftCancelled
            }
            Some(draft) => match circuit.connect(draft.origin, pin) {
                Ok(wire_id) => PinClick::Committed { wire_id },
                Err(e) => {
                    tracing::debug!("Wire rejected: {}", e);
                    PinClick::Rejected(e)
                }
            },
        }
    }

    /// Start moving a component or the board. Only DRAG mode moves things.
    pub fn pointer_down_on_body(&mut self, target: DragTarget, at: Position) -> bool {
        if self.mode != InteractionMode::Drag {
            return false;
        }
        self.drag = Some(ActiveDrag { target, last: at });
        true
    }

    /// Track the pointer: moves the rubber band of a pending draft and the dragged body.
    pub fn pointer_move(&mut self, circuit: &mut Circuit, at: Position) {
        if let Some(draft) = self.draft.as_mut() {
            draft.cursor = at;
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = (at.x - drag.last.x, at.y - drag.last.y);
        drag.last = at;
        match &drag.target {
            DragTarget::Board => circuit.move_board(dx, dy),
            DragTarget::Component(id) => {
                if let Err(e) = circuit.move_component(id, dx, dy) {
                    tracing::debug!("Dropping drag: {}", e);
                    self.drag = None;
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Delete affordance of a component. ERASE mode only; returns the wires removed with it.
    pub fn click_delete(&mut self, circuit: &mut Circuit, component_id: &str) -> Option<Vec<Wire>> {
        if self.mode != InteractionMode::Erase {
            return None;
        }
        circuit.remove_component(component_id).ok()
    }

    pub fn click_wire(&mut self, circuit: &mut Circuit, wire_id: &str) -> Option<Wire> {
        if self.mode != InteractionMode::Erase {
            return None;
        }
        circuit.remove_wire(wire_id)
    }

    /// A click on empty canvas drops a pending draft.
    pub fn click_canvas(&mut self) {
        if self.draft.take().is_some() {
            tracing::debug!("Wire draft cancelled by canvas click");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piforge_shared::{BoardModel, ComponentType};

    #[test]
    fn test_drag_mode_ignores_pins() {
        let mut circuit = Circuit::new(BoardModel::RPi4B);
        let mut ctl = InteractionController::new();
        assert_eq!(
            ctl.click_pin(&mut circuit, PinRef::host(4), Position::default()),
            PinClick::Ignored
        );
        assert!(ctl.draft().is_none());
    }

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let mut circuit = Circuit::new(BoardModel::RPi4B);
        let led = circuit.place(ComponentType::Led, Position::new(0.0, 0.0));
        let mut ctl = InteractionController::new();

        assert!(ctl.pointer_down_on_body(DragTarget::Component(led.clone()), Position::new(5.0, 5.0)));
        ctl.pointer_move(&mut circuit, Position::new(8.0, 9.0));
        ctl.pointer_move(&mut circuit, Position::new(10.0, 10.0));
        ctl.pointer_up();
        ctl.pointer_move(&mut circuit, Position::new(50.0, 50.0));
        assert_eq!(circuit.component(&led).unwrap().position, Position::new(5.0, 5.0));
    }

    #[test]
    fn test_wire_mode_bodies_are_not_draggable() {
        let mut ctl = InteractionController::new();
        ctl.set_mode(InteractionMode::Wire);
        assert!(!ctl.pointer_down_on_body(DragTarget::Board, Position::default()));
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_draft_tracks_cursor() {
        let mut circuit = Circuit::new(BoardModel::RPi4B);
        let mut ctl = InteractionController::new();
        ctl.set_mode(InteractionMode::Wire);
        ctl.click_pin(&mut circuit, PinRef::host(4), Position::new(1.0, 1.0));
        ctl.pointer_move(&mut circuit, Position::new(30.0, 40.0));
        assert_eq!(ctl.draft().unwrap().cursor, Position::new(30.0, 40.0));
        ctl.click_canvas();
        assert!(ctl.draft().is_none());
    }

    #[test]
    fn test_erase_requires_erase_mode() {
        let mut circuit = Circuit::new(BoardModel::RPi4B);
        let led = circuit.place(ComponentType::Led, Position::default());
        let mut ctl = InteractionController::new();
        assert!(ctl.click_delete(&mut circuit, &led).is_none());
        assert!(circuit.component(&led).is_some());

        ctl.set_mode(InteractionMode::Erase);
        assert_eq!(ctl.click_delete(&mut circuit, &led), Some(Vec::new()));
        assert!(circuit.component(&led).is_none());
    }
}
