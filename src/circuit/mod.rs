// src/circuit/mod.rs - Placed components, the board and the wiring graph
pub mod ids;
pub mod resolver;

use crate::circuit::ids::IdAllocator;
use piforge_shared::{
    BoardModel, ComponentKind, ComponentType, PinRef, Position, Wire, WireColor,
    wiring::{is_host_id, parse_host_pin},
};
use rand::seq::IndexedRandom;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Unknown pin: {0}")]
    UnknownPin(String),
    #[error("Wire would connect {0} to itself")]
    SelfLoop(String),
    #[error("Cannot apply {found} properties to a {expected}")]
    KindMismatch { expected: ComponentType, found: ComponentType },
}

/// A part placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub position: Position,
}

impl Component {
    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }
}

/// The single-board computer the parts are wired to.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub model: BoardModel,
    pub position: Position,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            model: BoardModel::default(),
            position: Position::new(100.0, 100.0),
        }
    }
}

/// Components and wires of one canvas session.
///
/// Invariant: every wire endpoint names a host GPIO (0..=27) or a declared pin of a live
/// component. Removing a component removes its wires.
#[derive(Debug, Default)]
pub struct Circuit {
    board: Board,
    components: Vec<Component>,
    wires: Vec<Wire>,
    ids: IdAllocator,
}

impl Circuit {
    pub fn new(model: BoardModel) -> Self {
        Self {
            board: Board { model, ..Board::default() },
            ..Self::default()
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board_model(&mut self, model: BoardModel) {
        tracing::info!("Switching board to {}", model.label());
        self.board.model = model;
    }

    pub fn move_board(&mut self, dx: f32, dy: f32) {
        self.board.position = self.board.position.offset(dx, dy);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_mut(&mut self, id: &str) -> Result<&mut Component, CircuitError> {
        self.components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CircuitError::UnknownComponent(id.to_string()))
    }

    pub fn wire(&self, id: &str) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    /// Drop a new part with its default properties. Returns the allocated id.
    pub fn place(&mut self, component_type: ComponentType, position: Position) -> String {
        self.place_kind(component_type.default_kind(), position)
    }

    pub fn place_kind(&mut self, kind: ComponentKind, position: Position) -> String {
        let id = self.ids.next_component_id();
        tracing::debug!("Placed {} as {} at ({}, {})", kind.component_type(), id, position.x, position.y);
        self.components.push(Component { id: id.clone(), kind, position });
        id
    }

    pub fn move_component(&mut self, id: &str, dx: f32, dy: f32) -> Result<Position, CircuitError> {
        let component = self.component_mut(id)?;
        component.position = component.position.offset(dx, dy);
        Ok(component.position)
    }

    /// Replace a part's properties. The new record must be of the same type.
    pub fn set_properties(&mut self, id: &str, kind: ComponentKind) -> Result<(), CircuitError> {
        let component = self.component_mut(id)?;
        let expected = component.component_type();
        let found = kind.component_type();
        if expected != found {
            return Err(CircuitError::KindMismatch { expected, found });
        }
        component.kind = kind;
        Ok(())
    }

    /// Delete a part and every wire touching it. Returns the removed wires.
    pub fn remove_component(&mut self, id: &str) -> Result<Vec<Wire>, CircuitError> {
        let index = self
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CircuitError::UnknownComponent(id.to_string()))?;
        self.components.remove(index);

        let (pruned, kept): (Vec<Wire>, Vec<Wire>) =
            std::mem::take(&mut self.wires).into_iter().partition(|w| w.touches(id));
        self.wires = kept;
        tracing::debug!("Removed component {} and {} wire(s)", id, pruned.len());
        Ok(pruned)
    }

    pub fn pin_exists(&self, pin: &PinRef) -> bool {
        if is_host_id(&pin.component_id) {
            return parse_host_pin(&pin.pin).is_some();
        }
        self.component(&pin.component_id)
            .is_some_and(|c| c.kind.has_pin(&pin.pin))
    }

    fn check_pin(&self, pin: &PinRef) -> Result<(), CircuitError> {
        if self.pin_exists(pin) {
            return Ok(());
        }
        if !is_host_id(&pin.component_id) && self.component(&pin.component_id).is_none() {
            return Err(CircuitError::UnknownComponent(pin.component_id.clone()));
        }
        Err(CircuitError::UnknownPin(pin.to_string()))
    }

    /// Commit a wire between two existing pins, with a random palette color.
    pub fn connect(&mut self, from: PinRef, to: PinRef) -> Result<String, CircuitError> {
        let color = WireColor::PALETTE
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or_default();
        self.connect_with_color(from, to, color)
    }

    pub fn connect_with_color(
        &mut self,
        from: PinRef,
        to: PinRef,
        color: WireColor,
    ) -> Result<String, CircuitError> {
        self.check_pin(&from)?;
        self.check_pin(&to)?;
        if from == to {
            return Err(CircuitError::SelfLoop(from.to_string()));
        }
        let id = self.ids.next_wire_id();
        tracing::debug!("Wire {} committed: {} -> {}", id, from, to);
        self.wires.push(Wire::new(id.clone(), from, to, color));
        Ok(id)
    }

    pub fn remove_wire(&mut self, id: &str) -> Option<Wire> {
        let index = self.wires.iter().position(|w| w.id == id)?;
        Some(self.wires.remove(index))
    }

    /// Wires with `component_id` at either end, in creation order.
    pub fn wires_touching<'a>(&'a self, component_id: &'a str) -> impl Iterator<Item = &'a Wire> + 'a {
        self.wires.iter().filter(move |w| w.touches(component_id))
    }

    /// Remove every component and wire. The board stays.
    pub fn clear(&mut self) {
        tracing::info!(
            "Clearing workbench ({} components, {} wires)",
            self.components.len(),
            self.wires.len()
        );
        self.components.clear();
        self.wires.clear();
    }
}
