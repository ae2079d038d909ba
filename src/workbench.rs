// src/workbench.rs - Canvas session: circuit, gestures and render invalidation
use crate::circuit::resolver::{self, ComponentReading};
use crate::circuit::{Circuit, CircuitError};
use crate::hardware::RegisterBank;
use crate::interaction::{DragTarget, InteractionController, InteractionMode, PinClick};
use piforge_shared::{BoardModel, ComponentKind, ComponentType, PinRef, Position, Wire};
use std::cell::Cell;

/// The canvas a user builds circuits on.
///
/// Every register mutation (mode changes included) and every structural edit marks the
/// workbench dirty; the next render pass re-resolves every component, not just the ones
/// wired to the changed pin.
#[derive(Debug)]
pub struct Workbench {
    circuit: Circuit,
    controller: InteractionController,
    dirty: Cell<bool>,
    /// Bank revision the last render was taken at.
    seen_revision: Cell<u64>,
}

impl Workbench {
    pub fn new(model: BoardModel, bank: &RegisterBank) -> Self {
        Self {
            circuit: Circuit::new(model),
            controller: InteractionController::new(),
            dirty: Cell::new(true),
            seen_revision: Cell::new(bank.revision()),
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    fn touch(&self) {
        self.dirty.set(true);
    }

    /// Whether a render is due against `bank`. Reading clears the flag.
    pub fn take_dirty(&self, bank: &RegisterBank) -> bool {
        let revision = bank.revision();
        let bank_changed = self.seen_revision.replace(revision) != revision;
        self.dirty.replace(false) || bank_changed
    }

    pub fn select_tool(&mut self, mode: InteractionMode) {
        self.controller.set_mode(mode);
        self.touch();
    }

    pub fn set_board_model(&mut self, model: BoardModel) {
        self.circuit.set_board_model(model);
        self.touch();
    }

    pub fn place(&mut self, component_type: ComponentType, at: Position) -> String {
        self.touch();
        self.circuit.place(component_type, at)
    }

    pub fn set_properties(&mut self, id: &str, kind: ComponentKind) -> Result<(), CircuitError> {
        self.circuit.set_properties(id, kind)?;
        self.touch();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.controller.click_canvas();
        self.circuit.clear();
        self.touch();
    }

    pub fn click_pin(&mut self, pin: PinRef, at: Position) -> PinClick {
        let outcome = self.controller.click_pin(&mut self.circuit, pin, at);
        if outcome != PinClick::Ignored {
            self.touch();
        }
        outcome
    }

    pub fn pointer_down_on_component(&mut self, id: &str, at: Position) -> bool {
        self.controller
            .pointer_down_on_body(DragTarget::Component(id.to_string()), at)
    }

    pub fn pointer_down_on_board(&mut self, at: Position) -> bool {
        self.controller.pointer_down_on_body(DragTarget::Board, at)
    }

    pub fn pointer_move(&mut self, at: Position) {
        if self.controller.draft().is_some() || self.controller.is_dragging() {
            self.touch();
        }
        self.controller.pointer_move(&mut self.circuit, at);
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn click_delete(&mut self, component_id: &str) -> Option<Vec<Wire>> {
        let removed = self.controller.click_delete(&mut self.circuit, component_id)?;
        self.touch();
        Some(removed)
    }

    pub fn click_wire(&mut self, wire_id: &str) -> Option<Wire> {
        let removed = self.controller.click_wire(&mut self.circuit, wire_id)?;
        self.touch();
        Some(removed)
    }

    pub fn click_canvas(&mut self) {
        self.controller.click_canvas();
        self.touch();
    }

    /// Press (or release) a button on the canvas. Returns how many input pins it drove.
    pub fn press_button(&mut self, id: &str, pressed: bool, bank: &mut RegisterBank) -> usize {
        let is_button = self
            .circuit
            .component(id)
            .is_some_and(|c| c.component_type() == ComponentType::Button);
        if !is_button {
            return 0;
        }
        resolver::press_button(self.circuit.wires(), bank, id, pressed)
    }

    pub fn reading(&self, id: &str, bank: &RegisterBank) -> Option<ComponentReading> {
        let component = self.circuit.component(id)?;
        Some(resolver::read_component(self.circuit.wires(), bank, component))
    }

    /// One render pass: the reading of every component, in placement order.
    pub fn readings(&self, bank: &RegisterBank) -> Vec<(String, ComponentReading)> {
        self.circuit
            .components()
            .iter()
            .map(|c| (c.id.clone(), resolver::read_component(self.circuit.wires(), bank, c)))
            .collect()
    }

    /// Level seen by a component id, placed or not.
    pub fn level(&self, id: &str, bank: &RegisterBank) -> f32 {
        resolver::resolve_level(self.circuit.wires(), bank, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piforge_shared::PinMode;

    #[test]
    fn test_pin_changes_mark_dirty() {
        let mut bank = RegisterBank::new();
        let bench = Workbench::new(BoardModel::RPi5, &bank);
        assert!(bench.take_dirty(&bank));
        assert!(!bench.take_dirty(&bank));

        bank.digital_write(26, 1);
        assert!(!bench.take_dirty(&bank));
        bank.set_mode(26, PinMode::Out);
        assert!(bench.take_dirty(&bank));
        bank.digital_write(26, 1);
        assert!(bench.take_dirty(&bank));
        assert!(!bench.take_dirty(&bank));
        assert_eq!(bank.listener_count(0), 0);
    }

    #[test]
    fn test_mode_change_alone_invalidates_render() {
        let mut bank = RegisterBank::new();
        let mut bench = Workbench::new(BoardModel::RPi4B, &bank);
        let led = bench.place(ComponentType::Led, Position::default());
        bench.select_tool(InteractionMode::Wire);
        bench.click_pin(PinRef::new(&led, "p1"), Position::default());
        bench.click_pin(PinRef::host(17), Position::default());
        bank.set_mode(17, PinMode::Out);
        bank.digital_write(17, 1);
        assert_eq!(bench.level(&led, &bank), 1.0);
        assert!(bench.take_dirty(&bank));

        bank.set_mode(17, PinMode::In);
        assert_eq!(bench.level(&led, &bank), 0.0);
        assert!(bench.take_dirty(&bank));
    }

    #[test]
    fn test_press_button_ignores_other_parts() {
        let mut bank = RegisterBank::new();
        let mut bench = Workbench::new(BoardModel::RPi4B, &bank);
        let led = bench.place(ComponentType::Led, Position::default());
        bench.select_tool(InteractionMode::Wire);
        bench.click_pin(PinRef::new(&led, "p1"), Position::default());
        bench.click_pin(PinRef::host(6), Position::default());
        assert_eq!(bench.press_button(&led, true, &mut bank), 0);
        assert_eq!(bank.digital_read(6), 0);
    }
}
