// Integration tests for the modal gesture protocol

use piforge::circuit::Circuit;
use piforge::interaction::{DragTarget, InteractionController, InteractionMode, PinClick};
use piforge::{BoardModel, ComponentType, PinRef, Position};

fn setup() -> (Circuit, InteractionController, String, String) {
    let mut circuit = Circuit::new(BoardModel::RPi4B);
    let led = circuit.place(ComponentType::Led, Position::new(10.0, 10.0));
    let res = circuit.place(ComponentType::Resistor, Position::new(60.0, 10.0));
    (circuit, InteractionController::new(), led, res)
}

#[test]
fn test_default_mode_is_drag() {
    let ctl = InteractionController::new();
    assert_eq!(ctl.mode(), InteractionMode::Drag);
    assert!(ctl.draft().is_none());
}

#[test]
fn test_reclicking_origin_cancels_draft() {
    let (mut circuit, mut ctl, led, _) = setup();
    ctl.set_mode(InteractionMode::Wire);
    let a = PinRef::new(&led, "p1");
    assert_eq!(ctl.click_pin(&mut circuit, a.clone(), Position::default()), PinClick::DraftStarted);
    assert_eq!(ctl.click_pin(&mut circuit, a, Position::default()), PinClick::DraftCancelled);
    assert!(circuit.wires().is_empty());
    assert!(ctl.draft().is_none());
}

#[test]
fn test_two_clicks_commit_one_wire() {
    let (mut circuit, mut ctl, led, res) = setup();
    ctl.set_mode(InteractionMode::Wire);
    let a = PinRef::new(&led, "p2");
    let b = PinRef::new(&res, "p1");
    ctl.click_pin(&mut circuit, a.clone(), Position::default());
    let outcome = ctl.click_pin(&mut circuit, b.clone(), Position::default());
    assert!(matches!(outcome, PinClick::Committed { .. }));

    assert_eq!(circuit.wires().len(), 1);
    let wire = &circuit.wires()[0];
    assert_eq!(wire.from_ref(), a);
    assert_eq!(wire.to_ref(), b);
    assert!(wire.id.starts_with("wire-"));
    assert!(ctl.draft().is_none());
}

#[test]
fn test_switching_to_drag_discards_draft() {
    let (mut circuit, mut ctl, led, res) = setup();
    ctl.set_mode(InteractionMode::Wire);
    ctl.click_pin(&mut circuit, PinRef::new(&led, "p1"), Position::default());
    ctl.set_mode(InteractionMode::Drag);
    assert!(ctl.draft().is_none());

    // The second click of the old sequence does nothing in DRAG mode...
    assert_eq!(
        ctl.click_pin(&mut circuit, PinRef::new(&res, "p1"), Position::default()),
        PinClick::Ignored
    );
    // ...and back in WIRE mode it only starts a fresh draft.
    ctl.set_mode(InteractionMode::Wire);
    assert_eq!(
        ctl.click_pin(&mut circuit, PinRef::new(&res, "p1"), Position::default()),
        PinClick::DraftStarted
    );
    assert!(circuit.wires().is_empty());
}

#[test]
fn test_invalid_second_pin_is_rejected() {
    let (mut circuit, mut ctl, led, _) = setup();
    ctl.set_mode(InteractionMode::Wire);
    ctl.click_pin(&mut circuit, PinRef::new(&led, "p1"), Position::default());
    let outcome = ctl.click_pin(&mut circuit, PinRef::host(40), Position::default());
    assert!(matches!(outcome, PinClick::Rejected(_)));
    assert!(circuit.wires().is_empty());
    assert!(ctl.draft().is_none());

    // Outcomes are plain values a caller can keep around.
    let kept = outcome.clone();
    assert_eq!(kept, outcome);
}

#[test]
fn test_erase_mode_removes_wires_only_there() {
    let (mut circuit, mut ctl, led, res) = setup();
    let id = circuit
        .connect(PinRef::new(&led, "p2"), PinRef::new(&res, "p1"))
        .unwrap();

    assert!(ctl.click_wire(&mut circuit, &id).is_none());
    ctl.set_mode(InteractionMode::Wire);
    assert!(ctl.click_wire(&mut circuit, &id).is_none());
    assert_eq!(
        ctl.click_pin(&mut circuit, PinRef::new(&led, "p1"), Position::default()),
        PinClick::DraftStarted
    );

    ctl.set_mode(InteractionMode::Erase);
    assert!(ctl.draft().is_none());
    assert_eq!(
        ctl.click_pin(&mut circuit, PinRef::new(&led, "p1"), Position::default()),
        PinClick::Ignored
    );
    assert_eq!(ctl.click_wire(&mut circuit, &id).map(|w| w.id), Some(id.clone()));
    assert!(ctl.click_wire(&mut circuit, &id).is_none());
}

#[test]
fn test_board_drag() {
    let (mut circuit, mut ctl, _, _) = setup();
    assert!(ctl.pointer_down_on_body(DragTarget::Board, Position::new(0.0, 0.0)));
    ctl.pointer_move(&mut circuit, Position::new(-20.0, 15.0));
    ctl.pointer_up();
    assert_eq!(circuit.board().position, Position::new(80.0, 115.0));
    assert!(!ctl.is_dragging());
}

#[test]
fn test_erase_bodies_are_not_draggable() {
    let (mut circuit, mut ctl, led, _) = setup();
    ctl.set_mode(InteractionMode::Erase);
    assert!(!ctl.pointer_down_on_body(DragTarget::Component(led.clone()), Position::default()));
    ctl.pointer_move(&mut circuit, Position::new(40.0, 40.0));
    assert_eq!(circuit.component(&led).unwrap().position, Position::new(10.0, 10.0));
}
