// src/circuit/resolver.rs - Maps the wiring graph onto the register bank
//
// Everything here is a pure function of (wires, bank). Nothing is cached: the workbench
// re-resolves every component whenever any pin changes.

use crate::circuit::Component;
use crate::hardware::RegisterBank;
use piforge_shared::{ComponentKind, PinMode, Wire};

/// Level a component sees through its wires, in `0.0..=1.0`.
///
/// Wires are scanned in creation order; the first one whose far end is a host pin in
/// mode OUT (digital value) or PWM with a duty cycle (duty / 100) decides. Host pins in
/// mode IN contribute nothing. No contributing wire means 0.
pub fn resolve_level(wires: &[Wire], bank: &RegisterBank, component_id: &str) -> f32 {
    for wire in wires.iter().filter(|w| w.touches(component_id)) {
        let Some(pin) = wire.host_pin_facing(component_id) else {
            continue;
        };
        let Some(state) = bank.pin_state(pin) else {
            continue;
        };
        match (state.mode, state.duty_cycle) {
            (PinMode::Out, _) => return f32::from(state.value),
            (PinMode::Pwm, Some(duty)) => return f32::from(duty) / 100.0,
            _ => {}
        }
    }
    0.0
}

/// The first host GPIO wired directly to `component_id`, in wire creation order.
pub fn first_host_pin(wires: &[Wire], component_id: &str) -> Option<u8> {
    wires
        .iter()
        .filter(|w| w.touches(component_id))
        .find_map(|w| w.host_pin_facing(component_id))
}

/// Value of the first host pin wired to a button, or 0 when it is not wired to the host.
pub fn button_state(wires: &[Wire], bank: &RegisterBank, component_id: &str) -> u8 {
    first_host_pin(wires, component_id).map_or(0, |pin| bank.digital_read(pin))
}

/// Press or release a button: every host pin wired to it that is currently an input is
/// driven to 1 / 0. Pins in any other mode are left alone. Returns how many pins were driven.
pub fn press_button(
    wires: &[Wire],
    bank: &mut RegisterBank,
    component_id: &str,
    pressed: bool,
) -> usize {
    let pins: Vec<u8> = wires
        .iter()
        .filter(|w| w.touches(component_id))
        .filter_map(|w| w.host_pin_facing(component_id))
        .filter(|pin| bank.pin_state(*pin).is_some_and(|s| s.mode == PinMode::In))
        .collect();
    for pin in &pins {
        bank.drive_input(*pin, u8::from(pressed));
    }
    tracing::debug!(
        "Button {} {} ({} input pin(s))",
        component_id,
        if pressed { "pressed" } else { "released" },
        pins.len()
    );
    pins.len()
}

/// What a placed part currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentReading {
    Led { brightness: f32 },
    Buzzer { level: f32 },
    Servo { angle: f32 },
    Button { pressed: bool },
    Passive,
}

pub fn read_component(wires: &[Wire], bank: &RegisterBank, component: &Component) -> ComponentReading {
    let id = component.id.as_str();
    match &component.kind {
        ComponentKind::Led { .. } => ComponentReading::Led {
            brightness: resolve_level(wires, bank, id),
        },
        ComponentKind::Buzzer { .. } => ComponentReading::Buzzer {
            level: resolve_level(wires, bank, id),
        },
        ComponentKind::Servo { min_angle, max_angle } => {
            let level = resolve_level(wires, bank, id);
            ComponentReading::Servo {
                angle: min_angle + level * (max_angle - min_angle),
            }
        }
        ComponentKind::Button => ComponentReading::Button {
            pressed: button_state(wires, bank, id) == 1,
        },
        ComponentKind::Resistor { .. }
        | ComponentKind::Breadboard
        | ComponentKind::Potentiometer { .. }
        | ComponentKind::Oled { .. } => ComponentReading::Passive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piforge_shared::{PinRef, WireColor};

    fn wire(from: PinRef, to: PinRef) -> Wire {
        Wire::new("wire-test", from, to, WireColor::Red)
    }

    #[test]
    fn test_unwired_component_is_dark() {
        let mut bank = RegisterBank::new();
        bank.set_mode(17, PinMode::Out);
        bank.digital_write(17, 1);
        let wires = vec![wire(PinRef::host(17), PinRef::new("lit", "p1"))];
        assert_eq!(resolve_level(&wires, &bank, "lit"), 1.0);
        assert_eq!(resolve_level(&wires, &bank, "dark"), 0.0);
    }

    #[test]
    fn test_pwm_level_is_fraction() {
        let mut bank = RegisterBank::new();
        bank.set_mode(18, PinMode::Pwm);
        bank.set_pwm(18, 40);
        let wires = vec![wire(PinRef::new("led", "p1"), PinRef::host(18))];
        assert!((resolve_level(&wires, &bank, "led") - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pwm_without_duty_does_not_contribute() {
        let mut bank = RegisterBank::new();
        bank.set_mode(12, PinMode::Pwm);
        bank.set_mode(13, PinMode::Out);
        bank.digital_write(13, 1);
        let wires = vec![
            wire(PinRef::host(12), PinRef::new("led", "p1")),
            wire(PinRef::host(13), PinRef::new("led", "p2")),
        ];
        assert_eq!(resolve_level(&wires, &bank, "led"), 1.0);
    }

    #[test]
    fn test_first_contributing_wire_wins() {
        let mut bank = RegisterBank::new();
        bank.set_mode(5, PinMode::Out);
        bank.set_mode(6, PinMode::Out);
        bank.digital_write(6, 1);
        let wires = vec![
            wire(PinRef::host(5), PinRef::new("led", "p1")),
            wire(PinRef::host(6), PinRef::new("led", "p2")),
        ];
        assert_eq!(resolve_level(&wires, &bank, "led"), 0.0);
    }

    #[test]
    fn test_button_drives_only_inputs() {
        let mut bank = RegisterBank::new();
        bank.set_mode(22, PinMode::Out);
        let wires = vec![
            wire(PinRef::new("btn", "p1"), PinRef::host(23)),
            wire(PinRef::new("btn", "p2"), PinRef::host(22)),
        ];
        assert_eq!(press_button(&wires, &mut bank, "btn", true), 1);
        assert_eq!(bank.digital_read(23), 1);
        assert_eq!(bank.digital_read(22), 0);
        assert_eq!(button_state(&wires, &bank, "btn"), 1);

        press_button(&wires, &mut bank, "btn", false);
        assert_eq!(button_state(&wires, &bank, "btn"), 0);
        assert_eq!(button_state(&wires, &bank, "loose"), 0);
    }

    #[test]
    fn test_servo_angle_follows_level() {
        let mut bank = RegisterBank::new();
        bank.set_mode(18, PinMode::Pwm);
        bank.set_pwm(18, 50);
        let servo = Component {
            id: "servo".to_string(),
            kind: ComponentKind::Servo { min_angle: 0.0, max_angle: 180.0 },
            position: Default::default(),
        };
        let wires = vec![wire(PinRef::host(18), PinRef::new("servo", "p3"))];
        assert_eq!(
            read_component(&wires, &bank, &servo),
            ComponentReading::Servo { angle: 90.0 }
        );
    }
}
