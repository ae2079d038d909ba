pub mod event_system;
pub mod pin_events;
