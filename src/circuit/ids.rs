// src/circuit/ids.rs - Component and wire id allocation
use uuid::Uuid;

/// Hands out `comp-…` / `wire-…` ids backed by random v4 uuids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_component_id(&mut self) -> String {
        self.next_with_prefix("comp")
    }

    pub fn next_wire_id(&mut self) -> String {
        self.next_with_prefix("wire")
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }

    fn next_with_prefix(&mut self, prefix: &str) -> String {
        self.issued += 1;
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let mut ids = IdAllocator::new();
        let comp = ids.next_component_id();
        let wire = ids.next_wire_id();
        assert!(comp.starts_with("comp-"));
        assert!(wire.starts_with("wire-"));
        assert_eq!(comp.len(), "comp-".len() + 32);

        let many: HashSet<String> = (0..500).map(|_| ids.next_component_id()).collect();
        assert_eq!(many.len(), 500);
        assert_eq!(ids.issued(), 502);
    }
}
