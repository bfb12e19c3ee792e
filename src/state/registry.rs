//! Fixed roster of nodes and the observable state each one renders.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// LED color pushed to a node, serialized as a `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<u8>)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// LEDs off; the idle color.
    pub const OFF: Rgb = Rgb([0, 0, 0]);
    /// Node pressed during the current round.
    pub const RED: Rgb = Rgb([255, 0, 0]);
    /// Round succeeded.
    pub const GREEN: Rgb = Rgb([0, 255, 0]);
}

/// Per-node state, reset in place between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeState {
    /// Whether the node reported a press during the current round.
    pub pressed: bool,
    /// Color the node should currently display.
    pub color: Rgb,
}

/// Mapping from configured node identifier to its state, in configured order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<String, NodeState>,
}

impl NodeRegistry {
    /// Build a registry with every node idle (not pressed, LEDs off).
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes = ids
            .into_iter()
            .map(|id| (id.into(), NodeState::default()))
            .collect();
        Self { nodes }
    }

    /// State of `id`, if configured.
    pub fn get(&self, id: &str) -> Option<&NodeState> {
        self.nodes.get(id)
    }

    /// Mutable state of `id`, if configured.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut NodeState> {
        self.nodes.get_mut(id)
    }

    /// Whether `id` is part of the roster.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of configured nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes whose pressed flag is set.
    pub fn pressed_count(&self) -> usize {
        self.nodes.values().filter(|node| node.pressed).count()
    }

    /// Paint every node with the same color, leaving pressed flags untouched.
    pub fn paint_all(&mut self, color: Rgb) {
        for node in self.nodes.values_mut() {
            node.color = color;
        }
    }

    /// Return every node to idle.
    pub fn clear_all(&mut self) {
        for node in self.nodes.values_mut() {
            *node = NodeState::default();
        }
    }

    /// Nodes in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeState)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_starts_idle_in_configured_order() {
        let registry = NodeRegistry::new(["pico3", "pico1", "pico2"]);
        let ids: Vec<_> = registry.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["pico3", "pico1", "pico2"]);
        assert!(
            registry
                .iter()
                .all(|(_, node)| !node.pressed && node.color == Rgb::OFF)
        );
    }

    #[test]
    fn clear_all_resets_flags_and_colors() {
        let mut registry = NodeRegistry::new(["a", "b"]);
        let node = registry.get_mut("a").unwrap();
        node.pressed = true;
        node.color = Rgb::RED;
        registry.paint_all(Rgb::GREEN);
        assert_eq!(registry.pressed_count(), 1);
        assert_eq!(registry.get("b").unwrap().color, Rgb::GREEN);

        registry.clear_all();
        assert_eq!(registry.pressed_count(), 0);
        assert!(registry.iter().all(|(_, node)| node.color == Rgb::OFF));
    }

    #[test]
    fn rgb_serializes_as_array() {
        let json = serde_json::to_string(&Rgb::GREEN).unwrap();
        assert_eq!(json, "[0,255,0]");
    }
}
