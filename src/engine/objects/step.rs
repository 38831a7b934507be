use serde::{Deserialize, Serialize};

use crate::surface::Surface;
use crate::types::Style;

use super::route::{self, Route};
use super::{Draw, Entity};

fn default_packet() -> char {
    '●'
}

/// A packet travelling from one entity to another over
/// `[start_ms, start_ms + duration_ms)` of timeline time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationStep {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub start_ms: u64,
    pub duration_ms: u64,
    #[serde(default = "default_packet")]
    pub packet: char,
    /// Shown next to the packet while it travels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: Style,
    /// Resolved by `Engine::setup` once every entity is known.
    #[serde(skip)]
    route: Route,
}

impl AnimationStep {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        AnimationStep {
            from: from.into(),
            to: to.into(),
            start_ms: 0,
            duration_ms: 1000,
            packet: default_packet(),
            label: None,
            style: Style::default(),
            route: Route::new(),
        }
    }

    pub fn at(mut self, start_ms: u64) -> Self {
        self.start_ms = start_ms;
        self
    }

    pub fn lasting(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn packet(mut self, packet: char) -> Self {
        self.packet = packet;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }

    pub fn is_active(&self, timeline_ms: u64) -> bool {
        timeline_ms >= self.start_ms && timeline_ms < self.end_ms()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub(crate) fn resolve(&mut self, from: &Entity, to: &Entity) {
        let (start, end) = route::anchors(from, to);
        self.route = route::route(start, end);
    }

    /// Index into the route of the packet at the given time, linearly
    /// interpolated and rounded.
    pub fn packet_index(&self, timeline_ms: u64) -> Option<usize> {
        if !self.is_active(timeline_ms) || self.route.is_empty() {
            return None;
        }
        let last = self.route.len() - 1;
        let progress = (timeline_ms - self.start_ms) as f64 / self.duration_ms as f64;
        Some(((last as f64) * progress).round() as usize)
    }
}

impl Draw for AnimationStep {
    fn draw(&self, timeline_ms: u64, surface: &mut Surface) {
        let Some(index) = self.packet_index(timeline_ms) else {
            return;
        };

        let trail = Style {
            dim: true,
            ..self.style.clone()
        };
        for cell in &self.route {
            surface.put(cell.x, cell.y, cell.ch, &trail);
        }

        let head = self.route[index];
        let packet = Style {
            bold: true,
            ..self.style.clone()
        };
        surface.put(head.x, head.y, self.packet, &packet);
        if let Some(label) = &self.label {
            surface.print(head.x.saturating_add(2), head.y, label, &self.style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> AnimationStep {
        let a = Entity::new("a", 0, 0).size(3, 3);
        let b = Entity::new("b", 9, 0).size(3, 3);
        let mut step = AnimationStep::new("a", "b").at(1000).lasting(500);
        step.resolve(&a, &b);
        step
    }

    #[test]
    fn packet_travels_the_route() {
        let step = resolved();
        // anchors (3,1) and (8,1): six cells
        assert_eq!(step.route().len(), 6);

        assert_eq!(step.packet_index(999), None);
        assert_eq!(step.packet_index(1000), Some(0));
        assert_eq!(step.packet_index(1250), Some(3));
        assert_eq!(step.packet_index(1499), Some(5));
        assert_eq!(step.packet_index(1500), None);
    }

    #[test]
    fn draws_trail_and_packet_only_while_active() {
        let step = resolved();
        let mut surface = Surface::new(12, 3);

        step.draw(0, &mut surface);
        assert_eq!(surface.cell(3, 1).unwrap().ch, ' ');

        step.draw(1000, &mut surface);
        let head = surface.cell(3, 1).unwrap();
        assert_eq!(head.ch, '●');
        assert!(head.style.bold);
        let trail = surface.cell(5, 1).unwrap();
        assert_eq!(trail.ch, '─');
        assert!(trail.style.dim);
    }

    #[test]
    fn unresolved_step_draws_nothing() {
        let step = AnimationStep::new("a", "b");
        assert_eq!(step.packet_index(10), None);
    }
}
