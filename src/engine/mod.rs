//! Engine: holds the registered renderable items and their timeline.
//!
//! An animation definition registers entities, information overlays and
//! animation steps into the engine. Once registration is complete the
//! renderer calls [`Engine::setup`] to resolve step routes, then repeatedly
//! [`Engine::render`] to advance the timeline and draw onto the attached
//! surface.
//!
//! The engine never deals with terminals or frame pacing.

pub mod objects;

use std::collections::HashSet;

use tracing::debug;

use crate::error::EngineError;
use crate::surface::SharedSurface;
use objects::{AnimationStep, Draw, Entity, Information};

#[derive(Debug, Default)]
pub struct Engine {
    entities: Vec<Entity>,
    information: Vec<Information>,
    steps: Vec<AnimationStep>,
    surface: Option<SharedSurface>,
    timeline_ms: u64,
    looping: bool,
    prepared: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn add_entity(&mut self, entity: Entity) -> &mut Self {
        self.entities.push(entity);
        self
    }

    pub fn add_information(&mut self, information: Information) -> &mut Self {
        self.information.push(information);
        self
    }

    /// Register a packet moving between two entities.
    pub fn animate(&mut self, step: AnimationStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Restart the timeline after the last step has finished.
    pub fn set_looping(&mut self, looping: bool) -> &mut Self {
        self.looping = looping;
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn information(&self) -> &[Information] {
        &self.information
    }

    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.entities.len() + self.information.len() + self.steps.len()
    }

    /// True once at least one renderable item is registered.
    pub fn is_ready(&self) -> bool {
        self.item_count() > 0
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn timeline_ms(&self) -> u64 {
        self.timeline_ms
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// End of the last animation step, or 0 with no steps.
    pub fn sequence_end_ms(&self) -> u64 {
        self.steps.iter().map(AnimationStep::end_ms).max().unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn set_surface(&mut self, surface: SharedSurface) {
        self.surface = Some(surface);
    }

    pub fn detach_surface(&mut self) -> Option<SharedSurface> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&SharedSurface> {
        self.surface.as_ref()
    }

    /// Second-phase preparation, run after registration is complete:
    /// checks entity names and resolves every step's route.
    pub fn setup(&mut self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(EngineError::DuplicateEntity(entity.name.clone()));
            }
        }

        for (index, step) in self.steps.iter_mut().enumerate() {
            let from = find(&self.entities, &step.from, index)?;
            let to = find(&self.entities, &step.to, index)?;
            step.resolve(from, to);
        }

        self.timeline_ms = 0;
        self.prepared = true;
        debug!(
            entities = self.entities.len(),
            information = self.information.len(),
            steps = self.steps.len(),
            end_ms = self.sequence_end_ms(),
            "Engine prepared"
        );
        Ok(())
    }

    /// Advance the timeline by `elapsed_ms` and draw every item onto the
    /// attached surface: entities first, then steps, then information, each
    /// in registration order. Without a surface only the timeline moves.
    pub fn render(&mut self, elapsed_ms: u64) {
        self.timeline_ms = self.timeline_ms.saturating_add(elapsed_ms);
        let end = self.sequence_end_ms();
        if self.looping && end > 0 {
            self.timeline_ms %= end;
        }

        let Some(surface) = &self.surface else {
            return;
        };
        let mut surface = surface.borrow_mut();
        let t = self.timeline_ms;

        for entity in &self.entities {
            entity.draw(t, &mut surface);
        }
        if self.prepared {
            for step in &self.steps {
                step.draw(t, &mut surface);
            }
        }
        for information in &self.information {
            information.draw(t, &mut surface);
        }
    }
}

fn find<'a>(entities: &'a [Entity], name: &str, step: usize) -> Result<&'a Entity, EngineError> {
    entities
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| EngineError::UnknownEntity {
            step,
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn pipeline() -> Engine {
        let mut engine = Engine::new();
        engine
            .add_entity(Entity::new("a", 0, 0).size(3, 3))
            .add_entity(Entity::new("b", 9, 0).size(3, 3))
            .animate(AnimationStep::new("a", "b").at(0).lasting(500));
        engine
    }

    #[test]
    fn readiness_follows_registration() {
        let mut engine = Engine::new();
        assert!(!engine.is_ready());

        engine.add_information(Information::new("hello", 0, 0));
        assert!(engine.is_ready());
        assert_eq!(engine.item_count(), 1);

        engine.add_entity(Entity::new("a", 0, 0));
        engine.render(16);
        engine.setup().unwrap();
        assert_eq!(engine.item_count(), 2);
    }

    #[test]
    fn render_without_items_or_surface_is_a_no_op() {
        let mut engine = Engine::new();
        engine.render(16);
        assert_eq!(engine.timeline_ms(), 16);

        let surface = Surface::new(4, 2).shared();
        engine.set_surface(surface.clone());
        engine.render(16);
        assert_eq!(*surface.borrow(), Surface::new(4, 2));
    }

    #[test]
    fn setup_resolves_routes() {
        let mut engine = pipeline();
        assert!(engine.steps()[0].route().is_empty());
        engine.setup().unwrap();
        assert!(engine.is_prepared());
        assert_eq!(engine.steps()[0].route().len(), 6);
    }

    #[test]
    fn setup_rejects_unknown_and_duplicate_entities() {
        let mut engine = pipeline();
        engine.animate(AnimationStep::new("a", "missing"));
        assert_eq!(
            engine.setup(),
            Err(EngineError::UnknownEntity {
                step: 1,
                name: "missing".into()
            })
        );

        let mut engine = pipeline();
        engine.add_entity(Entity::new("a", 20, 0));
        assert_eq!(
            engine.setup(),
            Err(EngineError::DuplicateEntity("a".into()))
        );
    }

    #[test]
    fn render_draws_entities_and_moving_packet() {
        let surface = Surface::new(12, 3).shared();
        let mut engine = pipeline();
        engine.set_surface(surface.clone());
        engine.setup().unwrap();

        engine.render(0);
        assert_eq!(surface.borrow().cell(0, 0).unwrap().ch, '┌');
        assert_eq!(surface.borrow().cell(3, 1).unwrap().ch, '●');

        engine.render(250);
        assert_eq!(surface.borrow().cell(6, 1).unwrap().ch, '●');
    }

    #[test]
    fn looping_timeline_wraps_at_sequence_end() {
        let mut engine = pipeline();
        engine.setup().unwrap();
        engine.render(600);
        assert_eq!(engine.timeline_ms(), 600);

        let mut engine = pipeline();
        engine.set_looping(true).setup().unwrap();
        engine.render(600);
        assert_eq!(engine.timeline_ms(), 100);
    }
}
