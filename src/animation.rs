//! Animation definitions.
//!
//! A [`Dataflow`] is user code that knows how to register its renderable
//! items into an [`Engine`]. An [`Animation`] pairs one definition with the
//! engine it populates; the renderer only ever talks to the pair.

use std::fmt;

use anyhow::Result;

use crate::engine::Engine;

/// The structure of a data-flow animation script.
///
/// `setup` may be called many times over the life of a session (once per
/// rebuild), always against a freshly created engine that already has the
/// current surface attached.
pub trait Dataflow {
    fn setup(&mut self, engine: &mut Engine) -> Result<()>;
}

impl<F> Dataflow for F
where
    F: FnMut(&mut Engine) -> Result<()>,
{
    fn setup(&mut self, engine: &mut Engine) -> Result<()> {
        self(engine)
    }
}

pub struct Animation {
    definition: Box<dyn Dataflow>,
    engine: Engine,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Animation {
    pub fn new(definition: impl Dataflow + 'static) -> Self {
        Animation {
            definition: Box::new(definition),
            engine: Engine::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn setup(&mut self) -> Result<()> {
        self.definition.setup(&mut self.engine)
    }

    /// Swap in an empty engine so the next `setup` starts from scratch.
    pub(crate) fn reset_engine(&mut self) {
        self.engine = Engine::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::objects::Entity;

    #[test]
    fn closures_are_definitions() {
        let mut animation = Animation::new(|engine: &mut Engine| -> Result<()> {
            engine.add_entity(Entity::new("a", 0, 0));
            Ok(())
        });
        assert!(!animation.engine().is_ready());

        animation.setup().unwrap();
        assert!(animation.engine().is_ready());

        animation.reset_engine();
        assert!(!animation.engine().is_ready());
        animation.setup().unwrap();
        assert_eq!(animation.engine().item_count(), 1);
    }
}
