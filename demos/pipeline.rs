//! A data-flow animation written in Rust rather than JSON.
//!
//! Run with: cargo run --example pipeline

use anyhow::Result;

use dataflow_animation::{
    Animation, ConfigStore, Dataflow, Engine, Renderer,
    backend::TerminalBackend,
    engine::objects::{AnimationStep, Entity, Information},
    types::{Color, NamedColor, Style},
};

struct OrderPipeline {
    stages: Vec<&'static str>,
}

impl Dataflow for OrderPipeline {
    fn setup(&mut self, engine: &mut Engine) -> Result<()> {
        let accent = Style {
            fg: Some(Color::Named(NamedColor::Cyan)),
            bold: true,
            ..Default::default()
        };

        for (i, stage) in self.stages.iter().enumerate() {
            engine.add_entity(Entity::new(*stage, 2 + i as u16 * 18, 3).style(accent.clone()));
        }

        let mut start = 0;
        for pair in self.stages.windows(2) {
            engine.animate(
                AnimationStep::new(pair[0], pair[1])
                    .at(start)
                    .lasting(800)
                    .label("order"),
            );
            engine.add_information(
                Information::new(format!("{} -> {}", pair[0], pair[1]), 2, 10)
                    .between(start, start + 800)
                    .style(Style::fg(Color::Named(NamedColor::Yellow))),
            );
            start += 1000;
        }

        engine.set_looping(true);
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut renderer = Renderer::new(TerminalBackend::new(), ConfigStore::new());
    renderer.set_animation(Some(Animation::new(OrderPipeline {
        stages: vec!["web", "orders", "billing", "shipping"],
    })))?;
    renderer.run()?;
    Ok(())
}
