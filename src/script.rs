//! Script animations: a `Dataflow` authored as a JSON file.
//!
//! The file is re-read on every `setup`, which is what makes live reload
//! work: edit the file, the watcher fires, the renderer rebuilds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::animation::Dataflow;
use crate::engine::Engine;
use crate::engine::objects::{AnimationStep, Entity, Information};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub information: Vec<Information>,
    #[serde(default)]
    pub steps: Vec<AnimationStep>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn register(self, engine: &mut Engine) {
        engine.set_looping(self.looping);
        for entity in self.entities {
            engine.add_entity(entity);
        }
        for information in self.information {
            engine.add_information(information);
        }
        for step in self.steps {
            engine.animate(step);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptAnimation {
    path: PathBuf,
}

impl ScriptAnimation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ScriptAnimation { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Dataflow for ScriptAnimation {
    fn setup(&mut self, engine: &mut Engine) -> Result<()> {
        Script::load(&self.path)?.register(engine);
        Ok(())
    }
}
