//! Configuration store: display and rendering parameters.
//!
//! The store is owned by the renderer and handed around explicitly. It builds
//! its [`Config`] lazily on first access and keeps returning that same
//! instance until [`ConfigStore::reset`] or [`ConfigStore::reload`] discards
//! it, so every rebuild of an animation starts from freshly read values.
//!
//! Values are layered: defaults, then an optional JSON file, then
//! `DATAFLOW_*` environment variables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::types::{Color, Geometry};

pub const ENV_X: &str = "DATAFLOW_X";
pub const ENV_Y: &str = "DATAFLOW_Y";
pub const ENV_WIDTH: &str = "DATAFLOW_WIDTH";
pub const ENV_HEIGHT: &str = "DATAFLOW_HEIGHT";
pub const ENV_BACKGROUND_COLOR: &str = "DATAFLOW_BACKGROUND_COLOR";
pub const ENV_FPS: &str = "DATAFLOW_FPS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    x: i32,
    y: i32,
    width: u16,
    height: u16,
    background_color: [u8; 3],
    fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            x: 0,
            y: 0,
            width: 600,
            height: 800,
            background_color: [0, 0, 0],
            fps: 60,
        }
    }
}

impl Config {
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn background_color(&self) -> [u8; 3] {
        self.background_color
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn background(&self) -> Color {
        let [r, g, b] = self.background_color;
        Color::rgb(r, g, b)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_width(&mut self, width: i64) -> Result<(), ConfigError> {
        self.width = dimension("width", width)?;
        Ok(())
    }

    pub fn set_height(&mut self, height: i64) -> Result<(), ConfigError> {
        self.height = dimension("height", height)?;
        Ok(())
    }

    /// All three components are validated before any is written.
    pub fn set_background_color(&mut self, r: i64, g: i64, b: i64) -> Result<(), ConfigError> {
        self.background_color = [
            component("background_color.r", r)?,
            component("background_color.g", g)?,
            component("background_color.b", b)?,
        ];
        Ok(())
    }

    pub fn set_fps(&mut self, fps: i64) -> Result<(), ConfigError> {
        if fps <= 0 || fps > u32::MAX as i64 {
            return Err(ConfigError::OutOfRange {
                field: "fps",
                value: fps,
                expected: "greater than 0",
            });
        }
        self.fps = fps as u32;
        Ok(())
    }
}

fn dimension(field: &'static str, value: i64) -> Result<u16, ConfigError> {
    if value <= 0 || value > u16::MAX as i64 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "between 1 and 65535",
        });
    }
    Ok(value as u16)
}

fn component(field: &'static str, value: i64) -> Result<u8, ConfigError> {
    u8::try_from(value).map_err(|_| ConfigError::OutOfRange {
        field,
        value,
        expected: "between 0 and 255",
    })
}

// ---------------------------------------------------------------------------
// Override sources
// ---------------------------------------------------------------------------

/// On-disk overrides. Every field is optional; absent fields keep the
/// default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    x: Option<i32>,
    y: Option<i32>,
    width: Option<i64>,
    height: Option<i64>,
    background_color: Option<[i64; 3]>,
    fps: Option<i64>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&self, config: &mut Config) {
        if self.x.is_some() || self.y.is_some() {
            config.set_position(self.x.unwrap_or(config.x), self.y.unwrap_or(config.y));
        }
        if let Some(width) = self.width {
            skip_invalid(config.set_width(width));
        }
        if let Some(height) = self.height {
            skip_invalid(config.set_height(height));
        }
        if let Some([r, g, b]) = self.background_color {
            skip_invalid(config.set_background_color(r, g, b));
        }
        if let Some(fps) = self.fps {
            skip_invalid(config.set_fps(fps));
        }
    }
}

fn skip_invalid(result: Result<(), ConfigError>) {
    if let Err(e) = result {
        warn!("Ignoring config override: {e}");
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

fn apply_env(lookup: &EnvLookup, config: &mut Config) {
    let int = |name: &'static str| -> Option<i64> {
        let raw = lookup(name)?;
        match raw.trim().parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                skip_invalid(Err(ConfigError::Malformed {
                    field: name,
                    value: raw,
                }));
                None
            }
        }
    };

    let position = |name: &'static str| -> Option<i32> {
        let value = int(name)?;
        let coordinate = i32::try_from(value).map_err(|_| ConfigError::OutOfRange {
            field: name,
            value,
            expected: "a 32-bit signed integer",
        });
        match coordinate {
            Ok(coordinate) => Some(coordinate),
            Err(e) => {
                skip_invalid(Err(e));
                None
            }
        }
    };
    let x = position(ENV_X);
    let y = position(ENV_Y);
    if x.is_some() || y.is_some() {
        config.set_position(x.unwrap_or(config.x), y.unwrap_or(config.y));
    }
    if let Some(width) = int(ENV_WIDTH) {
        skip_invalid(config.set_width(width));
    }
    if let Some(height) = int(ENV_HEIGHT) {
        skip_invalid(config.set_height(height));
    }
    if let Some(fps) = int(ENV_FPS) {
        skip_invalid(config.set_fps(fps));
    }
    if let Some(raw) = lookup(ENV_BACKGROUND_COLOR) {
        match parse_rgb(&raw) {
            Some([r, g, b]) => skip_invalid(config.set_background_color(r, g, b)),
            None => skip_invalid(Err(ConfigError::Malformed {
                field: ENV_BACKGROUND_COLOR,
                value: raw,
            })),
        }
    }
}

/// Parse `"r,g,b"`. Range checking is left to the setter.
fn parse_rgb(raw: &str) -> Option<[i64; 3]> {
    let mut parts = raw.split(',').map(|p| p.trim().parse::<i64>());
    let rgb = [parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?];
    if parts.next().is_some() {
        return None;
    }
    Some(rgb)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct ConfigStore {
    file: Option<PathBuf>,
    env: EnvLookup,
    current: Option<Config>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("file", &self.file)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Defaults overridden by the process environment.
    pub fn new() -> Self {
        Self::with_env(|name| std::env::var(name).ok())
    }

    /// Defaults only; nothing external is consulted.
    pub fn defaults() -> Self {
        Self::with_env(|_| None)
    }

    pub fn with_env(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        ConfigStore {
            file: None,
            env: Box::new(lookup),
            current: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self.current = None;
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// The live configuration, built on first access.
    pub fn get(&mut self) -> &Config {
        self.ensure()
    }

    /// Mutable access for field assignment. Setters validate, so a failed
    /// assignment leaves the live instance untouched.
    pub fn get_mut(&mut self) -> &mut Config {
        self.ensure()
    }

    /// Drop the live configuration; the next `get` rebuilds it.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn reload(&mut self) -> &Config {
        self.reset();
        self.ensure()
    }

    fn ensure(&mut self) -> &mut Config {
        if self.current.is_none() {
            let config = self.build();
            debug!(?config, "Configuration loaded");
            self.current = Some(config);
        }
        self.current.get_or_insert_with(Config::default)
    }

    fn build(&self) -> Config {
        let mut config = Config::default();
        if let Some(path) = &self.file {
            match ConfigFile::load(path) {
                Ok(file) => file.apply(&mut config),
                Err(e) => warn!("{e:#}, using defaults"),
            }
        }
        apply_env(&self.env, &mut config);
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> ConfigStore {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigStore::with_env(move |name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let mut store = ConfigStore::defaults();
        let config = store.get();
        assert_eq!((config.x(), config.y()), (0, 0));
        assert_eq!((config.width(), config.height()), (600, 800));
        assert_eq!(config.background_color(), [0, 0, 0]);
        assert_eq!(config.fps(), 60);
    }

    #[test]
    fn valid_assignments_are_observed() {
        let mut store = ConfigStore::defaults();
        let config = store.get_mut();
        config.set_position(-5, 12);
        config.set_width(1).unwrap();
        config.set_height(65535).unwrap();
        config.set_background_color(0, 128, 255).unwrap();
        config.set_fps(144).unwrap();

        let config = store.get();
        assert_eq!((config.x(), config.y()), (-5, 12));
        assert_eq!((config.width(), config.height()), (1, 65535));
        assert_eq!(config.background_color(), [0, 128, 255]);
        assert_eq!(config.fps(), 144);
    }

    #[test]
    fn out_of_range_assignment_fails_without_mutating() {
        let mut store = ConfigStore::defaults();
        let before = store.get().clone();

        let config = store.get_mut();
        assert!(matches!(
            config.set_width(-1),
            Err(ConfigError::OutOfRange { field: "width", .. })
        ));
        assert!(config.set_height(0).is_err());
        assert!(config.set_fps(0).is_err());
        assert!(config.set_fps(-60).is_err());
        assert!(config.set_background_color(10, 256, 10).is_err());
        assert!(config.set_background_color(-1, 0, 0).is_err());

        assert_eq!(store.get(), &before);
    }

    #[test]
    fn get_is_identity_stable_until_reset() {
        let mut store = ConfigStore::defaults();
        let first = store.get() as *const Config;
        let second = store.get() as *const Config;
        assert_eq!(first, second);

        store.get_mut().set_fps(30).unwrap();
        assert_eq!(store.get().fps(), 30);

        store.reset();
        assert_eq!(store.get().fps(), 60);
        assert_eq!(store.reload(), &Config::default());
    }

    #[test]
    fn environment_overrides_are_read_at_rebuild() {
        let mut store = env(&[
            (ENV_X, "10"),
            (ENV_WIDTH, "120"),
            (ENV_HEIGHT, "40"),
            (ENV_BACKGROUND_COLOR, "10, 20, 30"),
            (ENV_FPS, "30"),
        ]);
        let config = store.get();
        assert_eq!((config.x(), config.y()), (10, 0));
        assert_eq!((config.width(), config.height()), (120, 40));
        assert_eq!(config.background_color(), [10, 20, 30]);
        assert_eq!(config.fps(), 30);
    }

    #[test]
    fn invalid_overrides_are_skipped() {
        let mut store = env(&[
            (ENV_WIDTH, "-3"),
            (ENV_FPS, "fast"),
            (ENV_BACKGROUND_COLOR, "1,2"),
            (ENV_HEIGHT, "50"),
        ]);
        let config = store.get();
        assert_eq!(config.width(), 600);
        assert_eq!(config.fps(), 60);
        assert_eq!(config.background_color(), [0, 0, 0]);
        assert_eq!(config.height(), 50);
    }

    #[test]
    fn position_outside_i32_is_skipped() {
        let mut store = env(&[(ENV_X, "4294967296"), (ENV_Y, "-7")]);
        let config = store.get();
        assert_eq!((config.x(), config.y()), (0, -7));
    }

    #[test]
    fn file_overrides_then_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "width": 80, "height": 24, "fps": 30, "background_color": [5, 5, 5] }}"#
        )
        .unwrap();

        let mut store = env(&[(ENV_FPS, "15")]).with_file(file.path());
        let config = store.get();
        assert_eq!((config.width(), config.height()), (80, 24));
        assert_eq!(config.background_color(), [5, 5, 5]);
        assert_eq!(config.fps(), 15);
    }

    #[test]
    fn reload_picks_up_file_changes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{ "fps": 30 }"#).unwrap();

        let mut store = ConfigStore::defaults().with_file(file.path());
        assert_eq!(store.get().fps(), 30);

        std::fs::write(file.path(), r#"{ "fps": 24 }"#).unwrap();
        assert_eq!(store.get().fps(), 30);
        assert_eq!(store.reload().fps(), 24);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();

        let mut store = ConfigStore::defaults().with_file(file.path());
        assert_eq!(store.get(), &Config::default());
    }
}
