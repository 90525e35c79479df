//! Runtime configuration, read from an optional RON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use math::vec::Vec3;
use scene::{Limits, Message, OrbitCamera, Water, MAX_GRID_SEGMENTS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clock: ClockConfig,
    pub camera: CameraConfig,
    pub water: Water,
    pub meshes: MeshConfig,
    /// Messages applied in order before the clock starts.
    pub script: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_ms: u64,
    /// Stop after this many ticks. Runs until interrupted when absent.
    pub frames: Option<u64>,
    /// Log every Nth snapshot. 0 disables the logging subscriber.
    pub log_every: u64,
    /// Snapshots a subscriber may fall behind before it is dropped.
    pub subscriber_capacity: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            frames: None,
            log_every: 60,
            subscriber_capacity: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub target: Vec3,
    pub up: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub distance_limits: Limits,
    pub pitch_limits: Limits,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = OrbitCamera::default();
        Self {
            target: camera.target(),
            up: camera.up(),
            distance: camera.distance(),
            yaw: camera.yaw(),
            pitch: camera.pitch(),
            distance_limits: camera.distance_limits(),
            pitch_limits: camera.pitch_limits(),
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> OrbitCamera {
        OrbitCamera::new(
            self.target,
            self.up,
            self.distance,
            self.yaw,
            self.pitch,
            self.distance_limits,
            self.pitch_limits,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: f32,
    pub segments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub water: GridConfig,
    pub terrain: GridConfig,
    pub terrain_height: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            water: GridConfig { size: 20.0, segments: 64 },
            terrain: GridConfig { size: 50.0, segments: 32 },
            terrain_height: 5.0,
        }
    }
}

impl Config {
    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Config::parse(&fs::read_to_string(path)?),
            None => Ok(Config::default()),
        }
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.tick_ms == 0 {
            return Err(ConfigError::Invalid("clock.tick_ms must be at least 1".into()));
        }
        if self.clock.subscriber_capacity == 0 {
            return Err(ConfigError::Invalid("clock.subscriber_capacity must be at least 1".into()));
        }

        let camera = &self.camera;
        check_limits("camera.distance", camera.distance_limits, camera.distance)?;
        check_limits("camera.pitch", camera.pitch_limits, camera.pitch)?;

        check_grid("meshes.water", self.meshes.water)?;
        check_grid("meshes.terrain", self.meshes.terrain)?;

        Ok(())
    }
}

fn check_limits(name: &str, limits: Limits, value: f32) -> Result<(), ConfigError> {
    if !(limits.min <= limits.max) {
        return Err(ConfigError::Invalid(format!(
            "{name} limits are empty: [{}, {}]", limits.min, limits.max
        )));
    }
    if !limits.contains(value) {
        return Err(ConfigError::Invalid(format!(
            "{name} = {value} is outside [{}, {}]", limits.min, limits.max
        )));
    }
    Ok(())
}

fn check_grid(name: &str, grid: GridConfig) -> Result<(), ConfigError> {
    if !(grid.size > 0.0) {
        return Err(ConfigError::Invalid(format!("{name}.size must be positive, got {}", grid.size)));
    }
    if grid.segments < 1 || grid.segments > MAX_GRID_SEGMENTS {
        return Err(ConfigError::Invalid(format!(
            "{name}.segments must be in 1..={MAX_GRID_SEGMENTS}, got {}", grid.segments
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.clock.tick_ms, 16);
        assert_eq!(config.camera.build(), OrbitCamera::default());
        assert_eq!(config.water, Water::default());
    }

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(Config::parse("()").unwrap(), Config::default());
    }

    #[test]
    fn parses_partial_sections_and_script() {
        let config = Config::parse(
            r#"(
                clock: (tick_ms: 33, frames: Some(10)),
                water: (reflectivity: 0.2, fresnelStrength: 1.0, waveSpeed: 0.05,
                        useReflection: false, useRefraction: true),
                script: [
                    Zoom(delta: -3.0),
                    MouseDown(x: 1, y: 2),
                    ShowScenery(false),
                    Unrecognized("later"),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(config.clock.tick_ms, 33);
        assert_eq!(config.clock.frames, Some(10));
        assert_eq!(config.clock.log_every, 60);
        assert_eq!(config.water.reflectivity, 0.2);
        assert!(!config.water.use_reflection);
        assert_eq!(config.script, vec![
            Message::Zoom { delta: -3.0 },
            Message::MouseDown { x: 1, y: 2 },
            Message::ShowScenery(false),
            Message::Unrecognized("later".to_string()),
        ]);
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(Config::parse("(clock: 3)"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Config::load(Some(Path::new("/nonexistent/waterline.ron")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn rejects_zero_tick() {
        let mut config = Config::default();
        config.clock.tick_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_limits() {
        let mut config = Config::default();
        config.camera.distance_limits = Limits::new(50.0, 5.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_value_outside_limits() {
        let mut config = Config::default();
        config.camera.pitch = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_grids() {
        let mut config = Config::default();
        config.meshes.water.segments = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.meshes.terrain.segments = 256;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.meshes.water.size = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.meshes.terrain.segments = 255;
        assert!(config.validate().is_ok());
    }
}
