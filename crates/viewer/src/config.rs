use glview_camera::{CameraConfig, CameraError};
use glview_render::{EngineOptions, PowerPreference};
use glview_scene::SceneSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid viewer config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid camera config: {0}")]
    Camera(#[from] CameraError),
}

/// Engine tuning beyond antialiasing and device ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub power_preference: PowerPreference,
    pub vsync: bool,
    pub grid: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = EngineOptions::default();
        Self {
            power_preference: defaults.power_preference,
            vsync: defaults.vsync,
            grid: defaults.grid,
        }
    }
}

/// Everything the host can configure about a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model_path: String,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    pub antialias: bool,
    pub adapt_to_device_ratio: bool,
    pub engine: EngineConfig,
    pub scene: SceneSettings,
    pub camera: CameraConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: "assets/Box.glb".into(),
            canvas_height: 720,
            antialias: true,
            adapt_to_device_ratio: false,
            engine: EngineConfig::default(),
            scene: SceneSettings::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "viewer config loaded");
        Ok(config)
    }

    /// Check that the camera configuration resolves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.build()?;
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            antialias: self.antialias,
            adapt_to_device_ratio: self.adapt_to_device_ratio,
            power_preference: self.engine.power_preference,
            vsync: self.engine.vsync,
            grid: self.engine.grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use glview_camera::CameraMode;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.model_path, "assets/Box.glb");
        assert_eq!(config.canvas_height, 720);
        assert!(config.antialias);
        assert!(!config.adapt_to_device_ratio);
        assert_eq!(config.scene.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert!(config.scene.collisions_enabled);
    }

    #[test]
    fn walk_config_from_yaml() {
        let yaml = r#"
model_path: models/room.glb
antialias: false
engine:
  vsync: false
camera:
  mode: walk
  eye_height: 1.8
  bounds: { min_x: -5.0, max_x: 5.0, min_z: -4.0, max_z: 4.0 }
"#;
        let config = ViewerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.model_path, "models/room.glb");
        let options = config.engine_options();
        assert!(!options.antialias);
        assert!(!options.vsync);
        let camera = config.camera.build().unwrap();
        assert_eq!(camera.mode(), CameraMode::Walk);
        assert_eq!(camera.eye().y, 1.8);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let yaml = r#"
camera:
  mode: walk
  bounds: { min_x: 5.0, max_x: -5.0, min_z: -4.0, max_z: 4.0 }
"#;
        assert!(matches!(
            ViewerConfig::from_yaml(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn invalid_radius_limits_are_rejected() {
        let yaml = r#"
camera:
  mode: orbit
  lower_radius_limit: 40.0
  upper_radius_limit: 10.0
"#;
        assert!(matches!(
            ViewerConfig::from_yaml(yaml),
            Err(ConfigError::Camera(CameraError::InvalidRadiusLimits { .. }))
        ));
    }

    #[test]
    fn bad_ellipsoid_and_nan_limits_are_rejected() {
        let yaml = r#"
camera:
  mode: walk
  position: [0, 0, 0]
  ellipsoid: [-2, 1, -2]
  bounds: { min_x: -4, max_x: 4, min_z: -3, max_z: 3 }
"#;
        assert!(matches!(
            ViewerConfig::from_yaml(yaml),
            Err(ConfigError::Camera(CameraError::InvalidEllipsoid(_)))
        ));
        assert!(matches!(
            ViewerConfig::from_yaml("camera:\n  mode: orbit\n  lower_radius_limit: .nan\n"),
            Err(ConfigError::Camera(CameraError::NotFinite { .. }))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(&path, "canvas_height: 480\n").unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap().canvas_height, 480);
        assert!(matches!(
            ViewerConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
