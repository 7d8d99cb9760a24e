//! Viewer configuration loading

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ViewerError;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Extra distance applied on top of an exact fit of the largest dimension
    #[serde(default = "default_framing_multiplier")]
    pub framing_multiplier: f32,
    /// Direction from the look-at target towards the camera (normalized on use)
    #[serde(default = "default_view_direction")]
    pub view_direction: [f32; 3],
    /// Lower bound for the framed distance (degenerate/flat models)
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            framing_multiplier: default_framing_multiplier(),
            view_direction: default_view_direction(),
            min_distance: default_min_distance(),
        }
    }
}

fn default_fov() -> f32 {
    45.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_framing_multiplier() -> f32 {
    1.8
}

fn default_view_direction() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_min_distance() -> f32 {
    0.01
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Clear color as sRGB (0.0-1.0)
    #[serde(default = "default_background")]
    pub background: [f32; 3],
    #[serde(default = "default_ambient_brightness")]
    pub ambient_brightness: f32,
    #[serde(default = "default_light_position")]
    pub light_position: [f32; 3],
    #[serde(default = "default_light_illuminance")]
    pub light_illuminance: f32,
    #[serde(default = "default_true")]
    pub shadows: bool,
    /// Base color for formats that carry no material (STL, OBJ, FBX)
    #[serde(default = "default_material_color")]
    pub default_material_color: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            ambient_brightness: default_ambient_brightness(),
            light_position: default_light_position(),
            light_illuminance: default_light_illuminance(),
            shadows: true,
            default_material_color: default_material_color(),
        }
    }
}

fn default_background() -> [f32; 3] {
    // #1a1a1a
    [0.102, 0.102, 0.102]
}

fn default_ambient_brightness() -> f32 {
    400.0
}

fn default_light_position() -> [f32; 3] {
    [5.0, 10.0, 7.0]
}

fn default_light_illuminance() -> f32 {
    8000.0
}

fn default_material_color() -> [f32; 3] {
    // #888888
    [0.533, 0.533, 0.533]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Loop the clip instead of playing it once
    #[serde(default = "default_true")]
    pub repeat: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            repeat: true,
        }
    }
}

impl ViewerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ViewerError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the framing math cannot work with
    pub fn validate(&self) -> Result<(), ViewerError> {
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ViewerError::Config(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        if cam.framing_multiplier <= 0.0 {
            return Err(ViewerError::Config(format!(
                "camera.framing_multiplier must be positive, got {}",
                cam.framing_multiplier
            )));
        }
        if cam.near <= 0.0 || cam.far <= cam.near {
            return Err(ViewerError::Config(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if cam.view_direction.iter().all(|c| *c == 0.0) {
            return Err(ViewerError::Config(
                "camera.view_direction must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from file, falling back to defaults when it is absent
pub fn load_config(path: &Path) -> Result<ViewerConfig, ViewerError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = ViewerConfig::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[camera]
fov_degrees = 60.0

[animation]
repeat = false
"#;
        let config = ViewerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.framing_multiplier, 1.8);
        assert_eq!(config.scene, SceneConfig::default());
        assert!(!config.animation.repeat);
    }

    #[test]
    fn test_invalid_fov_rejected() {
        let err = ViewerConfig::from_toml_str("[camera]\nfov_degrees = 0.0\n").unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
    }

    #[test]
    fn test_zero_view_direction_rejected() {
        let err =
            ViewerConfig::from_toml_str("[camera]\nview_direction = [0.0, 0.0, 0.0]\n").unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("vitrine.toml")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vitrine.toml");
        std::fs::write(&path, "[scene]\nshadows = false\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.scene.shadows);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_round_trip_defaults() {
        let text = toml::to_string_pretty(&ViewerConfig::default()).unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), ViewerConfig::default());
    }
}
