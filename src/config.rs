//! Runtime configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! seed = 42
//!
//! [window]
//! width = 1280
//! height = 720
//!
//! [assets]
//! model = "assets/backpack/backpack.obj"
//! ```

use std::path::{Path, PathBuf};

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, gfx::camera::FlyCamera};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "sandbox.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Seed for the instance color generator; a fresh OS seed when absent
    pub seed: Option<u64>,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub sphere: SphereConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Phong Sandbox".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    /// World units per second
    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sensitivity: 0.1,
            zoom: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, width: u32, height: u32) -> FlyCamera {
        let mut camera = FlyCamera::new(
            Vector3::from(self.position),
            self.yaw,
            self.pitch,
            width as f32 / height.max(1) as f32,
        )
        .with_zoom(self.zoom)
        .with_clip_planes(self.near, self.far);
        camera.base_speed = self.speed;
        camera.sensitivity = self.sensitivity;
        camera
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub radius: f32,
    pub sectors: u32,
    pub stacks: u32,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            sectors: 36,
            stacks: 18,
        }
    }
}

/// Diffuse, specular and emission maps of a textured object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureMaps {
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
    pub emission: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub shader_dir: PathBuf,
    pub cube: TextureMaps,
    /// OBJ file for the model mode
    pub model: Option<PathBuf>,
    pub model_scale: f32,
    /// Flip decoded images so UV (0, 0) is the bottom-left texel
    pub flip_textures: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            cube: TextureMaps {
                diffuse: Some(PathBuf::from("assets/metallic_texture.jpg")),
                specular: Some(PathBuf::from("assets/specular-map.png")),
                emission: Some(PathBuf::from("assets/emission-map.jpg")),
            },
            model: None,
            model_scale: 1.0,
            flip_textures: true,
        }
    }
}

impl SandboxConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: SandboxConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Loads `path` if given, else `sandbox.toml` if present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            log::info!("Using {}", fallback.display());
            Self::load(fallback)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera planes need 0 < near < far, got near {} far {}",
                camera.near, camera.far
            )));
        }
        if self.assets.model_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "model scale must be positive, got {}",
                self.assets.model_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_source_gives_defaults() {
        let config = SandboxConfig::from_toml("").unwrap();
        assert_eq!(config, SandboxConfig::default());
        assert_eq!(config.window.width, 800);
        assert_eq!(config.sphere.sectors, 36);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = SandboxConfig::from_toml(
            r#"
            seed = 7

            [window]
            width = 1024

            [camera]
            speed = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.camera.speed, 5.0);
        assert_eq!(config.camera.yaw, -90.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            SandboxConfig::from_toml("[window]\nheight = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SandboxConfig::from_toml("[camera]\nnear = 10.0\nfar = 1.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SandboxConfig::from_toml("[window]\nwidth = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sphere]\nradius = 2.0").unwrap();
        let config = SandboxConfig::load(file.path()).unwrap();
        assert_eq!(config.sphere.radius, 2.0);

        let missing = SandboxConfig::load(Path::new("/nonexistent/sandbox.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_camera_from_config() {
        let camera = CameraConfig::default().build(800, 600);
        assert_eq!(camera.position(), Vector3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.base_speed, 2.5);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }
}
