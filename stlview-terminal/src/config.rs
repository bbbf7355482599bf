/// Viewer configuration
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "stlview.toml";

const MAX_FPS: u32 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Redraw rate of the render loop
    pub fps: u32,
    /// Radians per key press
    pub rotate_step: f32,
    pub auto_rotate: bool,
    /// Auto-spin per frame, in radians
    pub spin_x: f32,
    pub spin_y: f32,
    pub camera_distance: f32,
    pub fov_degrees: f32,
    pub log_file: PathBuf,
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            rotate_step: 0.1,
            auto_rotate: true,
            spin_x: 0.01,
            spin_y: 0.015,
            camera_distance: 5.0,
            fov_degrees: 45.0,
            log_file: std::env::temp_dir().join("stlview.log"),
            log_filter: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Load `path` if given, else `stlview.toml` if it exists, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self.sanitized()
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    fn sanitized(mut self) -> Self {
        self.fps = self.fps.clamp(1, MAX_FPS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fps = 60\nauto_rotate = false").unwrap();

        let config = ViewerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.fps, 60);
        assert!(!config.auto_rotate);
        assert_eq!(config.rotate_step, ViewerConfig::default().rotate_step);
    }

    #[test]
    fn test_fps_is_clamped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "fps = 0").unwrap();
        assert_eq!(ViewerConfig::load_from_file(file.path()).unwrap().fps, 1);

        assert_eq!(ViewerConfig::default().with_fps(1000).fps, MAX_FPS);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "frames_per_second = 60").unwrap();

        assert!(matches!(
            ViewerConfig::load_from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ViewerConfig::discover(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
