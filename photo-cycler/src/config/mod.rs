//! Startup configuration.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. command-line flags ([`Overrides`]),
//! 2. an optional YAML settings file,
//! 3. built-in defaults.
//!
//! The photo and static directories are positional CLI arguments only; both
//! must already exist.
//!
//! The expected YAML structure is:
//! ```yaml
//! port: 8888
//! rate: 5          # seconds between photos
//! name: "Photo Cycler"
//! seed: 42         # optional, makes photo selection reproducible
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::cycler::{DEFAULT_RATE_SECS, MAX_PERIOD, MIN_PERIOD};

// ── Constants ─────────────────────────────────────────────────────────────────

/// HTTP port used when neither the CLI nor the settings file gives one.
pub const DEFAULT_PORT: u16 = 8888;

/// Thing title used when none is configured.
pub const DEFAULT_TITLE: &str = "Photo Cycler";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Fatal startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind} directory does not exist: {}", .path.display())]
    MissingDirectory {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} path is not a directory: {}", .path.display())]
    NotADirectory { kind: &'static str, path: PathBuf },

    #[error("cannot open settings file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("update rate must be between 0.1 and 31622400 seconds, got {0}")]
    InvalidRate(f64),
}

// ── Private YAML deserialization types ────────────────────────────────────────

/// Settings file layout.  Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    port: Option<u16>,
    rate: Option<f64>,
    name: Option<String>,
    seed: Option<u64>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Values given explicitly on the command line.  `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub rate: Option<f64>,
    pub name: Option<String>,
    pub seed: Option<u64>,
}

/// Fully resolved, validated process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical path of the photo source directory.
    pub photos_dir: PathBuf,
    /// Canonical path of the publication (static) directory.
    pub static_dir: PathBuf,
    pub port: u16,
    /// Initial cycle rate in seconds.
    pub rate_secs: f64,
    pub title: String,
    pub seed: Option<u64>,
}

impl Settings {
    /// Validate the directories and merge overrides, file, and defaults.
    ///
    /// # Errors
    /// Any [`ConfigError`]; all of them are fatal at startup.
    pub fn resolve(
        photos_dir: &Path,
        static_dir: &Path,
        settings_file: Option<&Path>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let photos_dir = require_dir("Photos", photos_dir)?;
        let static_dir = require_dir("Static", static_dir)?;

        let file = match settings_file {
            Some(path) => load_file(path)?,
            None => SettingsFile::default(),
        };

        let rate_secs = overrides
            .rate
            .or(file.rate)
            .unwrap_or(DEFAULT_RATE_SECS);
        let limits = MIN_PERIOD.as_secs_f64()..=MAX_PERIOD.as_secs_f64();
        if !limits.contains(&rate_secs) {
            return Err(ConfigError::InvalidRate(rate_secs));
        }

        let settings = Self {
            photos_dir,
            static_dir,
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            rate_secs,
            title: overrides
                .name
                .or(file.name)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            seed: overrides.seed.or(file.seed),
        };

        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

fn require_dir(kind: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = path
        .canonicalize()
        .map_err(|source| ConfigError::MissingDirectory {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
    if !canonical.is_dir() {
        return Err(ConfigError::NotADirectory {
            kind,
            path: canonical,
        });
    }
    Ok(canonical)
}

fn load_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    info!("Loading settings from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty file deserialises to `null`; treat it as "no settings".
    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn dirs() -> (TempDir, TempDir) {
        (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap())
    }

    // ── directories ───────────────────────────────────────────────────────────

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let (photos, public) = dirs();
        let s = Settings::resolve(photos.path(), public.path(), None, Overrides::default())
            .unwrap();

        assert_eq!(s.port, 8888);
        assert_eq!(s.rate_secs, 5.0);
        assert_eq!(s.title, "Photo Cycler");
        assert_eq!(s.seed, None);
        assert_eq!(s.photos_dir, photos.path().canonicalize().unwrap());
        assert_eq!(s.static_dir, public.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_photos_dir_is_fatal() {
        let (_photos, public) = dirs();
        let err = Settings::resolve(
            Path::new("/nonexistent/photos"),
            public.path(),
            None,
            Overrides::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingDirectory { kind: "Photos", .. }));
        assert!(err.to_string().contains("Photos directory does not exist"));
    }

    #[test]
    fn missing_static_dir_is_fatal() {
        let (photos, _public) = dirs();
        let err = Settings::resolve(
            photos.path(),
            Path::new("/nonexistent/static"),
            None,
            Overrides::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingDirectory { kind: "Static", .. }));
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let (_photos, public) = dirs();
        let file = yaml_tempfile("not a dir");
        let err = Settings::resolve(file.path(), public.path(), None, Overrides::default())
            .unwrap_err();

        assert!(matches!(err, ConfigError::NotADirectory { .. }));
    }

    // ── settings file ─────────────────────────────────────────────────────────

    #[test]
    fn file_values_replace_defaults() {
        let (photos, public) = dirs();
        let f = yaml_tempfile("port: 9000\nrate: 2.5\nname: \"Hall Frame\"\nseed: 7\n");

        let s = Settings::resolve(
            photos.path(),
            public.path(),
            Some(f.path()),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(s.port, 9000);
        assert_eq!(s.rate_secs, 2.5);
        assert_eq!(s.title, "Hall Frame");
        assert_eq!(s.seed, Some(7));
    }

    #[test]
    fn flags_win_over_file() {
        let (photos, public) = dirs();
        let f = yaml_tempfile("port: 9000\nrate: 2.5\n");
        let overrides = Overrides {
            port: Some(9100),
            rate: Some(30.0),
            ..Default::default()
        };

        let s = Settings::resolve(photos.path(), public.path(), Some(f.path()), overrides)
            .unwrap();

        assert_eq!(s.port, 9100);
        assert_eq!(s.rate_secs, 30.0);
    }

    #[test]
    fn empty_file_is_accepted() {
        let (photos, public) = dirs();
        let f = yaml_tempfile("");
        let s = Settings::resolve(
            photos.path(),
            public.path(),
            Some(f.path()),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(s.port, DEFAULT_PORT);
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let (photos, public) = dirs();
        let f = yaml_tempfile("colour: blue\n");
        let err = Settings::resolve(
            photos.path(),
            public.path(),
            Some(f.path()),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let (photos, public) = dirs();
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let err = Settings::resolve(
            photos.path(),
            public.path(),
            Some(f.path()),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_settings_file_returns_error() {
        let (photos, public) = dirs();
        let err = Settings::resolve(
            photos.path(),
            public.path(),
            Some(Path::new("/nonexistent/settings.yaml")),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    // ── rate validation ───────────────────────────────────────────────────────

    #[test]
    fn out_of_range_rate_is_rejected() {
        let (photos, public) = dirs();
        for rate in [0.0, -1.0, f64::NAN, 1e-9, 0.05, 1e12] {
            let overrides = Overrides {
                rate: Some(rate),
                ..Default::default()
            };
            let err = Settings::resolve(photos.path(), public.path(), None, overrides)
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRate(_)), "rate {rate}");
        }
    }
}
