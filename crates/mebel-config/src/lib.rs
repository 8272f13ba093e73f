//! Application configuration, loaded from TOML.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use mebel_core::{Bounds, DimensionBounds, PriceTable, ShelfGeometry, StoreSettings};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "MEBEL_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

impl AppConfig {
    /// Loads and validates the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `$MEBEL_CONFIG` if set, otherwise `./config/default.toml`, otherwise
    /// built-in defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "cannot resolve the working directory".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (table, entries) in [
            ("materials", &self.pricing.materials),
            ("colors", &self.pricing.colors),
        ] {
            let discount = entries
                .iter()
                .find(|(_, factor)| !(factor.is_finite() && **factor >= 1.0));
            if let Some((name, factor)) = discount {
                return Err(ConfigError::Invalid(format!(
                    "pricing.{table}.{name}: factor {factor} must be a finite number >= 1"
                )));
            }
        }

        for (axis, bounds) in [
            ("width", self.limits.width),
            ("height", self.limits.height),
            ("depth", self.limits.depth),
        ] {
            if !(bounds.min > 0.0 && bounds.min <= bounds.max && bounds.max.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "limits.{axis}: expected 0 < min <= max, got {}..{}",
                    bounds.min, bounds.max
                )));
            }
        }

        if !(self.limits.shelf_margin >= 0.0 && self.limits.shelf_thickness > 0.0) {
            return Err(ConfigError::Invalid(
                "limits: shelf margin must be >= 0 and thickness > 0".to_string(),
            ));
        }

        if !(self.view.drag_sensitivity.is_finite() && self.view.drag_sensitivity > 0.0) {
            return Err(ConfigError::Invalid(
                "view.drag_sensitivity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Store settings with the configured factors layered over the standard table.
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            prices: self.pricing.table(),
            bounds: self.limits.bounds(),
            shelf: ShelfGeometry {
                margin: self.limits.shelf_margin,
                thickness: self.limits.shelf_thickness,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_addr")]
    pub addr: SocketAddr,
    /// JSON catalog served by the data-access server. The bundled catalog is
    /// used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default = "ServerConfig::default_save_queue")]
    pub save_queue: usize,
}

impl ServerConfig {
    fn default_addr() -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], 3001))
    }

    fn default_save_queue() -> usize {
        64
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
            catalog_path: None,
            save_queue: Self::default_save_queue(),
        }
    }
}

/// Extra or replacement price factors keyed by material / color name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub materials: BTreeMap<String, f64>,
    #[serde(default)]
    pub colors: BTreeMap<String, f64>,
}

impl PricingConfig {
    pub fn table(&self) -> PriceTable {
        PriceTable::default().extended(self.materials.clone(), self.colors.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "LimitsConfig::default_width")]
    pub width: Bounds,
    #[serde(default = "LimitsConfig::default_height")]
    pub height: Bounds,
    #[serde(default = "LimitsConfig::default_depth")]
    pub depth: Bounds,
    #[serde(default = "LimitsConfig::default_shelf_margin")]
    pub shelf_margin: f64,
    #[serde(default = "LimitsConfig::default_shelf_thickness")]
    pub shelf_thickness: f64,
}

impl LimitsConfig {
    fn default_width() -> Bounds {
        DimensionBounds::default().width
    }

    fn default_height() -> Bounds {
        DimensionBounds::default().height
    }

    fn default_depth() -> Bounds {
        DimensionBounds::default().depth
    }

    fn default_shelf_margin() -> f64 {
        ShelfGeometry::default().margin
    }

    fn default_shelf_thickness() -> f64 {
        ShelfGeometry::default().thickness
    }

    pub fn bounds(&self) -> DimensionBounds {
        DimensionBounds {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            depth: Self::default_depth(),
            shelf_margin: Self::default_shelf_margin(),
            shelf_thickness: Self::default_shelf_thickness(),
        }
    }
}

/// Initial orbit of the preview, in degrees.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "ViewConfig::default_pitch")]
    pub default_pitch: f64,
    #[serde(default = "ViewConfig::default_yaw")]
    pub default_yaw: f64,
    #[serde(default = "ViewConfig::default_drag_sensitivity")]
    pub drag_sensitivity: f64,
}

impl ViewConfig {
    fn default_pitch() -> f64 {
        25.0
    }

    fn default_yaw() -> f64 {
        45.0
    }

    fn default_drag_sensitivity() -> f64 {
        0.5
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_pitch: Self::default_pitch(),
            default_yaw: Self::default_yaw(),
            drag_sensitivity: Self::default_drag_sensitivity(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_store_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.server.addr.port(), 3001);
        assert!(cfg.server.catalog_path.is_none());
        assert_eq!(cfg.limits.bounds(), DimensionBounds::default());
        assert_eq!(cfg.store_settings().shelf, ShelfGeometry::default());
        assert_eq!(cfg.pricing.table(), PriceTable::default());
        assert_eq!(cfg.view.default_pitch, 25.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_from_temp_file() {
        let file = write_config(
            r#"
            [logging]
            level = "debug"

            [server]
            addr = "127.0.0.1:8080"
            catalog_path = "data/catalog.json"

            [pricing.materials]
            "бук" = 1.25

            [limits]
            width = { min = 60.0, max = 400.0 }
            shelf_margin = 4.0

            [view]
            default_yaw = 30.0
            "#,
        );

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.server.addr.port(), 8080);
        assert_eq!(
            cfg.server.catalog_path.as_deref(),
            Some(Path::new("data/catalog.json"))
        );

        let settings = cfg.store_settings();
        assert_eq!(settings.prices.material_factor("бук"), 1.25);
        assert_eq!(settings.prices.material_factor("кожа"), 1.5);
        assert_eq!(settings.bounds.width, Bounds::new(60.0, 400.0));
        assert_eq!(settings.bounds.height, DimensionBounds::default().height);
        assert_eq!(settings.shelf.margin, 4.0);
        assert_eq!(settings.shelf.thickness, 2.0);

        assert_eq!(cfg.view.default_pitch, 25.0);
        assert_eq!(cfg.view.default_yaw, 30.0);
    }

    #[test]
    fn discounting_factors_are_rejected() {
        let file = write_config(
            r#"
            [pricing.colors]
            "белый" = 0.9
            "#,
        );
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("pricing.colors")));
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let file = write_config(
            r#"
            [limits]
            depth = { min = 200.0, max = 30.0 }
            "#,
        );
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("limits.depth")));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let file = write_config("[logging\nlevel = ");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
