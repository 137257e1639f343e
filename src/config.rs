use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_DATABASE: &str = "batman_universe.db";

/// Runtime settings. Every field has a default, so an empty or missing
/// config file yields the stock behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: PathBuf,
    /// Fixed seed for the composer's random source; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Entities returned by a listing answer.
    pub listing_limit: usize,
    pub thresholds: Thresholds,
    pub composer: ComposerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            seed: None,
            listing_limit: 10,
            thresholds: Thresholds::default(),
            composer: ComposerConfig::default(),
        }
    }
}

/// Confidence gates (0..1) and matcher thresholds (0..100).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub character: f64,
    pub location: f64,
    pub vehicle: f64,
    pub character_vehicle: f64,
    pub general: f64,
    pub description: f64,
    pub definitive: u8,
    pub ambiguous: u8,
    pub comparison: u8,
    pub relation: u8,
    pub character_vehicle_floor: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            character: 0.6,
            location: 0.6,
            vehicle: 0.6,
            character_vehicle: 0.4,
            general: 0.6,
            description: 0.4,
            definitive: 60,
            ambiguous: 50,
            comparison: 70,
            relation: 70,
            character_vehicle_floor: 40,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Sentence-boundary trim target, in characters.
    pub max_length: usize,
    pub hedge_chance: f64,
    pub insight_chance: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_length: 600,
            hedge_chance: 0.3,
            insight_chance: 0.2,
        }
    }
}

impl Config {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Settings that make composed text reproducible: fixed seed, no
    /// stochastic flourishes.
    pub fn deterministic() -> Self {
        Self {
            seed: Some(0),
            composer: ComposerConfig {
                hedge_chance: 0.0,
                insight_chance: 0.0,
                ..ComposerConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.database, PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(cfg.thresholds.definitive, 60);
        assert_eq!(cfg.thresholds.character_vehicle, 0.4);
        assert_eq!(cfg.composer.max_length, 600);
        assert_eq!(cfg.listing_limit, 10);
    }

    #[test]
    fn test_partial_override() {
        let cfg = Config::from_toml(
            "seed = 7\n[thresholds]\nambiguous = 45\n[composer]\nhedge_chance = 0.0\n",
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.thresholds.ambiguous, 45);
        assert_eq!(cfg.thresholds.comparison, 70, "untouched fields keep defaults");
        assert_eq!(cfg.composer.hedge_chance, 0.0);
        assert_eq!(cfg.composer.insight_chance, 0.2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database = \"gotham.db\"\nlisting_limit = 3").unwrap();
        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.database, PathBuf::from("gotham.db"));
        assert_eq!(cfg.listing_limit, 3);
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listing_limit = \"many\"").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "got {err:?}");
    }
}
