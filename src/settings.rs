//! Tunable thresholds and layered settings loading.
//!
//! Every numeric knob the extractors use lives here so that alternate values
//! can be tried from a config file or the environment without a rebuild.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const ENV_PREFIX: &str = "SCAMWATCH";
pub const DEFAULT_CONFIG_FILE: &str = "scamwatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON file whose lists replace the built-in lexicon lists.
    pub lexicon: Option<PathBuf>,
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub platforms: PlatformTuning,
    pub groups: GroupTuning,
    pub dedup: DedupTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTuning {
    pub explicit_weight: u32,
    pub shape_weight: u32,
    pub proximity_weight: u32,
    /// Added once for each known platform name found in the text.
    pub known_weight: u32,
    /// Tokens scanned on each side of a keyword hit.
    pub token_window: usize,
    /// Candidates below this score are dropped unless they are known platforms.
    pub min_score: u32,
    pub min_token_chars: usize,
    pub max_token_chars: usize,
}

impl Default for PlatformTuning {
    fn default() -> Self {
        PlatformTuning {
            explicit_weight: 5,
            shape_weight: 3,
            proximity_weight: 2,
            known_weight: 5,
            token_window: 5,
            min_score: 2,
            min_token_chars: 3,
            max_token_chars: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTuning {
    /// Characters inspected before and after an invite link for a label phrase.
    pub context_radius: usize,
}

impl Default for GroupTuning {
    fn default() -> Self {
        GroupTuning {
            context_radius: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupTuning {
    /// Token overlap (shared / larger set) above which two titles are the same.
    pub threshold: f64,
    /// The shorter title must be longer than this for substring containment to count.
    pub min_substring_len: usize,
}

impl Default for DedupTuning {
    fn default() -> Self {
        DedupTuning {
            threshold: 0.8,
            min_substring_len: 10,
        }
    }
}

impl Settings {
    /// Layers an optional config file under `SCAMWATCH_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `SCAMWATCH_TUNING__DEDUP__THRESHOLD`.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
