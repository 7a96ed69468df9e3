// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

use plan3d_geometry::config::env_or;
use plan3d_geometry::GeometryConfig;
use serde::{Deserialize, Serialize};

/// Default number of fractional digits written in OBJ files.
pub const DEFAULT_FRACTION_DIGITS: usize = 7;

/// Rebuild pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Settings handed to every mesh generator.
    pub geometry: GeometryConfig,
    /// Maximum fractional digits of numbers written by the OBJ writer.
    pub obj_fraction_digits: usize,
    /// Rebuild producers on the rayon thread pool.
    pub parallel: bool,
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            geometry: GeometryConfig::from_env(),
            obj_fraction_digits: env_or("PLAN3D_OBJ_FRACTION_DIGITS", DEFAULT_FRACTION_DIGITS),
            parallel: std::env::var("PLAN3D_PARALLEL")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            obj_fraction_digits: DEFAULT_FRACTION_DIGITS,
            parallel: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
