// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. `config.toml` in the user config directory
//! 3. An explicit file passed with `--config`
//! 4. Environment variables (`QPCATALOG__*`, `__` separating sections)

use crate::entry::ImageType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Longest side of generated thumbnails, in pixels
    pub thumbnail_size: u32,
    /// Image type applied to new entries when none is given
    pub default_image_type: ImageType,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thumbnail_size: 256,
            default_image_type: ImageType::Unset,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Config builder with defaults, the user file and environment layered
    pub fn builder(
        explicit: Option<&Path>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("thumbnail_size", i64::from(defaults.thumbnail_size))?
            .set_default("default_image_type", defaults.default_image_type.code())?
            .set_default("log_level", defaults.log_level)?;

        if let Some(user) = user_config_path() {
            builder = builder.add_source(config::File::from(user).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }

        Ok(builder.add_source(
            config::Environment::with_prefix("QPCATALOG")
                .separator("__")
                .try_parsing(true)
                .ignore_empty(true),
        ))
    }

    /// Validate after layering
    fn validate(self) -> Result<Self> {
        anyhow::ensure!(self.thumbnail_size > 0, "thumbnail_size must be positive");
        Ok(self)
    }
}

/// Location of the user-level config file
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "qpcatalog")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from all sources
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let layered = Config::builder(explicit)?
        .build()
        .context("Failed to build configuration")?;
    let config: Config = layered
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate()
}
