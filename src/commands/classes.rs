// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path class commands - list and add classification labels

use super::open_project;
use crate::color::Rgb;
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Options for `classes add`
#[derive(Debug, Default)]
pub struct AddOptions {
    /// Id of the parent class for a derived class
    pub parent: Option<String>,
    /// Color as `R,G,B` or `#rrggbb`
    pub color: Option<String>,
    /// Opacity, 0.0 to 1.0
    pub alpha: Option<f64>,
}

/// Run classes command
pub fn run(path: &Path, action: &str, name: Option<String>, options: AddOptions, config: &Config) -> Result<()> {
    match action {
        "list" | "ls" => list(path, config),
        "add" => {
            let name = name.ok_or_else(|| anyhow::anyhow!("Class name is required"))?;
            add(path, &name, options, config)
        }
        _ => anyhow::bail!("Unknown classes action: {action} (expected list or add)"),
    }
}

fn list(path: &Path, config: &Config) -> Result<()> {
    let project = open_project(path, config)?;
    if project.path_class_keys().is_empty() {
        println!("No path classes.");
        return Ok(());
    }
    for class in project.path_classes() {
        let indent = if class.is_derived_class() { "  " } else { "" };
        println!(
            "{indent}{}  {}  alpha {:.2}",
            class.id(),
            class.color(),
            class.alpha()
        );
    }
    Ok(())
}

fn add(path: &Path, name: &str, options: AddOptions, config: &Config) -> Result<()> {
    let color = options
        .color
        .as_deref()
        .map(str::parse::<Rgb>)
        .transpose()
        .context("Invalid --color")?;

    let mut project = open_project(path, config)?;
    let parent = match options.parent.as_deref() {
        Some(id) => Some(
            project
                .registry()
                .find(id)
                .map(|c| c.key())
                .ok_or_else(|| anyhow::anyhow!("Parent class not found: {id}"))?,
        ),
        None => None,
    };

    let registry = project.registry_mut();
    let key = registry.create_with(Some(name), color, parent, true)?;
    // An existing class keeps its color unless one is given explicitly
    if let Some(rgb) = color {
        registry.set_color(key, rgb)?;
    }
    if let Some(alpha) = options.alpha {
        registry.set_alpha(key, alpha)?;
    }
    let added = project.add_path_class(key)?;
    project.save()?;

    let class = project.registry().get(key)?;
    if added {
        println!("Added class: {} ({})", class.id(), class.color());
    } else {
        println!("Updated class: {} ({})", class.id(), class.color());
    }
    Ok(())
}
