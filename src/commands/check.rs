// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check that every image in a project can still be opened

use super::open_project;
use crate::config::Config;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Report readability per entry; fails if any entry is unreadable
pub fn run(path: &Path, no_color: bool, config: &Config) -> Result<()> {
    let project = open_project(path, config)?;
    let readable = project.is_readable();

    for entry in project.images() {
        let ok = readable.get(&entry.id()).copied().unwrap_or(false);
        let status = match (ok, no_color) {
            (true, true) => "ok".to_string(),
            (false, true) => "MISSING".to_string(),
            (true, false) => "ok".green().to_string(),
            (false, false) => "MISSING".red().bold().to_string(),
        };
        println!("[{:>4}] {:<7} {}  {}", entry.id(), status, entry.image_name(), entry.uri());
    }

    let unreadable = readable.values().filter(|ok| !**ok).count();
    if unreadable == 0 {
        println!("All {} images readable", readable.len());
        return Ok(());
    }
    if project.uri_previous().is_some() {
        println!("Project has moved since it was saved; try `relink --rebase`");
    }
    anyhow::bail!("{unreadable} of {} images are unreadable", readable.len())
}
