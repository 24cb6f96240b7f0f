// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Relink images whose files have moved

use crate::config::Config;
use crate::project::Project;
use crate::provider::{ImageProvider, LocalImageProvider};
use anyhow::{Context, Result};
use std::path::Path;

/// One `OLD=NEW` rewrite; either side may be a URI or a local path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relink {
    /// URI (or URI prefix, for directories) to replace
    pub old: String,
    /// Replacement URI
    pub new: String,
}

impl Relink {
    /// Parse `OLD=NEW`
    pub fn parse(spec: &str) -> Result<Self> {
        let (old, new) = spec
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected OLD=NEW, got '{spec}'"))?;
        anyhow::ensure!(!old.is_empty() && !new.is_empty(), "Empty side in '{spec}'");
        Ok(Self {
            old: to_uri(old)?,
            new: to_uri(new)?,
        })
    }

    /// New URI for `uri`, matching exactly or as a directory prefix
    #[must_use]
    pub fn apply(&self, uri: &str) -> Option<String> {
        if uri == self.old {
            return Some(self.new.clone());
        }
        let old_dir = self.old.trim_end_matches('/');
        let rest = uri.strip_prefix(old_dir)?.strip_prefix('/')?;
        Some(format!("{}/{rest}", self.new.trim_end_matches('/')))
    }
}

fn to_uri(value: &str) -> Result<String> {
    if value.contains("://") || value.starts_with("file:") {
        return Ok(value.to_string());
    }
    LocalImageProvider
        .uri_from_path(Path::new(value))
        .with_context(|| format!("Cannot convert '{value}' to a URI"))
}

/// Run relink command
pub fn run(project_path: &Path, maps: &[String], rebase: bool, config: &Config) -> Result<()> {
    let relinks = maps
        .iter()
        .map(|m| Relink::parse(m))
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(rebase || !relinks.is_empty(), "Nothing to do: pass --map or --rebase");

    let (rebased, mapped) = Project::builder(project_path)
        .create(false)
        .config(config.clone())
        .with_session(|project| -> Result<(usize, usize)> {
            let rebased = if rebase { project.rebase_moved_images()? } else { 0 };
            let mapped = project
                .update_image_paths_with(|uri| relinks.iter().find_map(|r| r.apply(uri)));
            Ok((rebased, mapped))
        })
        .with_context(|| format!("Failed to relink images in {}", project_path.display()))?;

    if rebase {
        println!("Rebased {rebased} images");
    }
    if !relinks.is_empty() {
        println!("Relinked {mapped} images");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_matches() {
        let relink = Relink {
            old: "file:///old/slides".into(),
            new: "file:///new/slides/".into(),
        };
        assert_eq!(
            relink.apply("file:///old/slides/a.svs").as_deref(),
            Some("file:///new/slides/a.svs")
        );
        assert_eq!(relink.apply("file:///old/slides").as_deref(), Some("file:///new/slides/"));
        assert_eq!(relink.apply("file:///old/slides-2/a.svs"), None);
        assert_eq!(relink.apply("file:///other/a.svs"), None);
    }

    #[test]
    fn test_parse_requires_both_sides() {
        assert!(Relink::parse("file:///a").is_err());
        assert!(Relink::parse("=file:///b").is_err());
        let relink = Relink::parse("file:///a.svs=file:///b.svs").unwrap();
        assert_eq!(relink.old, "file:///a.svs");
        assert_eq!(relink.new, "file:///b.svs");
    }
}
