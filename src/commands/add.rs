// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Add images to a project - files directly, directories recursively

use crate::config::Config;
use crate::entry::ImageType;
use crate::project::Project;
use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run add command
pub fn run(
    project_path: &Path,
    paths: &[PathBuf],
    image_type: Option<&str>,
    glob: Option<&str>,
    config: &Config,
) -> Result<()> {
    let image_type = image_type
        .map(str::parse::<ImageType>)
        .transpose()
        .context("Invalid --type")?;
    let matcher = glob
        .map(|pattern| Glob::new(pattern).map(|g| g.compile_matcher()))
        .transpose()
        .context("Invalid --glob pattern")?;

    let candidates = collect_candidates(paths, matcher.as_ref());
    if candidates.is_empty() {
        anyhow::bail!("No images to add");
    }

    let skipped = Project::builder(project_path)
        .create(false)
        .config(config.clone())
        .with_session(|project| -> Result<Vec<(&Path, String)>> {
            let mut skipped = Vec::new();
            for path in &candidates {
                match project.add_image(path, image_type) {
                    Ok(entry) => println!("Added [{}] {}", entry.id(), entry.image_name()),
                    Err(e) => {
                        tracing::debug!("add_image failed for {}: {:?}", path.display(), e);
                        skipped.push((path.as_path(), e.to_string()));
                    }
                }
            }
            Ok(skipped)
        })
        .with_context(|| format!("Failed to update project at {}", project_path.display()))?;

    for (path, reason) in &skipped {
        println!("Skipped {}: {}", path.display(), reason);
    }
    println!(
        "Added {} of {} images",
        candidates.len() - skipped.len(),
        candidates.len()
    );
    if !skipped.is_empty() {
        anyhow::bail!("{} images could not be added", skipped.len());
    }
    Ok(())
}

/// Expand directories into the files below them that match `matcher`.
///
/// Files named explicitly are always kept; the glob only filters what a
/// directory walk finds, matched against the path relative to that directory.
fn collect_candidates(paths: &[PathBuf], matcher: Option<&GlobMatcher>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if !path.is_dir() {
            out.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Cannot read {}: {}", path.display(), err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                matcher.map_or(true, |m| {
                    e.path()
                        .strip_prefix(path)
                        .is_ok_and(|relative| m.is_match(relative))
                })
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        found.sort();
        tracing::debug!("Found {} files under {}", found.len(), path.display());
        out.extend(found);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directories_are_walked_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("batch/nested")).unwrap();
        fs::write(dir.path().join("batch/a.svs"), b"x").unwrap();
        fs::write(dir.path().join("batch/nested/b.svs"), b"x").unwrap();
        fs::write(dir.path().join("batch/notes.txt"), b"x").unwrap();

        let matcher = Glob::new("**/*.svs").unwrap().compile_matcher();
        let found = collect_candidates(&[dir.path().join("batch")], Some(&matcher));
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.svs", "b.svs"]);

        let all = collect_candidates(&[dir.path().join("batch")], None);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_explicit_files_bypass_glob() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.tif");
        fs::write(&file, b"x").unwrap();
        let matcher = Glob::new("*.svs").unwrap().compile_matcher();
        assert_eq!(collect_candidates(&[file.clone()], Some(&matcher)), vec![file]);
    }
}
