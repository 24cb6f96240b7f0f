// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scoped project access that always ends in a save

use super::Project;
use crate::error::Result;
use std::ops::{Deref, DerefMut};

/// A project that is saved when the session ends.
///
/// Call [`ProjectSession::close`] to save and observe the result. A session
/// dropped without closing (including during unwinding) still saves, and
/// logs a failed save instead of reporting it.
#[derive(Debug)]
pub struct ProjectSession {
    project: Project,
    closed: bool,
}

impl ProjectSession {
    pub(super) fn new(project: Project) -> Self {
        Self {
            project,
            closed: false,
        }
    }

    /// Save and end the session
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.project.save()
    }
}

impl Deref for ProjectSession {
    type Target = Project;

    fn deref(&self) -> &Project {
        &self.project
    }
}

impl DerefMut for ProjectSession {
    fn deref_mut(&mut self) -> &mut Project {
        &mut self.project
    }
}

impl Drop for ProjectSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.project.save() {
            tracing::error!("Failed to save {} on session end: {}", self.project.path().display(), e);
        }
    }
}
