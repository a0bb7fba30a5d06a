// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Filesystem-backed import resolver.
//!
//! Keeps a stack of the directories of the sources currently being
//! compiled, so an import inside an imported file resolves relative to that
//! file, not the entry point.

use super::ImportResolver;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolver rooted at the entry source file's directory.
pub struct FsResolver {
    dirs: Vec<PathBuf>,
}

impl FsResolver {
    /// Create a resolver for a compilation whose entry source is at `path`
    /// (`-` means stdin; imports then resolve against the working
    /// directory).
    #[must_use]
    pub fn new(path: &str) -> Self {
        let dir = if path == "-" {
            PathBuf::from(".")
        } else {
            Path::new(path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        };

        Self { dirs: vec![dir] }
    }

    fn current_dir(&self) -> &Path {
        self.dirs.last().map_or_else(|| Path::new("."), PathBuf::as_path)
    }
}

impl ImportResolver for FsResolver {
    fn normalize(&mut self, path: &str) -> Result<PathBuf, String> {
        let joined = self.current_dir().join(path);
        joined
            .canonicalize()
            .map_err(|e| format!("{}: {e}", joined.display()))
    }

    fn open(&mut self, path: &Path) -> Result<Box<dyn Read>, String> {
        let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        self.dirs.push(dir);
        Ok(Box::new(file))
    }

    fn close(&mut self) {
        if self.dirs.len() > 1 {
            self.dirs.pop();
        }
    }
}
