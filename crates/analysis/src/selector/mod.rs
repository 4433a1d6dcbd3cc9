//! File selection: walks a repository root, applies the extension allow-list,
//! exclusion globs, and size/count ceilings, and produces a deterministically
//! ordered file set. Read-only; every rejection is recorded, never silent.

use crate::core::AnalysisConfig;
use crate::parser::Language;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One selected source file. Immutable once loaded; shared read-only by the
/// downstream stages.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Repo-relative path with `/` separators.
    pub path: String,
    pub language: Language,
    pub content: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    SizeLimit,
    CountLimit,
    Unreadable,
    AiBudget,
    AiFailed,
    AiTimeout,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeLimit => write!(f, "size-limit"),
            Self::CountLimit => write!(f, "count-limit"),
            Self::Unreadable => write!(f, "unreadable"),
            Self::AiBudget => write!(f, "ai-budget"),
            Self::AiFailed => write!(f, "ai-failed"),
            Self::AiTimeout => write!(f, "ai-timeout"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkippedFile {
    pub fn new(path: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct SelectionOutcome {
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedFile>,
    /// True when the eligible set exceeded `max_files`.
    pub truncated: bool,
}

pub struct FileSelector<'a> {
    config: &'a AnalysisConfig,
    exclusions: GlobSet,
}

impl<'a> FileSelector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclusion_patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid exclusion pattern: {}", pattern))?;
            builder.add(glob);
        }
        let exclusions = builder.build()?;
        Ok(Self { config, exclusions })
    }

    /// Enumerate, filter, and load the file set under `root`. The result is
    /// sorted by path; truncation past `max_files` cuts the tail of that
    /// ordering so repeated runs select the same files.
    pub fn select(&self, root: &Path) -> Result<SelectionOutcome> {
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let mut outcome = SelectionOutcome::default();
        let mut candidates: Vec<(String, std::path::PathBuf, Language, u64)> = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");

            // Hidden files and directories are never analysis targets.
            if rel
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
            {
                continue;
            }

            if self.exclusions.is_match(&rel_str) {
                continue;
            }

            let ext = match entry.path().extension().and_then(|e| e.to_str()) {
                Some(ext) => ext,
                None => continue,
            };
            if !self
                .config
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            {
                continue;
            }
            let language = match Language::from_extension(ext) {
                Some(language) => language,
                None => continue,
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.config.max_file_size_bytes {
                debug!(path = %rel_str, size, "file exceeds size ceiling");
                outcome.skipped.push(
                    SkippedFile::new(rel_str, SkipReason::SizeLimit)
                        .with_detail(format!("{} bytes", size)),
                );
                continue;
            }

            candidates.push((rel_str, entry.path().to_path_buf(), language, size));
        }

        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        if candidates.len() > self.config.max_files {
            outcome.truncated = true;
            for (rel, _, _, _) in candidates.drain(self.config.max_files..) {
                outcome
                    .skipped
                    .push(SkippedFile::new(rel, SkipReason::CountLimit));
            }
        }

        for (rel, abs, language, size) in candidates {
            match std::fs::read_to_string(&abs) {
                Ok(content) => outcome.files.push(SourceFile {
                    path: rel,
                    language,
                    content,
                    size,
                }),
                Err(e) => {
                    warn!(path = %rel, error = %e, "could not read file as UTF-8");
                    outcome.skipped.push(
                        SkippedFile::new(rel, SkipReason::Unreadable).with_detail(e.to_string()),
                    );
                }
            }
        }

        Ok(outcome)
    }
}
