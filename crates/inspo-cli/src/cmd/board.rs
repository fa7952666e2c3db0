//! Shared setup for commands that operate on an existing board.

use crate::output::{CliError, OutputMode, fail};
use inspo_core::config::{self, ProjectConfig};
use inspo_core::error::ErrorCode;
use inspo_core::media::{self, UploadReport};
use inspo_core::model::{ProjectItem, ValidationError};
use inspo_core::store::{FileBackend, ItemStore, StoreError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opened board: its root directory, config and a freshly loaded store.
#[derive(Debug)]
pub struct Board {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub store: ItemStore,
}

impl Board {
    pub fn open(start: &Path, output: OutputMode) -> anyhow::Result<Self> {
        let root = config::find_project_root(start).ok_or_else(|| {
            fail(
                output,
                &CliError::from_code(
                    ErrorCode::NotInitialized,
                    "Not an inspo board: .inspo directory not found",
                ),
            )
        })?;
        let config = config::load_project_config(&root).map_err(|e| {
            fail(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            )
        })?;
        let store = ItemStore::new(Arc::new(FileBackend::open(config.storage_path(&root))));
        store.refresh().map_err(|e| store_failure(output, &e))?;
        Ok(Self {
            root,
            config,
            store,
        })
    }

    /// Look up an item by exact id or by a unique id prefix.
    pub fn resolve(&self, input: &str, output: OutputMode) -> anyhow::Result<ProjectItem> {
        let input = input.trim();
        if let Some(item) = self.store.get(input) {
            return Ok(item);
        }
        let mut matches: Vec<ProjectItem> = self
            .store
            .items()
            .into_iter()
            .filter(|item| !input.is_empty() && item.id.starts_with(input))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(fail(
                output,
                &CliError::from_code(ErrorCode::ItemNotFound, format!("item '{input}' not found")),
            )),
            n => Err(fail(
                output,
                &CliError::with_details(
                    format!("'{input}' matches {n} items"),
                    "Use more characters of the id",
                    "ambiguous_id",
                ),
            )),
        }
    }

    /// Upload `paths` through the configured media host. Per-file failures are
    /// reported on stderr (outside JSON mode) and returned in the report.
    pub fn upload(&self, paths: &[PathBuf], output: OutputMode) -> anyhow::Result<UploadReport> {
        if paths.is_empty() {
            return Ok(UploadReport::default());
        }
        let host = self.config.media.build_host(&self.root).map_err(|e| {
            fail(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            )
        })?;
        let report = media::upload_paths(host.as_ref(), paths);
        if !output.is_json() {
            let mut err = std::io::stderr().lock();
            for failure in &report.failures {
                writeln!(err, "warning: skipped {}: {}", failure.name, failure.error)?;
            }
        }
        Ok(report)
    }
}

pub fn store_failure(output: OutputMode, err: &StoreError) -> anyhow::Error {
    fail(output, &CliError::from_code(err.code(), err.to_string()))
}

pub fn invalid(output: OutputMode, err: ValidationError) -> anyhow::Error {
    let suggestion = match err {
        ValidationError::MissingTitle => "Pass a non-blank --title",
        ValidationError::MissingAttachments => "Pass at least one --attach FILE that uploads",
        ValidationError::EmptyComment => "Write some comment text",
        ValidationError::MissingDisplayName => "Run `insp name \"Your Name\"` first",
    };
    fail(
        output,
        &CliError::with_details(err.to_string(), suggestion, err.tag()),
    )
}

/// `name: error` pairs for the JSON form of an upload report.
pub fn failure_rows(report: &UploadReport) -> Vec<UploadFailureRow> {
    report
        .failures
        .iter()
        .map(|f| UploadFailureRow {
            name: f.name.clone(),
            error: f.error.to_string(),
            error_code: f.error.code().code(),
        })
        .collect()
}

#[derive(Debug, serde::Serialize)]
pub struct UploadFailureRow {
    pub name: String,
    pub error: String,
    pub error_code: &'static str,
}
