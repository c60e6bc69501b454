//! Reconciliation of generated artifacts with existing target files
//!
//! A strategy decides, per target, whether generation runs at all
//! (`before_generation`) and how the generated fragment is combined with
//! whatever is already on disk (`after_generation`). Strategies are
//! fallible and abort the current target on error; targets already
//! committed are not rolled back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GeneratorError;
use crate::merge::merge_three_way;
use crate::outlet::OutletResult;

/// Per-unit settings the strategies operate under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Directory generated artifacts are written into
    pub target_dir: PathBuf,
    /// Work directory holding generation bookkeeping such as the merge
    /// strategy's raw-output snapshots
    pub work_dir: PathBuf,
    /// Character encoding of text results. Defaults to UTF-8; text is
    /// written as UTF-8 bytes and the name is carried for callers that
    /// transcode downstream.
    pub encoding: String,
}

impl UnitConfig {
    /// Create a config with the UTF-8 default encoding
    pub fn new(target_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            work_dir: work_dir.into(),
            encoding: "UTF-8".to_string(),
        }
    }
}

/// Policy for combining a generated artifact with an existing target
pub trait ExistingTargetStrategy {
    /// Name of the strategy, for configuration and diagnostics
    fn name(&self) -> &'static str;

    /// Whether generation should run for this target at all
    fn before_generation(
        &self,
        output_key: Option<&str>,
        output_path: &Path,
        unit: &UnitConfig,
    ) -> Result<bool, GeneratorError>;

    /// Commit the generated result to the target location
    fn after_generation(
        &self,
        output_key: Option<&str>,
        output_path: &Path,
        result: &OutletResult,
        unit: &UnitConfig,
    ) -> Result<(), GeneratorError>;
}

/// Strategy selector for unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Overwrite the target unconditionally
    Replace,
    /// Skip generation entirely when the target exists
    Skip,
    /// Append the generated content to the existing target
    Append,
    /// Three-way merge against the previous generation snapshot
    Merge,
}

impl StrategyKind {
    /// Construct the strategy this kind names
    pub fn strategy(self) -> Box<dyn ExistingTargetStrategy> {
        match self {
            StrategyKind::Replace => Box::new(ReplaceStrategy),
            StrategyKind::Skip => Box::new(SkipStrategy),
            StrategyKind::Append => Box::new(AppendStrategy),
            StrategyKind::Merge => Box::new(MergeStrategy),
        }
    }
}

fn target_io(path: &Path, source: std::io::Error) -> GeneratorError {
    GeneratorError::TargetIo {
        path: path.to_path_buf(),
        source,
    }
}

fn result_bytes(result: &OutletResult) -> &[u8] {
    match result {
        OutletResult::Text(text) => text.as_bytes(),
        OutletResult::Binary(bytes) => bytes,
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| target_io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| target_io(path, e))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, GeneratorError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(target_io(path, e)),
    }
}

fn read_optional_string(path: &Path) -> Result<Option<String>, GeneratorError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(target_io(path, e)),
    }
}

/// Overwrites the target unconditionally
pub struct ReplaceStrategy;

impl ExistingTargetStrategy for ReplaceStrategy {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn before_generation(
        &self,
        _output_key: Option<&str>,
        _output_path: &Path,
        _unit: &UnitConfig,
    ) -> Result<bool, GeneratorError> {
        Ok(true)
    }

    fn after_generation(
        &self,
        _output_key: Option<&str>,
        output_path: &Path,
        result: &OutletResult,
        unit: &UnitConfig,
    ) -> Result<(), GeneratorError> {
        let target = unit.target_dir.join(output_path);
        write_file(&target, result_bytes(result))?;
        info!(target = %target.display(), "wrote target");
        Ok(())
    }
}

/// Skips generation entirely when the target already exists
pub struct SkipStrategy;

impl ExistingTargetStrategy for SkipStrategy {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn before_generation(
        &self,
        _output_key: Option<&str>,
        output_path: &Path,
        unit: &UnitConfig,
    ) -> Result<bool, GeneratorError> {
        let target = unit.target_dir.join(output_path);
        if target.exists() {
            debug!(target = %target.display(), "target exists, skipping generation");
            return Ok(false);
        }
        Ok(true)
    }

    fn after_generation(
        &self,
        _output_key: Option<&str>,
        output_path: &Path,
        result: &OutletResult,
        unit: &UnitConfig,
    ) -> Result<(), GeneratorError> {
        let target = unit.target_dir.join(output_path);
        write_file(&target, result_bytes(result))?;
        info!(target = %target.display(), "wrote target");
        Ok(())
    }
}

/// Appends the generated content to the existing target
pub struct AppendStrategy;

impl ExistingTargetStrategy for AppendStrategy {
    fn name(&self) -> &'static str {
        "append"
    }

    fn before_generation(
        &self,
        _output_key: Option<&str>,
        _output_path: &Path,
        _unit: &UnitConfig,
    ) -> Result<bool, GeneratorError> {
        Ok(true)
    }

    fn after_generation(
        &self,
        _output_key: Option<&str>,
        output_path: &Path,
        result: &OutletResult,
        unit: &UnitConfig,
    ) -> Result<(), GeneratorError> {
        let target = unit.target_dir.join(output_path);
        let mut combined = read_optional(&target)?.unwrap_or_default();
        combined.extend_from_slice(result_bytes(result));
        write_file(&target, &combined)?;
        info!(target = %target.display(), "appended to target");
        Ok(())
    }
}

/// Three-way merges the generated content with a hand-edited target
///
/// The raw output of the previous run is kept as a snapshot under the
/// unit's work directory and serves as the merge base. Byte results are
/// not mergeable and fail fast.
pub struct MergeStrategy;

impl MergeStrategy {
    /// Snapshot location for a target: the default output location and
    /// keyed alternate locations get separate subtrees.
    fn snapshot_path(unit: &UnitConfig, output_key: Option<&str>, output_path: &Path) -> PathBuf {
        let root = unit.work_dir.join("raw-generated");
        match output_key {
            None => root.join("default").join(output_path),
            Some(key) => root.join("other").join(key).join(output_path),
        }
    }
}

impl ExistingTargetStrategy for MergeStrategy {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn before_generation(
        &self,
        _output_key: Option<&str>,
        _output_path: &Path,
        _unit: &UnitConfig,
    ) -> Result<bool, GeneratorError> {
        Ok(true)
    }

    fn after_generation(
        &self,
        output_key: Option<&str>,
        output_path: &Path,
        result: &OutletResult,
        unit: &UnitConfig,
    ) -> Result<(), GeneratorError> {
        let OutletResult::Text(theirs) = result else {
            return Err(GeneratorError::MergeUnsupported(format!(
                "byte results ({})",
                output_path.display()
            )));
        };

        let target = unit.target_dir.join(output_path);
        let snapshot = Self::snapshot_path(unit, output_key, output_path);

        let base = read_optional_string(&snapshot)?;
        let mine = read_optional_string(&target)?;

        let merged = match (base, mine) {
            // Target was deleted or never existed: take the new output.
            (_, None) => theirs.clone(),
            // Target exists but there is no baseline to reconcile
            // against: keep the developer's file untouched.
            (None, Some(mine)) => {
                debug!(target = %target.display(), "no snapshot, keeping existing target");
                mine
            }
            (Some(base), Some(mine)) => {
                let outcome = merge_three_way(&base, &mine, theirs);
                if outcome.conflicts > 0 {
                    warn!(
                        target = %target.display(),
                        conflicts = outcome.conflicts,
                        "merge produced conflict regions"
                    );
                }
                outcome.content
            }
        };

        write_file(&target, merged.as_bytes())?;
        // The snapshot always becomes the new raw output, so the next
        // run merges against what this run generated.
        write_file(&snapshot, theirs.as_bytes())?;
        info!(target = %target.display(), "merged target");
        Ok(())
    }
}
