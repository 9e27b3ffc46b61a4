//! The batch runner.

use crate::batch::item::{validate_items, WorkItem};
use crate::batch::summary::{ItemFailure, ItemOutcome, JobSummary};
use crate::error::{GenBatchError, Result};
use crate::generator::{GenerationResult, ImageGenerator};
use crate::image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a generated artifact gets into the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPolicy {
    /// Copy the file, leaving the generator's original in place.
    #[default]
    Copy,
    /// Move the file; falls back to copy-then-delete across filesystems.
    Move,
}

impl TransferPolicy {
    /// Returns the lowercase name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

impl std::fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransferPolicy {
    type Err = GenBatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" | "rename" => Ok(Self::Move),
            other => Err(GenBatchError::Config(format!(
                "unknown transfer policy '{other}' (expected copy or move)"
            ))),
        }
    }
}

/// Receives progress notifications while a batch runs.
///
/// `index` is 1-based. Both methods default to doing nothing.
pub trait BatchObserver: Send + Sync {
    /// Called before the generator is invoked for `item`.
    fn item_started(&self, _index: usize, _total: usize, _item: &WorkItem) {}

    /// Called once `item` has an outcome.
    fn item_finished(&self, _index: usize, _total: usize, _item: &WorkItem, _outcome: &ItemOutcome) {
    }
}

impl BatchObserver for () {}

/// Runs work items one at a time and places their artifacts.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    output_dir: PathBuf,
    extension: String,
    transfer: TransferPolicy,
}

impl BatchRunner {
    /// Creates a runner writing `png` files into `output_dir` by copy.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: ImageFormat::default().extension().to_string(),
            transfer: TransferPolicy::default(),
        }
    }

    /// Uses the extension of `format` for every output file.
    pub fn with_format(self, format: ImageFormat) -> Self {
        self.with_extension(format.extension())
    }

    /// Uses a fixed extension (without the dot) for every output file.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Sets the transfer policy.
    pub fn with_transfer(mut self, transfer: TransferPolicy) -> Self {
        self.transfer = transfer;
        self
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the output file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the transfer policy.
    pub fn transfer(&self) -> TransferPolicy {
        self.transfer
    }

    /// Runs the batch without progress notifications.
    pub async fn run<G>(&self, items: &[WorkItem], generator: &G) -> Result<JobSummary>
    where
        G: ImageGenerator + ?Sized,
    {
        self.run_with_observer(items, generator, &()).await
    }

    /// Runs the batch, reporting each item to `observer`.
    ///
    /// Invalid item names and a failure to create the output directory are
    /// returned as errors before any item runs; per-item failures are
    /// recorded in the summary and the batch moves on.
    pub async fn run_with_observer<G, O>(
        &self,
        items: &[WorkItem],
        generator: &G,
        observer: &O,
    ) -> Result<JobSummary>
    where
        G: ImageGenerator + ?Sized,
        O: BatchObserver + ?Sized,
    {
        // Names become file names under output_dir.
        validate_items(items)?;

        std::fs::create_dir_all(&self.output_dir).map_err(|source| GenBatchError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let total = items.len();
        let mut summary = JobSummary::new(total, self.output_dir.clone());

        tracing::info!(
            total,
            output_dir = %self.output_dir.display(),
            transfer = %self.transfer,
            "starting batch"
        );

        for (i, item) in items.iter().enumerate() {
            let index = i + 1;
            observer.item_started(index, total, item);
            tracing::info!(index, total, name = %item.name, "generating");

            let outcome = self.process_item(item, generator).await;
            match &outcome {
                ItemOutcome::Placed { target } => {
                    tracing::info!(name = %item.name, target = %target.display(), "placed");
                }
                ItemOutcome::Failed(failure) => {
                    tracing::warn!(name = %item.name, "item failed: {failure}");
                }
            }

            summary.record(&item.name, &outcome);
            observer.item_finished(index, total, item, &outcome);
        }

        tracing::info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "batch complete"
        );

        Ok(summary)
    }

    async fn process_item<G>(&self, item: &WorkItem, generator: &G) -> ItemOutcome
    where
        G: ImageGenerator + ?Sized,
    {
        let filename = item.filename(&self.extension);

        let source = match generator.generate(&item.prompt, &filename).await {
            Ok(GenerationResult::Success { path }) => path,
            Ok(GenerationResult::Failure { error }) => {
                return ItemOutcome::Failed(ItemFailure::Unsuccessful(error));
            }
            Err(e) => return ItemOutcome::Failed(ItemFailure::Invocation(e.to_string())),
        };

        if !source.exists() {
            return ItemOutcome::Failed(ItemFailure::MissingArtifact(source));
        }

        let target = self.output_dir.join(&filename);
        match self.place(&source, &target) {
            Ok(()) => ItemOutcome::Placed { target },
            Err(e) => ItemOutcome::Failed(ItemFailure::Transfer(e.to_string())),
        }
    }

    fn place(&self, source: &Path, target: &Path) -> std::io::Result<()> {
        // Copying a file onto itself would truncate it.
        if same_file(source, target) {
            return Ok(());
        }

        match self.transfer {
            TransferPolicy::Copy => {
                std::fs::copy(source, target)?;
            }
            TransferPolicy::Move => {
                if let Err(e) = std::fs::rename(source, target) {
                    tracing::debug!("rename failed ({e}), falling back to copy");
                    std::fs::copy(source, target)?;
                    if let Err(e) = std::fs::remove_file(source) {
                        tracing::warn!(
                            source = %source.display(),
                            "placed by copy but could not remove original: {e}"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_policy_from_str() {
        assert_eq!("copy".parse::<TransferPolicy>().unwrap(), TransferPolicy::Copy);
        assert_eq!("MOVE".parse::<TransferPolicy>().unwrap(), TransferPolicy::Move);
        assert_eq!("rename".parse::<TransferPolicy>().unwrap(), TransferPolicy::Move);
        assert!("symlink".parse::<TransferPolicy>().is_err());
        assert_eq!(TransferPolicy::default(), TransferPolicy::Copy);
    }

    #[test]
    fn test_builder_settings() {
        let runner = BatchRunner::new("out")
            .with_format(ImageFormat::WebP)
            .with_transfer(TransferPolicy::Move);
        assert_eq!(runner.extension(), "webp");
        assert_eq!(runner.transfer(), TransferPolicy::Move);
        assert_eq!(runner.output_dir(), Path::new("out"));

        let runner = BatchRunner::new("out").with_extension(".jpg");
        assert_eq!(runner.extension(), "jpg");
    }

    #[test]
    fn test_place_copy_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("staged.png");
        let target = dir.path().join("final.png");
        std::fs::write(&source, b"img").unwrap();

        BatchRunner::new(dir.path()).place(&source, &target).unwrap();

        assert!(source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"img");
    }

    #[test]
    fn test_place_move_removes_original() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("staged.png");
        let target = dir.path().join("final.png");
        std::fs::write(&source, b"img").unwrap();

        BatchRunner::new(dir.path())
            .with_transfer(TransferPolicy::Move)
            .place(&source, &target)
            .unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"img");
    }

    #[test]
    fn test_place_onto_itself_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("same.png");
        std::fs::write(&path, b"keep me").unwrap();

        BatchRunner::new(dir.path()).place(&path, &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }
}
