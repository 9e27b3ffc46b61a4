//! Run configuration resolved from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GENBATCH_OUTPUT_DIR` | `public/images` |
//! | `GENBATCH_STAGING_DIR` | `<tmp>/genbatch` |
//! | `GENBATCH_FORMAT` | `png` |
//! | `GENBATCH_TRANSFER` | `copy` |
//! | `GENBATCH_MODEL` | provider default |
//!
//! The API key is not part of this struct; providers read it themselves
//! when they are built.

use crate::batch::{BatchRunner, TransferPolicy};
use crate::error::{GenBatchError, Result};
use crate::image::ImageFormat;
use std::path::PathBuf;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "public/images";

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Where final files are placed.
    pub output_dir: PathBuf,
    /// Where the generator writes artifacts before transfer.
    pub staging_dir: PathBuf,
    /// Output format; its extension names every file.
    pub format: ImageFormat,
    /// Copy or move from staging into the output directory.
    pub transfer: TransferPolicy,
    /// Provider model name, if overridden.
    pub model: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            staging_dir: std::env::temp_dir().join("genbatch"),
            format: ImageFormat::default(),
            transfer: TransferPolicy::default(),
            model: None,
        }
    }
}

impl RunConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("GENBATCH_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("GENBATCH_STAGING_DIR") {
            config.staging_dir = PathBuf::from(dir);
        }
        if let Some(format) = get("GENBATCH_FORMAT") {
            config.format = format
                .parse()
                .map_err(|e| prefix_key("GENBATCH_FORMAT", e))?;
        }
        if let Some(transfer) = get("GENBATCH_TRANSFER") {
            config.transfer = transfer
                .parse()
                .map_err(|e| prefix_key("GENBATCH_TRANSFER", e))?;
        }
        config.model = get("GENBATCH_MODEL");

        Ok(config)
    }

    /// Builds a runner for this configuration.
    pub fn runner(&self) -> BatchRunner {
        BatchRunner::new(&self.output_dir)
            .with_format(self.format)
            .with_transfer(self.transfer)
    }

    /// Resolves the configured Gemini model, or the default one.
    #[cfg(feature = "gemini-image")]
    pub fn gemini_model(&self) -> Result<crate::image::providers::GeminiModel> {
        match &self.model {
            Some(name) => name.parse(),
            None => Ok(Default::default()),
        }
    }
}

fn prefix_key(key: &str, err: GenBatchError) -> GenBatchError {
    match err {
        GenBatchError::Config(msg) => GenBatchError::Config(format!("{key}: {msg}")),
        other => other,
    }
}
