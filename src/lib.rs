#![warn(missing_docs)]
//! genbatch - sequential batch image generation.
//!
//! Takes an ordered list of named prompts, asks an image generator for one
//! image per prompt, and places each result in an output directory as
//! `<name>.<ext>`. Per-item failures are tallied and reported; they never
//! stop the batch.
//!
//! # Quick Start
//!
//! ```no_run
//! use genbatch::{BatchRunner, GeminiProvider, ProviderGenerator, WorkItem};
//!
//! #[tokio::main]
//! async fn main() -> genbatch::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let generator = ProviderGenerator::new(provider, "/tmp/genbatch");
//!
//!     let items = vec![
//!         WorkItem::new("corn-tortillas", "A stack of corn tortillas on a wooden board"),
//!         WorkItem::new("logo", "Minimalist tortilla logo, warm earth tones"),
//!     ];
//!
//!     let summary = BatchRunner::new("public/images").run(&items, &generator).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini-image`: Gemini (Google) provider
//! - `cli`: the `genbatch` command-line tool

mod error;

pub mod batch;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod image;

// Re-export error types at crate root
pub use error::{GenBatchError, Result};

pub use batch::{
    load_manifest, BatchObserver, BatchRunner, ItemFailure, ItemOutcome, JobSummary,
    TransferPolicy, WorkItem,
};
pub use config::RunConfig;
pub use generator::{GenerationResult, ImageGenerator, ProviderGenerator};
pub use image::{GeneratedImage, GenerationRequest, ImageFormat, ImageProvider};

#[cfg(feature = "gemini-image")]
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{BatchRunner, JobSummary, WorkItem};
    pub use crate::error::{GenBatchError, Result};
    pub use crate::generator::{GenerationResult, ImageGenerator};
    pub use crate::image::ImageProvider;

    #[cfg(feature = "gemini-image")]
    pub use crate::image::providers::GeminiProvider;
}
