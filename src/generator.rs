//! The generator seam used by the batch runner.
//!
//! [`ImageGenerator`] is the one operation the runner needs:
//! `generate(prompt, filename) -> GenerationResult`. A result is either an
//! artifact on disk or a refusal; an `Err` means the call itself failed.
//! [`ProviderGenerator`] implements it on top of any [`ImageProvider`] by
//! writing each image into a staging directory.

use crate::error::Result;
use crate::image::{GenerationRequest, ImageFormat, ImageProvider};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Outcome of a single generator call that returned normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The artifact was written and is reported at `path`.
    Success {
        /// Where the generator claims the artifact lives.
        path: PathBuf,
    },
    /// The generator declined or failed to produce an artifact.
    Failure {
        /// Reason given by the generator, if any.
        error: Option<String>,
    },
}

impl GenerationResult {
    /// Creates a successful result.
    pub fn success(path: impl Into<PathBuf>) -> Self {
        Self::Success { path: path.into() }
    }

    /// Creates a failed result with an optional reason.
    pub fn failure(error: Option<String>) -> Self {
        Self::Failure { error }
    }

    /// Returns true for [`GenerationResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the reported artifact path on success.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path } => Some(path),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failure reason, if one was attached.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => error.as_deref(),
        }
    }
}

/// Turns a prompt into an image file on disk.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image for `prompt`, naming the artifact `filename`.
    async fn generate(&self, prompt: &str, filename: &str) -> Result<GenerationResult>;
}

/// Adapts an [`ImageProvider`] into an [`ImageGenerator`].
///
/// Images are written to `staging_dir/filename`; the runner then moves or
/// copies them to their final place.
pub struct ProviderGenerator<P> {
    provider: P,
    staging_dir: PathBuf,
    seed: Option<u64>,
}

impl<P: ImageProvider> ProviderGenerator<P> {
    /// Wraps `provider`, staging artifacts under `staging_dir`.
    pub fn new(provider: P, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            staging_dir: staging_dir.into(),
            seed: None,
        }
    }

    /// Uses a fixed seed for every request.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: ImageProvider> ImageGenerator for ProviderGenerator<P> {
    async fn generate(&self, prompt: &str, filename: &str) -> Result<GenerationResult> {
        let wanted = ImageFormat::from_filename(filename);

        let mut request = GenerationRequest::new(prompt);
        if let Some(format) = wanted {
            request = request.with_format(format);
        }
        if let Some(seed) = self.seed {
            request = request.with_seed(seed);
        }

        let image = match self.provider.generate(&request).await {
            Ok(image) => image,
            Err(e) if e.is_refusal() => {
                return Ok(GenerationResult::failure(Some(e.to_string())));
            }
            Err(e) => return Err(e),
        };

        let actual = image.detected_format().unwrap_or(image.format);
        if let Some(wanted) = wanted {
            if wanted != actual {
                tracing::warn!(
                    filename,
                    wanted = wanted.mime_type(),
                    actual = actual.mime_type(),
                    provider = self.provider.name(),
                    "provider returned a different format than the filename implies; saving bytes unchanged"
                );
            }
        }

        std::fs::create_dir_all(&self.staging_dir)?;
        let path = self.staging_dir.join(filename);
        image.save(&path)?;

        tracing::debug!(
            path = %path.display(),
            bytes = image.size(),
            duration_ms = image.metadata.duration_ms,
            "staged generated image"
        );

        Ok(GenerationResult::success(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenBatchError;
    use crate::image::{GeneratedImage, GenerationMetadata, ImageProviderKind};
    use std::sync::Mutex;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    /// Provider that replays one scripted response and records requests.
    struct ScriptedProvider {
        reply: fn() -> Result<GeneratedImage>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(reply: fn() -> Result<GeneratedImage>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
            self.seen.lock().unwrap().push(request.clone());
            (self.reply)()
        }

        fn kind(&self) -> ImageProviderKind {
            ImageProviderKind::Gemini
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn png_image() -> Result<GeneratedImage> {
        Ok(GeneratedImage::new(
            PNG_BYTES.to_vec(),
            ImageFormat::Png,
            ImageProviderKind::Gemini,
            GenerationMetadata::default(),
        ))
    }

    #[test]
    fn test_result_accessors() {
        let ok = GenerationResult::success("/tmp/a.png");
        assert!(ok.is_success());
        assert_eq!(ok.path(), Some(Path::new("/tmp/a.png")));
        assert_eq!(ok.error(), None);

        let failed = GenerationResult::failure(Some("quota".into()));
        assert!(!failed.is_success());
        assert_eq!(failed.path(), None);
        assert_eq!(failed.error(), Some("quota"));
        assert_eq!(GenerationResult::failure(None).error(), None);
    }

    #[tokio::test]
    async fn test_stages_image_under_filename() {
        let staging = tempfile::tempdir().unwrap();
        let staging_dir = staging.path().join("nested/staging");
        let generator =
            ProviderGenerator::new(ScriptedProvider::new(png_image), &staging_dir).with_seed(7);

        let result = generator.generate("a logo", "logo.png").await.unwrap();

        let expected = staging_dir.join("logo.png");
        assert_eq!(result, GenerationResult::success(&expected));
        assert_eq!(std::fs::read(&expected).unwrap(), PNG_BYTES);

        let seen = generator.provider().seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "a logo");
        assert_eq!(seen[0].format, Some(ImageFormat::Png));
        assert_eq!(seen[0].seed, Some(7));
    }

    #[tokio::test]
    async fn test_format_mismatch_keeps_bytes() {
        let staging = tempfile::tempdir().unwrap();
        let generator = ProviderGenerator::new(ScriptedProvider::new(png_image), staging.path());

        let result = generator.generate("a logo", "logo.webp").await.unwrap();

        let expected = staging.path().join("logo.webp");
        assert_eq!(result, GenerationResult::success(&expected));
        assert_eq!(std::fs::read(&expected).unwrap(), PNG_BYTES);
        assert_eq!(
            generator.provider().seen.lock().unwrap()[0].format,
            Some(ImageFormat::WebP)
        );
    }

    #[tokio::test]
    async fn test_refusal_becomes_failure_result() {
        let staging = tempfile::tempdir().unwrap();
        let generator = ProviderGenerator::new(
            ScriptedProvider::new(|| Err(GenBatchError::ContentBlocked("IMAGE_SAFETY".into()))),
            staging.path(),
        );

        let result = generator.generate("x", "x.png").await.unwrap();
        assert_eq!(
            result,
            GenerationResult::failure(Some("content blocked: IMAGE_SAFETY".into()))
        );
        assert!(!staging.path().join("x.png").exists());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let staging = tempfile::tempdir().unwrap();
        let generator = ProviderGenerator::new(
            ScriptedProvider::new(|| Err(GenBatchError::Auth("bad key".into()))),
            staging.path(),
        );

        let err = generator.generate("x", "x.png").await.unwrap_err();
        assert!(matches!(err, GenBatchError::Auth(_)));
    }
}
