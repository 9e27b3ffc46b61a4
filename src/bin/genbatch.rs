//! CLI for genbatch - batch image generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use genbatch::batch::{BatchObserver, ItemOutcome, TransferPolicy, WorkItem};
use genbatch::image::{ImageFormat, ImageProvider};
use genbatch::{catalog, GeminiProvider, ProviderGenerator, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when a non-empty batch produced no files at all.
const EXIT_ALL_FAILED: u8 = 2;

/// Log filter used when `RUST_LOG` is unset.
///
/// The console observer already prints each failure, so human output only
/// lets errors through; `--json` keeps warnings on stderr.
fn default_log_filter(json_output: bool) -> &'static str {
    if json_output {
        "genbatch=warn"
    } else {
        "genbatch=error"
    }
}

#[derive(Parser)]
#[command(name = "genbatch")]
#[command(about = "Generate a batch of images from named prompts and place them in a directory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch (the default when no command is given)
    Run(RunArgs),

    /// List built-in batches
    List,

    /// Check that the provider is reachable and the API key works
    Check(CheckArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// Built-in batch to run
    #[arg(default_value = catalog::DEFAULT_BATCH, conflicts_with = "manifest")]
    batch: String,

    /// JSON file with [{"name", "prompt"}, ...] to run instead of a built-in batch
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Directory the images are placed in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory the generator writes to before files are placed
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Output format (sets the file extension)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Copy or move generated files into the output directory
    #[arg(short, long, value_enum)]
    transfer: Option<TransferArg>,

    /// Gemini model (nano-banana, nano-banana-pro)
    #[arg(long)]
    model: Option<String>,

    /// Seed for deterministic generation
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct CheckArgs {
    /// Gemini model (nano-banana, nano-banana-pro)
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
            FormatArg::Webp => ImageFormat::WebP,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransferArg {
    Copy,
    Move,
}

impl From<TransferArg> for TransferPolicy {
    fn from(arg: TransferArg) -> Self {
        match arg {
            TransferArg::Copy => TransferPolicy::Copy,
            TransferArg::Move => TransferPolicy::Move,
        }
    }
}

/// Prints per-item progress to stdout.
struct ConsoleObserver {
    style: Option<&'static str>,
}

impl BatchObserver for ConsoleObserver {
    fn item_started(&self, index: usize, total: usize, item: &WorkItem) {
        println!("\n[{index}/{total}] Generating: {}", item.name);
        if let Some(style) = self.style {
            println!("   Style: {style}");
        }
    }

    fn item_finished(&self, _index: usize, _total: usize, _item: &WorkItem, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Placed { target } => println!("   Saved: {}", target.display()),
            ItemOutcome::Failed(failure) => println!("   Failed: {failure}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.json).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default_batch())) {
        Commands::Run(args) => run_batch(args, cli.json).await,
        Commands::List => {
            list_batches(cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => {
            check_provider(args, cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

impl RunArgs {
    fn default_batch() -> Self {
        Self {
            batch: catalog::DEFAULT_BATCH.to_string(),
            ..Self::default()
        }
    }

    fn apply(&self, config: &mut RunConfig) {
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(ref dir) = self.staging_dir {
            config.staging_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format.into();
        }
        if let Some(transfer) = self.transfer {
            config.transfer = transfer.into();
        }
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
    }
}

async fn run_batch(args: RunArgs, json_output: bool) -> anyhow::Result<ExitCode> {
    let mut config = RunConfig::from_env()?;
    args.apply(&mut config);

    let (label, style, items) = match args.manifest {
        Some(ref path) => (path.display().to_string(), None, genbatch::load_manifest(path)?),
        None => {
            let Some(batch) = catalog::find(&args.batch) else {
                let names: Vec<_> = catalog::all().iter().map(|b| b.name).collect();
                anyhow::bail!(
                    "unknown batch '{}' (available: {})",
                    args.batch,
                    names.join(", ")
                );
            };
            (batch.name.to_string(), batch.style, batch.items())
        }
    };

    // Resolve the credential before anything is generated
    let provider = GeminiProvider::builder()
        .model(config.gemini_model()?)
        .build()?;
    let mut generator = ProviderGenerator::new(provider, &config.staging_dir);
    if let Some(seed) = args.seed {
        generator = generator.with_seed(seed);
    }

    let runner = config.runner();

    let summary = if json_output {
        runner.run(&items, &generator).await?
    } else {
        println!("Generating {} images from '{label}'", items.len());
        println!("{}", "=".repeat(60));
        runner
            .run_with_observer(&items, &generator, &ConsoleObserver { style })
            .await?
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n{}", "=".repeat(60));
        println!("{summary}");
    }

    if summary.all_failed() {
        return Ok(ExitCode::from(EXIT_ALL_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

async fn check_provider(args: CheckArgs, json_output: bool) -> anyhow::Result<()> {
    let mut config = RunConfig::from_env()?;
    if let Some(model) = args.model {
        config.model = Some(model);
    }

    let model = config.gemini_model()?;
    let provider = GeminiProvider::builder().model(model).build()?;
    provider.health_check().await?;

    if json_output {
        let result = serde_json::json!({
            "provider": provider.kind().to_string(),
            "model": model.as_str(),
            "ok": true,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} ready (model {})", provider.name(), model.as_str());
    }
    Ok(())
}

fn list_batches(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct BatchInfo {
        name: &'static str,
        description: &'static str,
        items: Vec<WorkItem>,
    }

    let batches: Vec<BatchInfo> = catalog::all()
        .iter()
        .map(|b| BatchInfo {
            name: b.name,
            description: b.description,
            items: b.items(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&batches)?);
    } else {
        println!("Built-in batches:\n");
        for b in &batches {
            let marker = if b.name == catalog::DEFAULT_BATCH {
                " (default)"
            } else {
                ""
            };
            println!("  {}{} - {}", b.name, marker, b.description);
            for item in &b.items {
                println!("    {}", item.name);
            }
        }
    }

    Ok(())
}
