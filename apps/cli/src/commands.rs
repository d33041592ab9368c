//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use articlelift_core::{EnhancePipeline, Outcome, ProgressReporter, RunSummary, seed_articles};
use articlelift_shared::{AppConfig, init_config, load_config, validate_api_keys};
use articlelift_store::ArticleStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ArticleLift — rewrite blog articles with search-grounded LLM context.
#[derive(Parser)]
#[command(
    name = "articlelift",
    version,
    about = "Enhance backlog articles using the pages that outrank them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one enhancement pass over the article backlog.
    Run,

    /// Seed the article store by scraping the configured blog listing.
    Seed,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "articlelift=info",
        1 => "articlelift=debug",
        _ => "articlelift=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run => cmd_run().await,
        Command::Seed => cmd_seed().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_run() -> Result<()> {
    // Validate API keys before doing anything
    let config = load_config()?;
    validate_api_keys(&config)?;

    info!(store = %config.store.base_url, "starting enhancement run");

    let pipeline = EnhancePipeline::from_config(&config)?;
    let reporter = CliProgress::new();
    let summary = pipeline.run(&reporter).await?;

    print_run_summary(&summary);
    Ok(())
}

async fn cmd_seed() -> Result<()> {
    let config = load_config()?;
    let store = ArticleStore::new(&config.store)?;

    info!(listing = %config.seed.listing_url, "seeding article store");

    let summary = seed_articles(&config.seed, &store).await?;

    println!();
    println!("  Seeding complete!");
    println!("  Source:   {}", if summary.from_fallback { "sample set" } else { "scraped listing" });
    println!("  Parsed:   {}", summary.attempted);
    println!("  Created:  {}", summary.created);
    println!();

    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("  Enhancement run complete!");
    println!("  Backlog:   {}", summary.backlog);
    println!("  Eligible:  {}", summary.eligible);
    println!("  Enhanced:  {}", summary.enhanced);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());

    let skips: Vec<_> = summary
        .outcomes
        .iter()
        .filter_map(|(id, outcome)| match outcome {
            Outcome::Skipped(reason) => Some((id, reason)),
            Outcome::Enhanced { .. } => None,
        })
        .collect();

    if !skips.is_empty() {
        println!();
        for (id, reason) in skips {
            println!("  skipped article {id}: {reason}");
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_started(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enhancing [{current}/{total}] {title}"));
    }

    fn article_finished(&self, title: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Enhanced { references } => {
                self.spinner
                    .println(format!("  ✔ {title} ({references} references)"));
            }
            Outcome::Skipped(reason) => {
                self.spinner.println(format!("  ✘ {title}: {reason}"));
            }
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
