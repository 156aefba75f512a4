use anyhow::Result;
use clap::{Parser, Subcommand};
use costctl::config::{self, Config, MissingSkuPolicy};
use costctl::estimate::{EstimateOptions, EstimateRequest, Estimator};
use costctl::exit_codes::exit_code_for_anyhow;
use costctl::pricing::{FetchOutcome, PriceFetcher};
use costctl::recommend::recommend;
use costctl::report::{self, OutputFormat};
use costctl::validation::validate_region;
use costctl::{CostctlError, PriceTolerance};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "costctl")]
#[command(
    about = "Estimate monthly VM cost for server roles",
    long_about = "costctl sizes a fixed set of server roles from a subscriber count and a price tolerance,\nlooks up current hourly VM prices and reports the monthly cost per role and in total.\n\nPrice tolerances:\n  - cost-optimized\n  - balanced\n  - performance-first"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "COSTCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the monthly cost of the recommended VMs
    Estimate {
        /// Number of subscribers
        #[arg(short, long)]
        subscribers: u64,
        /// Price tolerance (cost-optimized, balanced, performance-first)
        #[arg(short, long)]
        tolerance: String,
        /// ARM region code (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,
        /// Billable hours in a month
        #[arg(long)]
        hours: Option<f64>,
        /// What to do when a recommended SKU has no price (skip, fail)
        #[arg(long)]
        missing_sku: Option<String>,
    },
    /// Show the VM recommended for each role (no network access)
    Recommend {
        /// Number of subscribers
        #[arg(short, long)]
        subscribers: u64,
        /// Price tolerance (cost-optimized, balanced, performance-first)
        #[arg(short, long)]
        tolerance: String,
    },
    /// Fetch and print hourly VM prices
    Prices {
        /// ARM region code (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,
        /// Only show these SKUs
        #[arg(long)]
        sku: Vec<String>,
    },
    /// Print the active role catalog
    Catalog,
    /// Write a default configuration file
    Init {
        /// Path of the config file to write
        #[arg(short, long = "path", default_value = ".costctl.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let output = cli.output;

    match cli.command {
        Commands::Estimate {
            subscribers,
            tolerance,
            region,
            hours,
            missing_sku,
        } => {
            let tolerance: PriceTolerance = tolerance.parse().map_err(CostctlError::from)?;
            let mut options = EstimateOptions::from(&config.estimate);
            if let Some(policy) = missing_sku {
                options.missing_sku = policy
                    .parse::<MissingSkuPolicy>()
                    .map_err(CostctlError::from)?;
            }
            let request = EstimateRequest::new(subscribers, tolerance)
                .with_region(region.unwrap_or_else(|| config.pricing.region.clone()))
                .with_hours(hours.unwrap_or(config.estimate.hours_in_month));

            let catalog = config.catalog().map_err(CostctlError::from)?;
            let fetcher = PriceFetcher::from_config(&config.pricing)?;
            let estimator = Estimator::new(&catalog, &fetcher, options);

            let spinner = spinner(output, "Fetching VM prices...");
            let result = estimator.estimate(&request).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let report = result?;

            match output {
                OutputFormat::Json => println!("{}", report::to_json(&report)?),
                OutputFormat::Text => print!("{}", report::render_cost_report(&report)),
            }
        }
        Commands::Recommend {
            subscribers,
            tolerance,
        } => {
            let tolerance: PriceTolerance = tolerance.parse().map_err(CostctlError::from)?;
            let catalog = config.catalog().map_err(CostctlError::from)?;
            let recs = recommend(&catalog, subscribers, tolerance)?;
            match output {
                OutputFormat::Json => println!("{}", report::to_json(&recs)?),
                OutputFormat::Text => print!("{}", report::render_recommendations(subscribers, &recs)),
            }
        }
        Commands::Prices { region, sku } => {
            let region = region.unwrap_or_else(|| config.pricing.region.clone());
            validate_region(&region)?;
            let fetcher = PriceFetcher::from_config(&config.pricing)?;

            let spinner = spinner(output, "Fetching VM prices...");
            let outcome = fetcher.fetch_prices(&region).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            let mut prices = match outcome {
                FetchOutcome::Complete { prices, .. } => prices,
                FetchOutcome::Partial { prices, error, .. } => {
                    eprintln!("WARNING: price list is incomplete: {}", error);
                    prices
                }
                FetchOutcome::Failed { error, .. } => {
                    return Err(CostctlError::PricingUnavailable {
                        region,
                        reason: error.to_string(),
                    }
                    .into());
                }
            };
            if !sku.is_empty() {
                prices.retain_skus(&sku);
            }
            match output {
                OutputFormat::Json => println!("{}", report::to_json(&prices)?),
                OutputFormat::Text => print!("{}", report::render_prices(&region, &prices)),
            }
        }
        Commands::Catalog => {
            let catalog = config.catalog().map_err(CostctlError::from)?;
            match output {
                OutputFormat::Json => println!("{}", report::to_json(&catalog)?),
                OutputFormat::Text => print!("{}", report::render_catalog(&catalog)),
            }
        }
        Commands::Init { path } => {
            config::init_config(&path)?;
        }
    }

    Ok(())
}

fn spinner(output: OutputFormat, message: &'static str) -> Option<ProgressBar> {
    if output == OutputFormat::Json || !console::Term::stderr().is_term() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
