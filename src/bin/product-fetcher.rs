//! Command-line front end: fetch a brand's catalog into a JSON file.

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use product_fetcher::api::{BrandFilter, DEFAULT_BASE_URL};
use product_fetcher::credentials::{CredentialKind, Credentials};
use product_fetcher::fetcher::{FetcherBuilder, Strategy, RATE_LIMIT_CAP};
use product_fetcher::paginator::DEFAULT_PAGE_SIZE;
use product_fetcher::progress::{ProgressBarOpts, ProgressDisplay};
use product_fetcher::retry::DEFAULT_MAX_ATTEMPTS;
use product_fetcher::session::RunReport;
use product_fetcher::sink::{BatchFileSink, Finalized, MemorySink, ResultSink};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "products.json";
const DEFAULT_BATCH_OUTPUT: &str = "products_batches.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// One product at a time
    Serial,
    /// A pool of workers
    Pool,
    /// Sequential batches, each appended to the output as it completes
    Batched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CredentialArg {
    /// ACCESS_TOKEN
    Token,
    /// APP_KEY and APP_SECRET
    AppKey,
}

impl From<CredentialArg> for CredentialKind {
    fn from(arg: CredentialArg) -> Self {
        match arg {
            CredentialArg::Token => CredentialKind::AccessToken,
            CredentialArg::AppKey => CredentialKind::AppKeyPair,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "product-fetcher", version)]
#[command(about = "Fetch every product of a brand with its detail record", long_about = None)]
struct Cli {
    /// Brand name; several brands may be separated by commas
    #[arg(env = "PRODUCT_FETCHER_BRAND")]
    brand: String,

    /// Output file [default: products.json, or products_batches.jsonl when batched]
    #[arg(short, long, env = "PRODUCT_FETCHER_OUTPUT")]
    output: Option<PathBuf>,

    /// Detail phase strategy
    #[arg(long, value_enum, default_value = "batched", env = "PRODUCT_FETCHER_STRATEGY")]
    strategy: StrategyArg,

    /// Detail requests in flight (at most 3)
    #[arg(short, long, default_value_t = RATE_LIMIT_CAP, env = "PRODUCT_FETCHER_CONCURRENCY")]
    concurrency: usize,

    /// Products per batch
    #[arg(long, default_value_t = 100, env = "PRODUCT_FETCHER_BATCH_SIZE")]
    batch_size: usize,

    /// Pause between batches, in milliseconds
    #[arg(long, default_value_t = 1000, env = "PRODUCT_FETCHER_BATCH_DELAY_MS")]
    batch_delay_ms: u64,

    /// Products per list page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, env = "PRODUCT_FETCHER_PAGE_SIZE")]
    page_size: u32,

    /// Attempts per request
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, env = "PRODUCT_FETCHER_RETRIES")]
    retries: u32,

    /// API root, optionally with a path prefix
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "PRODUCT_FETCHER_BASE_URL")]
    base_url: String,

    /// Which credentials to read from the environment
    #[arg(long, value_enum, default_value = "token", env = "PRODUCT_FETCHER_CREDENTIALS")]
    credentials: CredentialArg,

    /// Send the brand as one string instead of splitting on commas
    #[arg(long, env = "PRODUCT_FETCHER_LITERAL_BRAND")]
    literal_brand: bool,

    /// Hide the progress bar
    #[arg(short, long, env = "PRODUCT_FETCHER_QUIET")]
    quiet: bool,
}

impl Cli {
    fn strategy(&self) -> Strategy {
        match self.strategy {
            StrategyArg::Serial => Strategy::Serial,
            StrategyArg::Pool => Strategy::WorkerPool,
            StrategyArg::Batched => Strategy::Batched {
                batch_size: self.batch_size,
                batch_delay: Duration::from_millis(self.batch_delay_ms),
            },
        }
    }

    fn output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| match self.strategy {
            StrategyArg::Batched => PathBuf::from(DEFAULT_BATCH_OUTPUT),
            _ => PathBuf::from(DEFAULT_OUTPUT),
        })
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{}: {} product(s) listed (reported {}), {} fetched, {} failed",
        report.brand,
        report.references,
        report.reported_total,
        report.succeeded,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  failed {}: {}", failure.reference, failure.message);
    }
    match &report.finalized {
        Finalized::Saved(path) | Finalized::Unchanged(path) => {
            println!("Saved to {}", path.display())
        }
        Finalized::NothingToSave => println!("No data to save"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.brand.trim().is_empty() {
        return Err(eyre!("Please enter a brand name"));
    }

    let credentials = Credentials::load(cli.credentials.into())
        .wrap_err("Credentials are required to start a fetch")?;

    let opts = if cli.quiet {
        ProgressBarOpts::hidden()
    } else {
        ProgressBarOpts::default()
    };
    let display = ProgressDisplay::new(opts);
    let feed = display.clone();

    let brand_filter = if cli.literal_brand {
        BrandFilter::Literal
    } else {
        BrandFilter::Split
    };

    let fetcher = FetcherBuilder::new()
        .base_url(cli.base_url.clone())
        .page_size(cli.page_size)
        .retries(cli.retries)
        .concurrency(cli.concurrency)
        .strategy(cli.strategy())
        .brand_filter(brand_filter)
        .on_progress(move |p| feed.update(p))
        .build(&credentials)
        .wrap_err("Cannot set up the catalog client")?;

    let output = cli.output();
    let mut sink: Box<dyn ResultSink> = match fetcher.strategy() {
        Strategy::Batched { .. } => Box::new(BatchFileSink::new(&output)),
        _ => Box::new(MemorySink::new(&output)),
    };

    let result = fetcher.fetch(&cli.brand, sink.as_mut()).await;
    display.finish();

    let report = result.wrap_err_with(|| format!("Fetching {:?} failed", cli.brand))?;
    print_report(&report);
    Ok(())
}
