use analytics::{GibbsSampler, PosteriorSummary};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use configuration::{Config, OutputFormat};
use std::path::PathBuf;

/// The main entry point for the Bayesian Sharpe estimator.
fn main() -> Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Estimate(args) => handle_estimate(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Bayesian Sharpe ratio estimation for fat-tailed returns.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the posterior of the Sharpe ratio for the configured return series.
    Estimate(EstimateArgs),
}

#[derive(Parser)]
struct EstimateArgs {
    /// Path to the configuration file (defaults to ./config.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides sampler.seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides sampler.n_iter.
    #[arg(long)]
    n_iter: Option<usize>,

    /// Overrides sampler.burn_in.
    #[arg(long)]
    burn_in: Option<usize>,

    /// Overrides sampler.nu (Student-t degrees of freedom).
    #[arg(long)]
    nu: Option<f64>,

    /// Overrides report.format.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

// ==============================================================================
// Estimate Command Logic
// ==============================================================================

fn handle_estimate(args: EstimateArgs) -> Result<()> {
    let mut config = configuration::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid command-line overrides")?;

    // Held until the end of the command so buffered log lines are flushed.
    let _log_guard = configuration::init_tracing(&config.logging)
        .context("Failed to initialise logging")?;

    tracing::info!(
        observations = config.data.returns.len(),
        n_iter = config.sampler.n_iter,
        burn_in = config.sampler.burn_in,
        seed = config.sampler.seed,
        "Estimating posterior Sharpe ratio."
    );

    let sampler = GibbsSampler::new(config.sampler.clone())?;
    let samples = sampler
        .sample(&config.data.returns)
        .context("Gibbs sampling failed")?;

    let summary = PosteriorSummary::from_samples(
        &samples,
        config.report.credible_level,
        config.report.periods_per_year,
    )?;

    match config.report.format {
        OutputFormat::Table => println!("{}", render_table(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &EstimateArgs) {
    if let Some(seed) = args.seed {
        config.sampler.seed = seed;
    }
    if let Some(n_iter) = args.n_iter {
        config.sampler.n_iter = n_iter;
    }
    if let Some(burn_in) = args.burn_in {
        config.sampler.burn_in = burn_in;
    }
    if let Some(nu) = args.nu {
        config.sampler.nu = nu;
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
}

fn render_table(summary: &PosteriorSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Quantity", "Posterior mean", "Posterior std"]);

    table.add_row(vec![
        "mu".to_string(),
        format!("{:.6}", summary.mu.mean),
        format!("{:.6}", summary.mu.std_dev),
    ]);
    table.add_row(vec![
        "sigma^2".to_string(),
        format!("{:.6e}", summary.sigma2.mean),
        format!("{:.6e}", summary.sigma2.std_dev),
    ]);
    table.add_row(vec![
        "Sharpe".to_string(),
        format!("{:.4}", summary.sharpe.mean),
        format!("{:.4}", summary.sharpe.std_dev),
    ]);

    let interval = &summary.sharpe_interval;
    table.add_row(vec![
        format!("Sharpe {:.0}% CI", interval.level * 100.0),
        format!("[{:.4}, {:.4}]", interval.lower, interval.upper),
        String::new(),
    ]);
    table.add_row(vec![
        "P(Sharpe > 0)".to_string(),
        format!("{:.1}%", summary.prob_sharpe_positive * 100.0),
        String::new(),
    ]);
    if let Some(annualized) = summary.annualized_sharpe_mean {
        table.add_row(vec![
            "Annualized Sharpe".to_string(),
            format!("{:.4}", annualized),
            String::new(),
        ]);
    }
    table.add_row(vec!["Samples".to_string(), summary.n_samples.to_string(), String::new()]);

    table
}
