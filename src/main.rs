use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use diffcov::cli::{self, Style};
use diffcov::config::Config;

/// diffcov — Test coverage of the lines added to a GitHub repository,
/// according to its Code Climate coverage reports.
#[derive(Parser)]
#[command(name = "diffcov", version, about)]
struct Cli {
    /// Repository slug on GitHub, e.g. "rails/rails".
    repo: String,

    /// Code Climate API access token.
    #[arg(long, env = "CC_ACCESS_TOKEN", hide_env_values = true)]
    cc_token: String,

    /// GitHub access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// Diff from the newest commit at least this many days old.
    #[arg(long)]
    days_since: u32,

    /// Output style.
    #[arg(long, value_enum, default_value_t = Style::Text)]
    style: Style,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DIFFCOV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("diffcov: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config =
        Config::new(&cli.repo, &cli.cc_token, &cli.github_token, cli.days_since)?.with_env_overrides();

    let output = cli::cmd_report(&config, cli.style)?;
    print!("{output}");
    Ok(())
}
