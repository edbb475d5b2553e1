//! Command handler for the diffcov CLI.
//!
//! The handler returns its output as a `String`, making it easy to test
//! without capturing stdout.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::codeclimate::{CodeClimate, CoverageService};
use crate::config::Config;
use crate::github::{GitHub, VersionControl};
use crate::reconcile::Reconciler;
use crate::report::{MarkdownFormatter, ReportFormatter, TextFormatter};

/// Output style for the report.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
}

impl Style {
    fn formatter(self) -> &'static dyn ReportFormatter {
        match self {
            Style::Text => &TextFormatter,
            Style::Markdown => &MarkdownFormatter,
        }
    }
}

/// Reconcile against the live GitHub and Code Climate APIs.
pub fn cmd_report(config: &Config, style: Style) -> Result<String> {
    let github = GitHub::new(&config.github_api_url, &config.github_token);
    let codeclimate = CodeClimate::new(&config.cc_api_url, &config.cc_token);
    render_report(&github, &codeclimate, config, style, Utc::now())
}

/// Core report logic, with the gateways and the clock supplied by the caller.
pub fn render_report(
    vcs: &dyn VersionControl,
    coverage: &dyn CoverageService,
    config: &Config,
    style: Style,
    now: DateTime<Utc>,
) -> Result<String> {
    let until = config.until(now);
    let reconciliation = Reconciler::new(vcs, coverage)
        .with_path_filter(config.path_filter.clone())
        .run(&config.repo, until)
        .with_context(|| format!("Failed to compute diff coverage for {}", config.repo))?;

    Ok(style.formatter().format(&reconciliation.report))
}
