//! ccmon - Analyze Claude Code usage and cost from local session logs

use ccmon::{
    analyzer::TokenAnalyzer,
    cli::{Cli, Command},
    data_loader::DataLoader,
    error::Result,
    output::get_formatter,
    session_parser::SessionParser,
    time_filter::{RangePreset, TimeFilter},
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The --quiet flag overrides RUST_LOG.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ccmon=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let preset = RangePreset::parse_lossy(&cli.range);
    let time_filter = TimeFilter::from_preset(preset);
    info!("Using time range: {preset}");

    let show_progress = !cli.json && is_terminal::is_terminal(std::io::stdout());
    let loader = DataLoader::new().await?;
    let parser = Arc::new(SessionParser::new(loader).with_progress(show_progress));
    let analyzer = TokenAnalyzer::new(Arc::clone(&parser), time_filter);
    let formatter = get_formatter(cli.json);

    let output = match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => {
            info!("Running usage summary report");
            let summary = analyzer.get_summary().await?;
            formatter.format_summary(&summary)
        }
        Command::Models { by_project } => {
            info!("Running model breakdown report");
            if by_project {
                let rows = analyzer.get_model_by_project_breakdown().await?;
                formatter.format_models_by_project(&rows)
            } else {
                let rows = analyzer.get_model_breakdown().await?;
                formatter.format_models(&rows)
            }
        }
        Command::Projects => {
            info!("Running project breakdown report");
            let rows = analyzer.get_project_breakdown().await?;
            formatter.format_projects(&rows)
        }
        Command::Sessions => {
            info!("Running session report");
            let sessions = parser.get_session_stats(&time_filter).await?;
            formatter.format_sessions(&sessions)
        }
    };

    println!("{output}");
    Ok(())
}
