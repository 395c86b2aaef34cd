use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use repo_pulse::cli::{Args, Source};
use repo_pulse::config::{FetchConfig, ReportConfig};
use repo_pulse::github::GitHubClient;
use repo_pulse::{generate_analysis, generate_reports, render_file, write_reports, Analysis};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing (logging)
    let default_filter = if args.verbose {
        "repo_pulse=debug"
    } else {
        "repo_pulse=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        let transport = e
            .chain()
            .filter_map(|cause| cause.downcast_ref::<repo_pulse::Error>())
            .any(repo_pulse::Error::is_transport);
        if transport {
            tracing::error!("GitHub could not be reached; check network access, GITHUB_TOKEN and GITHUB_API_URL");
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let now = Utc::now();

    let report_config = match &args.config {
        Some(path) => {
            let config = ReportConfig::load(path)
                .with_context(|| format!("loading config file {}", path.display()))?;
            // Reject unsupported formats before any network traffic.
            config.targets()?;
            Some(config)
        }
        None => None,
    };

    let analysis = match args.source(report_config.as_ref(), now.date_naive())? {
        Source::Import(path) => Analysis::from_file(&path)
            .with_context(|| format!("importing {}", path.display()))?,
        Source::Fetch { repo_id, window } => {
            let client = GitHubClient::new(&FetchConfig::from_env()?)?;
            generate_analysis(&client, &repo_id, &window, now)
                .await
                .with_context(|| format!("generating analysis for {repo_id}"))?
        }
    };

    match &report_config {
        Some(config) => {
            let reports = generate_reports(config, &analysis)?;
            write_reports(&reports)?;
        }
        None => render_file(&analysis, &args.output)?,
    }

    Ok(())
}
