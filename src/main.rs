use anyhow::Context;
use bid_dashboard::core::BidSource;
use bid_dashboard::domain::ports::Clock;
use bid_dashboard::report;
use bid_dashboard::utils::{logger, validation::Validate};
use bid_dashboard::{
    BidApiClient, CliConfig, Dashboard, DashboardConfig, DashboardError, FileCredentialStore,
    OutcomeKind, SystemClock, WithTimeout,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting bid-dashboard");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli.clone().redacted());
    }

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => DashboardConfig::default(),
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        exit_with(&e);
    }

    let client = BidApiClient::new(config.api.endpoint.clone());
    let result = match config.request_timeout() {
        Some(timeout) => run(WithTimeout::new(client, timeout), &cli, &config).await,
        None => run(client, &cli, &config).await,
    };

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => exit_with(&e),
    }
}

async fn run<S: BidSource>(
    source: S,
    cli: &CliConfig,
    config: &DashboardConfig,
) -> bid_dashboard::Result<i32> {
    let clock = SystemClock;
    let range = cli.date_range(clock.now().date())?;
    let store = FileCredentialStore::new(&config.credential.store_path);

    let dashboard = Dashboard::new(source, store, clock, config.dashboard_options()).await?;

    if let Some(key) = &cli.api_key {
        dashboard.set_credential(key.trim()).await?;
        tracing::info!("🔑 API key saved to {}", config.credential.store_path);
    }
    dashboard.set_date_range(range).await;

    let outcome = dashboard.refresh().await;
    let view = dashboard.view();

    let output = report::render(&view, cli.format, clock.now(), config.closing_soon_window())?;
    println!("{}", output);

    let code = match outcome {
        Some(OutcomeKind::Success) | Some(OutcomeKind::EmptyResult) | None => 0,
        Some(OutcomeKind::TransportError) => 2,
        Some(OutcomeKind::DomainError) | Some(OutcomeKind::MalformedItem) => 3,
    };
    Ok(code)
}

fn exit_with(e: &DashboardError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
