use fleet::config::AppConfig;
use fleet::Fleet;

/// Small built-in catalog so the binary has something to simulate
/// without requiring an external seed file. Mirrors the teacher's
/// hardcoded `Pair::new("TON".into(), "STON".into())` single-pair
/// bootstrap in `main.rs`.
fn seed_catalog() -> Vec<(corelib::Part, u32)> {
    vec![
        (corelib::Part::new("P1001", "Bolt", "M6 hex bolt"), 200),
        (corelib::Part::new("P2002", "Nut", "M6 hex nut"), 200),
        (corelib::Part::new("P3003", "Washer", "M6 flat washer"), 150),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    common::logger::init_tracing(config.json_logs);

    tracing::info!("Starting warehouse fleet...");

    let fleet = Fleet::start(config.clone(), seed_catalog());

    tracing::info!("Fleet started; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    fleet.stop().await;

    if let Some(path) = config.report_path {
        fleet.handle().write_report(&path);
    }

    Ok(())
}
