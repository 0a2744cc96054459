use std::time::Duration;

use tracing::info;

use streakcast::{Config, Engine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("STREAKCAST_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&config_path)?;
    config.init_logging();
    info!(path = %config_path, "Configuration loaded");

    let mut engine = Engine::new(config);
    engine.on_outcome(|outcome| {
        info!(
            id = %outcome.id,
            roll = outcome.roll,
            category = %outcome.category(),
            "Outcome ingested"
        );
        Ok(())
    });
    engine.start().await?;
    info!("Engine started");

    let mut report = tokio::time::interval(Duration::from_secs(60));
    report.tick().await; // the first tick is immediate

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = report.tick() => {
                let status = engine.status();
                let fusion = engine.analyze();
                let alerts = engine.alerts();
                info!(
                    state = ?status.state,
                    predicted = ?fusion.predicted,
                    confidence = fusion.confidence,
                    alerts = alerts.len(),
                    "Periodic analysis"
                );
            }
        }
    }

    engine.stop();
    info!("Engine stopped");
    Ok(())
}
