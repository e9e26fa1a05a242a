//! Handler for the `run` command.

use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::ConfigPathArg;
use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Idle consume loops stop well within this; busy ones are aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Run the service in the foreground until Ctrl-C.
///
/// On interrupt idle consume loops tear down their channels. A delivery
/// still in flight after [`SHUTDOWN_GRACE`] is dropped unacknowledged and
/// will be redelivered to the next consumer.
pub async fn execute(args: &ConfigPathArg) -> Result<()> {
    let config = Config::load(&args.config)?;
    config.init_logging();

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", args.config.display());
    output::field("Broker", config.broker.display_url());
    output::field("Queues", config.broker.queues.join(", "));
    info!("proctor starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut service = tokio::spawn(bootstrap::run(config, shutdown_rx));

    let joined = tokio::select! {
        joined = &mut service => joined,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut service).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("In-flight deliveries abandoned");
                    service.abort();
                    return Ok(());
                }
            }
        }
    };

    joined.map_err(|e| Error::Connection(format!("service task aborted: {e}")))??;
    info!("proctor stopped");
    Ok(())
}
