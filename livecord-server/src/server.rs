use tokio::sync::watch;
use tracing::{error, info, warn};

use livecord_core::Error;
use livecord_core::platforms::discord::DiscordRuntime;
use livecord_core::tasks::spawn_live_poll_task;

use crate::Args;
use crate::context::ServerContext;

pub async fn run_server(args: Args) -> Result<(), Error> {
    let ServerContext {
        mut engine,
        commands,
        discord_http,
        check_interval,
    } = ServerContext::new(&args)?;

    // A broken config document is fatal here rather than on the first tick.
    engine.rehydrate().await?;
    if let Err(e) = engine.prime().await {
        warn!(error = %e, "Startup live check failed; continuing with stored message ids");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll = spawn_live_poll_task(engine, check_interval, shutdown_rx);

    let mut discord = DiscordRuntime::new(args.discord_token.clone(), discord_http, commands);
    if let Err(e) = discord.connect().await {
        error!("Discord gateway unavailable, slash commands disabled: {e}");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Ctrl-C handler error: {e:?}");
    }
    info!("Ctrl-C received; shutting down.");

    let _ = shutdown_tx.send(true);
    if let Err(e) = poll.await {
        error!("Live poll task ended abnormally: {e}");
    }
    discord.disconnect().await;

    info!("Server shutdown complete.");
    Ok(())
}
