use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use livecord_core::tasks::DEFAULT_CHECK_INTERVAL;

mod context;
mod server;

use server::run_server;

#[derive(Parser, Debug, Clone)]
#[command(name = "livecord")]
#[command(author, version, about = "Livecord - Twitch go-live notifications for Discord")]
pub struct Args {
    /// Discord bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: String,

    /// Twitch application client id.
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: String,

    /// Twitch application client secret.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Where the JSON configuration document lives.
    #[arg(long, env = "CONFIG_PATH", default_value = "config.json")]
    pub config_path: String,

    /// Seconds between live checks.
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = DEFAULT_CHECK_INTERVAL.as_secs())]
    pub check_interval: u64,

    /// Comma-separated streamers used while the config document lists none.
    #[arg(long, env = "TWITCH_USERNAME")]
    pub twitch_username: Option<String>,

    /// Fallback notification channel id.
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<u64>,

    /// Fallback role id to mention.
    #[arg(long, env = "ROLE_ID")]
    pub role_id: Option<u64>,

    /// Log filter (e.g. "info", "livecord_core=debug"); overrides RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    info!(
        config = %args.config_path,
        interval_secs = args.check_interval,
        "Livecord starting"
    );

    if let Err(e) = run_server(args).await {
        error!("Server error: {e}");
        return Err(e.into());
    }
    Ok(())
}
