use std::process::ExitCode;

use clap::Parser;
use pcr_protocol::config::{ClientConfig, ServerKind};
use pcr_protocol::service::{GameClient, SdkAccount};
use pcr_protocol::utils::global_metrics;
use pcr_protocol::utils::logging::init_logging;
use tracing::{error, info};

/// Log a game account in and open its home screen once.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; environment overrides apply when omitted.
    #[clap(long, short)]
    config: Option<String>,

    /// SDK user id.
    #[clap(long, env = "PCR_UID")]
    uid: String,

    /// SDK access key.
    #[clap(long, env = "PCR_ACCESS_KEY")]
    access_key: String,

    /// Platform id sent at login.
    #[clap(long, default_value = "2")]
    platform: String,

    /// Channel id sent at login.
    #[clap(long, default_value = "1")]
    channel: String,

    /// Use the channel server instead of the default one.
    #[clap(long)]
    channel_server: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path),
        None => ClientConfig::from_env(),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if args.channel_server {
        config.server.kind = ServerKind::Channel;
    }

    init_logging(&config.logging);

    let account = SdkAccount::new(args.uid, args.access_key, args.platform, args.channel);
    let mut client = match GameClient::connect(account, &config).await {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Failed to connect");
            return ExitCode::FAILURE;
        }
    };

    let code = match client.home_index().await {
        Ok(home) => {
            info!(
                viewer_id = client.engine().session().viewer_id(),
                daily_reset_time = home.data.daily_reset_time,
                "Home screen opened"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, api_code = ?err.api_code(), "home/index failed");
            ExitCode::FAILURE
        }
    };

    client.close();
    global_metrics().log_metrics();
    code
}
