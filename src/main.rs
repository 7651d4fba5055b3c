mod config;
mod http;
mod serve;
mod server;

use std::process::ExitCode;

use config::Config;
use server::Server;
use server::shutdown;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let srv = match Server::bind(&cfg).await {
        Ok(srv) => srv,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let (handle, signal) = shutdown::channel();
    tokio::spawn(shutdown::wait_for_signal(handle));

    if let Err(e) = srv.run(signal).await {
        tracing::error!("server error: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
