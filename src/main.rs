#[macro_use]
extern crate log;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use h2ping::configuration::{Configuration, Parser};
use h2ping::{session, transport};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Configuration::parse();
    args.validate().expect("Configuration is broken!");

    info!("Configuration valid. Starting up...");

    let out = match args.open_outfile() {
        Ok(out) => out,
        Err(e) => {
            error!("Cannot open output file {}: {}", args.outfile, e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Got SIGINT. Terminating.");
                cancel.cancel();
            }
        });
    }

    let stream = match transport::connect(&args.host, args.port).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Cannot connect to {}:{}: {}", args.host, args.port, e);
            std::process::exit(1);
        }
    };
    info!("Connected to {}:{}", args.host, args.port);

    let interval = Duration::from_secs(args.interval);
    match session::run_session(stream, interval, out, cancel).await {
        Ok(snapshot) => snapshot.print(args.summary_format),
        Err(e) => {
            error!("Session failed: {}", e);
            std::process::exit(1);
        }
    }
}
