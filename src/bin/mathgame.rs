use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use log::info;
use numgen::{
    ClientConfig, Transport,
    app::{self, AppState},
    client, http_server,
    session::InMemorySessions,
};

#[derive(Parser)]
#[command(author, version)]
struct Args {
    #[arg(short, long, env = "MATHGAME_ADDR", default_value = "127.0.0.1:5000")]
    addr: String,
    /// Address of the number service
    #[arg(long, env = "NUMGEN_ADDR", default_value = "127.0.0.1:8888")]
    numbers_addr: String,
    #[arg(short, long, value_enum, env = "NUMGEN_TRANSPORT", default_value = "socket")]
    transport: Transport,
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 1)]
    retries: u32,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    numgen::init_logging(args.verbose);

    let config = ClientConfig {
        timeout: Duration::from_millis(args.timeout_ms),
        retries: args.retries,
    };
    let numbers: Arc<dyn client::NumberSource> =
        Arc::from(client::connect(args.transport, &args.numbers_addr, config)?);
    info!(
        "Using number service at {} over {:?}",
        args.numbers_addr, args.transport
    );

    let state = AppState {
        numbers: numbers.clone(),
        sessions: Arc::new(InMemorySessions::new()),
    };
    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    let served = http_server::serve(listener, app::router(state)).await;

    numbers.close();
    info!("Number service client closed");
    Ok(served?)
}
