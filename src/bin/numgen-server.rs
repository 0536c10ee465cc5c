use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;
use numgen::{NumberServer, Transport, http_server, socket_server};

#[derive(Parser)]
#[command(author, version)]
struct Args {
    #[arg(short, long, env = "NUMGEN_ADDR", default_value = "127.0.0.1:8888")]
    addr: String,
    #[arg(short, long, value_enum, env = "NUMGEN_TRANSPORT", default_value = "socket")]
    transport: Transport,
    /// Drop socket connections that send no request for this long
    #[arg(long, default_value_t = 1000)]
    request_timeout_ms: u64,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    numgen::init_logging(args.verbose);
    info!("CARGO_PKG_VERSION: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Starting number server on {} over {:?}",
        args.addr, args.transport
    );

    match args.transport {
        Transport::Socket => {
            let server = NumberServer::bind(&args.addr)?
                .with_request_timeout(Duration::from_millis(args.request_timeout_ms));
            socket_server::shutdown_on_ctrl_c(server.shutdown_handle())?;
            server.run()?;
        }
        Transport::Http => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let listener = tokio::net::TcpListener::bind(&args.addr).await?;
                http_server::serve(listener, http_server::router()).await
            })?;
        }
    }

    Ok(())
}
