use std::time::Duration;

use clap::Parser;
use numgen::{ClientConfig, Transport, client, problem};

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// easy, medium or hard
    #[arg(default_value = "easy")]
    difficulty: String,
    #[arg(short, long, env = "NUMGEN_ADDR", default_value = "127.0.0.1:8888")]
    addr: String,
    #[arg(short, long, value_enum, env = "NUMGEN_TRANSPORT", default_value = "socket")]
    transport: Transport,
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 1)]
    retries: u32,
}

fn main() -> numgen::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        retries: cli.retries,
    };

    let numbers = client::connect(cli.transport, &cli.addr, config)?;
    let result = problem::solve(numbers.as_ref(), Some(cli.difficulty.as_str()));
    numbers.close();

    println!("{}", result?.math_problem);
    Ok(())
}
