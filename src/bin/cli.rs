//! cgminer CLI Client
//!
//! Sends one command to a cgminer API and prints the result.

use clap::Parser;
use cgminer_api::{Client, Command, Config, Context, Format};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// cgminer API CLI
#[derive(Parser, Debug)]
#[command(name = "cgminer-cli")]
#[command(about = "Query and control cgminer over its TCP API")]
#[command(version)]
struct Args {
    /// API hostname or address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// API port
    #[arg(short, long, default_value_t = cgminer_api::DEFAULT_PORT)]
    port: u16,

    /// Dial timeout and response deadline in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Use the legacy plain-text API instead of JSON
    #[arg(long)]
    plain: bool,

    /// Print the response exactly as received
    #[arg(long)]
    raw: bool,

    /// Command to send (e.g. summary, pools, devs)
    command: String,

    /// Command parameters
    params: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cgminer_api=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .timeout_ms(args.timeout_ms)
        .format(if args.plain { Format::PlainText } else { Format::Json })
        .build();

    let client = match Client::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let command = Command::new(&args.command).with_params(&args.params);
    tracing::info!("Sending '{}' to {}", command.name(), client.address());

    if let Err(e) = run(&client, &command, args.raw) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(client: &Client, command: &Command, raw: bool) -> cgminer_api::Result<()> {
    let ctx = Context::background();

    if raw {
        let payload = client.raw_call(&ctx, command)?;
        println!("{}", String::from_utf8_lossy(&payload));
        return Ok(());
    }

    let response = client.request(&ctx, command)?.error_for_status()?;
    println!("{}", response.status);

    if let Some(body) = response.decode::<Value>()? {
        let pretty = serde_json::to_string_pretty(&body)
            .map_err(cgminer_api::CgminerError::Encode)?;
        println!("{}", pretty);
    }
    Ok(())
}
