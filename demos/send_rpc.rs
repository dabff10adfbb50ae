//! Send one JSON-RPC call to a node and print the outcome
//!
//! Without a method the demo asks for block 0x1b4 with full transactions.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example send_rpc -- --endpoint https://mainnet.example.org
//! cargo run --example send_rpc -- --endpoint https://a.example --endpoint https://b.example eth_getBalance 0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae latest
//! cargo run --example send_rpc -- --raw '{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}'
//! ```

use clap::Parser;
use noderpc::core::codec::coerce_arg;
use noderpc::{CallOutcome, ObservabilityConfig, RpcClient};
use serde_json::json;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Send a JSON-RPC 2.0 call to an Ethereum node", long_about = None)]
struct Args {
    /// Node URL; repeat for failover (http, https, ws or wss)
    #[arg(short, long = "endpoint", env = "NODERPC_ENDPOINTS", value_delimiter = ',', required = true)]
    endpoints: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Extra attempts after a timeout or connection failure
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Send this complete JSON-RPC payload instead of METHOD/ARGS
    #[arg(long, conflicts_with_all = ["method", "args"])]
    raw: Option<String>,

    /// Log level for JSON logs on stdout (off when unset)
    #[arg(long)]
    log_level: Option<String>,

    /// Remote method name
    method: Option<String>,

    /// Positional params; JSON objects/arrays and true/false/null are parsed
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(level) = &args.log_level {
        let config = ObservabilityConfig::new("send_rpc").with_log_level(level.clone());
        if let Err(e) = noderpc::core::init_observability(config) {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    let client = match RpcClient::builder()
        .endpoints(args.endpoints.iter().map(String::as_str))
        .timeout(Duration::from_millis(args.timeout_ms))
        .max_retries(args.max_retries)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match (&args.raw, &args.method) {
        (Some(payload), _) => client.send_raw(payload).await,
        (None, Some(method)) => {
            let params = args.args.iter().map(|a| coerce_arg(a)).collect();
            client.send(method.as_str(), params).await
        }
        (None, None) => {
            client
                .send("eth_getBlockByNumber", vec![json!("0x1b4"), json!(true)])
                .await
        }
    };

    tracing::info!(outcome = outcome.label(), "Call finished");

    let code = match outcome {
        CallOutcome::Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            println!("{}", pretty);
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("{}", other);
            ExitCode::FAILURE
        }
    };

    if args.log_level.is_some() {
        if let Err(e) = noderpc::core::shutdown_observability() {
            eprintln!("{}", e);
        }
    }

    code
}
