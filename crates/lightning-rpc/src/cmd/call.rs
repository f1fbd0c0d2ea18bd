use std::time::Duration;

use lightning_rpc::client::{Client, ClientConfig, UnixConnector};
use lightning_rpc::transport::default_rpc_path;
use serde_json::Value;
use tracing::debug;

use crate::cmd::{CallArgs, SocketArgs};
use crate::exit::{
    io_error, rpc_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_value, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let connector = resolve_connector(&args.socket)?;
    let params: Vec<Value> = args.params.iter().map(|p| parse_param(p)).collect();
    debug!(method = %args.method, socket = %connector.path().display(), "calling");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;

    runtime.block_on(async move {
        let client = Client::with_connector(connector, ClientConfig::default());
        let call = tokio::time::timeout(timeout, client.call_positional(&args.method, params));

        let outcome = tokio::select! {
            outcome = call => outcome,
            _ = tokio::signal::ctrl_c() => {
                client.shutdown().await;
                return Err(CliError::new(FAILURE, "interrupted"));
            }
        };
        client.shutdown().await;

        match outcome {
            Ok(Ok(value)) => {
                print_value(&value, format);
                Ok(SUCCESS)
            }
            Ok(Err(err)) => Err(rpc_error(&format!("{} failed", args.method), err)),
            Err(_) => Err(CliError::new(
                TIMEOUT,
                format!("no reply to {} within {}", args.method, args.timeout),
            )),
        }
    })
}

fn resolve_connector(socket: &SocketArgs) -> CliResult<UnixConnector> {
    if let Some(path) = &socket.rpc_file {
        if !path.is_absolute() {
            return Err(CliError::new(
                USAGE,
                format!("--rpc-file must be an absolute path: {}", path.display()),
            ));
        }
        return Ok(UnixConnector::exact(path.clone()));
    }
    if let Some(dir) = &socket.lightning_dir {
        return UnixConnector::new(dir).map_err(|err| transport_error("invalid --lightning-dir", err));
    }
    default_rpc_path().map(UnixConnector::exact).ok_or_else(|| {
        CliError::new(
            USAGE,
            "HOME is not set; pass --lightning-dir or --rpc-file",
        )
    })
}

/// Parse a parameter as JSON, falling back to a plain string.
fn parse_param(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
