use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

#[cfg(unix)]
pub mod call;
pub mod methods;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Invoke a daemon command and print its result.
    Call(CallArgs),
    /// List the commands the daemon is known to accept.
    Methods,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        #[cfg(unix)]
        Command::Call(args) => call::run(args, format),
        #[cfg(not(unix))]
        Command::Call(_) => Err(crate::exit::CliError::new(
            crate::exit::TRANSPORT_ERROR,
            "unix domain sockets are not available on this platform",
        )),
        Command::Methods => methods::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SocketArgs {
    /// Exact path of the RPC socket.
    #[arg(long, value_name = "PATH", env = "LIGHTNING_RPC_FILE")]
    pub rpc_file: Option<PathBuf>,
    /// Daemon data directory containing `lightning-rpc`. Default: $HOME/.lightning.
    #[arg(long, value_name = "DIR", env = "LIGHTNING_DIR")]
    pub lightning_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Command name, e.g. getinfo.
    pub method: String,
    /// Positional parameters. Each is parsed as JSON, or taken as a string.
    #[arg(allow_negative_numbers = true)]
    pub params: Vec<String>,
    #[command(flatten)]
    pub socket: SocketArgs,
    /// Give up if no reply arrives in time (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
