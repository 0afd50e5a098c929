use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pledge",
    about = "Pledge: fundraising event coordination server",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Server address for client commands
    #[arg(long, global = true, default_value = "127.0.0.1:12345")]
    pub server: SocketAddr,

    /// Transport to serve or connect with (default: udp, or the config file's)
    #[arg(long, global = true)]
    pub transport: Option<TransportArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportArg {
    Tcp,
    Udp,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Pledge server
    Serve(ServeArgs),
    /// Create a new fundraising event
    Create(CreateArgs),
    /// List current and past events
    List,
    /// Donate to an event
    Donate(DonateArgs),
    /// Show one event's details
    Details(DetailsArgs),
    /// Check whether any events exist
    Exists,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to bind, overriding the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Seconds of silence before a UDP client counts as disconnected
    #[arg(long)]
    pub idle_timeout: Option<u64>,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub target: f64,
    /// YYYY-MM-DD, MM-DD-YYYY, or RFC 3339
    #[arg(long)]
    pub deadline: String,
}

#[derive(Args)]
pub struct DonateArgs {
    /// Event number as shown by `pledge list`
    pub event: u32,
    pub amount: f64,
}

#[derive(Args)]
pub struct DetailsArgs {
    /// Event number as shown by `pledge list`
    pub event: u32,
}
