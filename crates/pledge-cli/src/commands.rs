use std::net::SocketAddr;

use anyhow::{bail, Context};
use colored::Colorize;
use pledge_client::{ClientError, PledgeClient};
use pledge_server::{PledgeServer, ServerConfig, Transport};
use pledge_types::{EventId, EventListing, EventSnapshot, EventSummary, Timestamp};
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        server,
        transport,
        ..
    } = cli;
    let transport = transport.map(Transport::from);
    let remote = Remote {
        addr: server,
        transport: transport.unwrap_or_default(),
    };

    match command {
        Command::Serve(args) => cmd_serve(args, transport).await,
        Command::Create(args) => cmd_create(&remote, args).await,
        Command::List => cmd_list(&remote, format).await,
        Command::Donate(args) => cmd_donate(&remote, args).await,
        Command::Details(args) => cmd_details(&remote, args, format).await,
        Command::Exists => cmd_exists(&remote, format).await,
    }
}

/// Where client commands send their requests. Connecting is deferred until
/// the command's own arguments have been checked.
struct Remote {
    addr: SocketAddr,
    transport: Transport,
}

impl Remote {
    async fn connect(&self) -> anyhow::Result<PledgeClient> {
        let client = match self.transport {
            Transport::Tcp => PledgeClient::connect_tcp(self.addr).await,
            Transport::Udp => PledgeClient::connect_udp(self.addr).await,
        };
        client.with_context(|| {
            format!("could not reach server at {} ({})", self.addr, self.transport)
        })
    }
}

impl From<TransportArg> for Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Tcp => Transport::Tcp,
            TransportArg::Udp => Transport::Udp,
        }
    }
}

fn server_config(args: &ServeArgs, transport: Option<Transport>) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(transport) = transport {
        config.transport = transport;
    }
    if let Some(secs) = args.idle_timeout {
        config.idle_timeout_ms = secs.saturating_mul(1000);
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_serve(args: ServeArgs, transport: Option<Transport>) -> anyhow::Result<()> {
    let config = server_config(&args, transport)?;
    let addr = config.bind_addr;
    let server = PledgeServer::bind(config)
        .await
        .with_context(|| format!("could not start the server on {addr}"))?;

    println!(
        "{} Pledge server listening on {} ({})",
        "✓".green().bold(),
        server.local_addr().to_string().bold(),
        server.config().transport,
    );

    tokio::select! {
        result = server.serve() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

async fn cmd_create(remote: &Remote, args: CreateArgs) -> anyhow::Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        bail!("event name cannot be empty");
    }
    require_positive("target amount", args.target)?;
    let deadline = Timestamp::parse(&args.deadline)?;
    if !deadline.is_after(&Timestamp::now()) {
        bail!("deadline {deadline} is not in the future");
    }

    remote.connect().await?.create_event(name, args.target, deadline).await?;
    println!("{} Event created successfully.", "✓".green().bold());
    Ok(())
}

async fn cmd_list(remote: &Remote, format: OutputFormat) -> anyhow::Result<()> {
    let listing = remote.connect().await?.list_events().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        OutputFormat::Text => print_listing(&listing),
    }
    Ok(())
}

async fn cmd_donate(remote: &Remote, args: DonateArgs) -> anyhow::Result<()> {
    require_positive("donation amount", args.amount)?;
    let id = event_id(args.event)?;
    let client = remote.connect().await?;
    if !client.events_exist().await? {
        println!("There are currently no fundraising events to donate to.");
        return Ok(());
    }
    match client.donate(id.as_wire(), args.amount).await {
        Ok(()) => {
            println!("{} Donation successful. Thank you for your contribution!", "✓".green().bold());
            Ok(())
        }
        Err(ClientError::InvalidIndex) => bail!("no event numbered {}", args.event),
        Err(ClientError::EventEnded) => bail!("donation failed: event {} has already ended", args.event),
        Err(e) => Err(e.into()),
    }
}

async fn cmd_details(remote: &Remote, args: DetailsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = event_id(args.event)?;
    let client = remote.connect().await?;
    if !client.events_exist().await? {
        println!("There are currently no fundraising events to check details for.");
        return Ok(());
    }
    let snapshot = match client.event_details(id.as_wire()).await {
        Ok(snapshot) => snapshot,
        Err(ClientError::InvalidIndex) => bail!("no event numbered {}", args.event),
        Err(e) => return Err(e.into()),
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => print_details(&snapshot),
    }
    Ok(())
}

async fn cmd_exists(remote: &Remote, format: OutputFormat) -> anyhow::Result<()> {
    let exists = remote.connect().await?.events_exist().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "exists": exists })),
        OutputFormat::Text if exists => println!("Fundraising events exist."),
        OutputFormat::Text => println!("There are no fundraising events yet."),
    }
    Ok(())
}

fn require_positive(what: &str, value: f64) -> anyhow::Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{what} must be a positive number, got {value}");
    }
    Ok(())
}

fn event_id(number: u32) -> anyhow::Result<EventId> {
    EventId::from_display(number).context("event numbers start at 1")
}

fn print_listing(listing: &EventListing) {
    println!("{}", "Current Events:".bold());
    if listing.current.is_empty() {
        println!("There are currently no ongoing fundraising events.");
    }
    for event in &listing.current {
        println!("{}", format_row(event));
    }

    println!("\n{}", "Past Events:".bold());
    if listing.past.is_empty() {
        println!("There are no past fundraising events.");
    }
    for event in &listing.past {
        println!("{}", format_row(event).dimmed());
    }
}

fn format_row(event: &EventSummary) -> String {
    format!(
        "{}: {} (Target: ${:.2}, Raised: ${:.2}, Deadline: {})",
        event.id.display_number(),
        event.name,
        event.target_amount,
        event.current_amount,
        event.deadline,
    )
}

fn print_details(snapshot: &EventSnapshot) {
    println!("Name: {}", snapshot.name.bold());
    println!("Target Amount: {:.2}", snapshot.target_amount);
    println!("Current Amount: {:.2}", snapshot.current_amount);
    println!("Deadline: {}", snapshot.deadline);
    println!("{}", format_progress(snapshot));
}

fn format_progress(snapshot: &EventSnapshot) -> String {
    format!(
        "Progress: {:.1}% (${:.2} to go)",
        snapshot.progress() * 100.0,
        snapshot.remaining(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args() -> ServeArgs {
        ServeArgs { config: None, bind: None, idle_timeout: None }
    }

    #[test]
    fn serve_config_defaults() {
        let config = server_config(&serve_args(), None).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn serve_flags_override_config() {
        let args = ServeArgs {
            bind: Some("0.0.0.0:7000".parse().unwrap()),
            idle_timeout: Some(5),
            ..serve_args()
        };
        let config = server_config(&args, Some(Transport::Tcp)).unwrap();
        assert_eq!(config.bind_addr.port(), 7000);
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.idle_timeout_ms, 5000);
    }

    #[test]
    fn zero_idle_timeout_rejected() {
        let args = ServeArgs { idle_timeout: Some(0), ..serve_args() };
        assert!(server_config(&args, None).is_err());
    }

    #[test]
    fn positive_amounts_only() {
        assert!(require_positive("amount", 1.0).is_ok());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", -3.0).is_err());
        assert!(require_positive("amount", f64::NAN).is_err());
        assert!(require_positive("amount", f64::INFINITY).is_err());
    }

    #[test]
    fn event_numbers_are_one_based() {
        assert_eq!(event_id(1).unwrap(), EventId::new(0));
        assert!(event_id(0).is_err());
    }

    #[test]
    fn details_show_progress() {
        let snapshot = EventSnapshot {
            name: "Shelter".into(),
            target_amount: 1000.0,
            current_amount: 250.0,
            deadline: Timestamp::from_millis(0),
        };
        assert_eq!(format_progress(&snapshot), "Progress: 25.0% ($750.00 to go)");

        let funded = EventSnapshot {
            current_amount: 1200.0,
            ..snapshot
        };
        assert_eq!(format_progress(&funded), "Progress: 120.0% ($0.00 to go)");
    }

    #[tokio::test]
    async fn invalid_arguments_fail_before_connecting() {
        // Nothing listens on port 9 over TCP, so a connection attempt would fail
        // with a different error.
        let remote = Remote {
            addr: "127.0.0.1:9".parse().unwrap(),
            transport: Transport::Tcp,
        };
        let err = cmd_donate(&remote, DonateArgs { event: 0, amount: 5.0 }).await.unwrap_err();
        assert!(err.to_string().contains("start at 1"));
        let err = cmd_donate(&remote, DonateArgs { event: 1, amount: -5.0 }).await.unwrap_err();
        assert!(err.to_string().contains("positive"));
        let err = cmd_details(&remote, DetailsArgs { event: 0 }, OutputFormat::Text).await.unwrap_err();
        assert!(err.to_string().contains("start at 1"));
    }

    #[test]
    fn row_shows_display_number() {
        colored::control::set_override(false);
        let row = EventSummary {
            id: EventId::new(0),
            name: "Shelter".into(),
            target_amount: 1000.0,
            current_amount: 250.0,
            deadline: Timestamp::from_millis(1_893_542_400_000),
        };
        assert_eq!(
            format_row(&row),
            "1: Shelter (Target: $1000.00, Raised: $250.00, Deadline: 2030-01-02 00:00:00 UTC)"
        );
    }
}
