use std::{net::SocketAddr, path::PathBuf, process::ExitCode, str::FromStr, time::Duration};

use airpath::{Airpath, Config, finder::Flight};
use clap::Parser;
use tokio::{
    signal,
    sync::{mpsc, oneshot},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    info!("Starting Airpath binary...");
    if let Err(e) = run(args).await {
        error!("Error: {e:?}");
        ExitCode::FAILURE
    } else {
        info!("Airpath has been terminated.");
        ExitCode::SUCCESS
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config()?;

    let (airpath, command_sender) = Airpath::new(config)?;
    let (ready_sender, ready_receiver) = oneshot::channel();
    let airpath_task = tokio::spawn(async move { airpath.run(ready_sender).await });
    ready_receiver.await??;

    match args.command {
        Command::Daemonize => {
            handle_status(&command_sender).await;
            daemonize().await;
        }
        Command::Status => {
            handle_status(&command_sender).await;
        }
        Command::Find { flights } => {
            handle_find(&command_sender, flights).await;
        }
    }

    // Shutdown Airpath.
    command_sender
        .send(airpath::Command::Shutdown)
        .await
        .inspect_err(|e| {
            error!("Channel send error: {e}");
        })?;
    info!("Waiting for Airpath to terminate...");
    if let Err(e) = airpath_task.await {
        error!("Failed to wait until Airpath is terminated: {e}");
    }
    Ok(())
}

/// A future that resolves when a termination signal is received.
async fn daemonize() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Termination signal received");
}

async fn handle_status(command_sender: &mpsc::Sender<airpath::Command>) {
    info!("Handling status command");
    let (reply_sender, reply_receiver) = oneshot::channel();
    if let Err(e) = command_sender
        .send(airpath::Command::Status { reply_sender })
        .await
    {
        error!("Channel send error: {e}");
        return;
    }
    let Ok(status) = reply_receiver.await else {
        error!("Failed to receive status reply");
        return;
    };

    println!("============================");
    println!(" Status");
    println!("============================");
    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize status: {e}"),
    }
}

async fn handle_find(command_sender: &mpsc::Sender<airpath::Command>, flights: Vec<FlightArg>) {
    info!("Finding a path for {} flights", flights.len());
    let (command, reply_receiver) =
        airpath::Command::find_path(flights.into_iter().map(|arg| arg.0).collect());
    if let Err(e) = command_sender.send(command).await {
        error!("Channel send error: {e}");
        return;
    }

    match reply_receiver.await {
        Ok(Ok(path)) => println!("{} {}", path.start, path.finish),
        Ok(Err(e)) => error!("Failed to find a path: {e}"),
        Err(e) => error!("Failed to receive reply: {e:?}"),
    }
}

#[derive(Debug, Parser)]
struct Args {
    /// JSON config file. Flags given on the command line take precedence.
    #[clap(long)]
    config: Option<PathBuf>,
    #[clap(long)]
    rest_addr: Option<SocketAddr>,
    #[clap(long, value_parser = humantime::parse_duration)]
    request_timeout: Option<Duration>,
    #[clap(long, value_parser = humantime::parse_duration)]
    shutdown_grace_period: Option<Duration>,
    #[clap(subcommand)]
    command: Command,
}

const DEFAULT_REST_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    8080,
);

impl Args {
    fn to_config(&self) -> Result<Config, airpath::Error> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config {
                rest: airpath::RestConfig {
                    addr: DEFAULT_REST_ADDR,
                    ..Default::default()
                },
            },
        };

        if let Some(addr) = self.rest_addr {
            config.rest.addr = addr;
        }
        if let Some(timeout) = self.request_timeout {
            config.rest.request_timeout = timeout;
        }
        if let Some(period) = self.shutdown_grace_period {
            config.rest.shutdown_grace_period = period;
        }
        Ok(config)
    }
}

#[derive(Debug, Parser)]
enum Command {
    /// Serves requests until Ctrl+C or SIGTERM.
    Daemonize,
    Status,
    /// Finds the origin and final destination of flights given as `SRC:DST`.
    Find {
        #[clap(required = true)]
        flights: Vec<FlightArg>,
    },
}

#[derive(Debug, Clone)]
struct FlightArg(Flight);

impl FromStr for FlightArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((source, destination)) if !source.is_empty() && !destination.is_empty() => {
                Ok(Self(Flight::new(source, destination)))
            }
            _ => Err(format!("expected SRC:DST, got {s:?}")),
        }
    }
}
