use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

#[cfg(feature = "rest")]
use crate::actors::rest;
#[cfg(feature = "rest")]
pub use crate::actors::rest::Config as RestConfig;
pub use crate::{
    command::{Command, Status},
    config::{Config, ConfigError},
};
use crate::finder::{DegreeFinder, PathFinder};

mod actors;
mod command;
pub mod config;
pub mod finder;
pub mod models;

const COMMAND_CHANNEL_SIZE: usize = 100;

pub struct Airpath {
    config: Config,
    finder: Arc<dyn PathFinder>,
    command_receiver: mpsc::Receiver<Command>,
}

impl Airpath {
    pub fn new(config: Config) -> Result<(Self, mpsc::Sender<Command>), Error> {
        Self::with_finder(config, Arc::new(DegreeFinder))
    }

    pub fn with_finder(
        config: Config,
        finder: Arc<dyn PathFinder>,
    ) -> Result<(Self, mpsc::Sender<Command>), Error> {
        config.validate().map_err(Error::InvalidConfig)?;

        let (command_sender, command_receiver) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        Ok((
            Self {
                config,
                finder,
                command_receiver,
            },
            command_sender,
        ))
    }

    /// Starts the REST server and handles commands until [`Command::Shutdown`]
    /// is received or all command senders are dropped.
    ///
    /// The result of the startup is sent to `ready_sender` before any command is handled.
    pub async fn run(mut self, ready_sender: oneshot::Sender<Result<(), Error>>) {
        info!("Airpath is running...");

        #[cfg(feature = "rest")]
        let rest_actor = match rest::Actor::new(&self.config.rest, self.finder.clone()).await {
            Ok(actor) => actor,
            Err(e) => {
                error!("Failed to create REST actor: {e:?}");
                let _ = ready_sender
                    .send(Err(e.into()))
                    .inspect_err(|_| error!("Failed to send ready signal"));
                return;
            }
        };

        let status = Status {
            #[cfg(feature = "rest")]
            rest_addr: rest_actor.local_addr(),
        };
        let _ = ready_sender
            .send(Ok(()))
            .inspect_err(|_| error!("Failed to send ready signal"));

        loop {
            let Some(command) = self.command_receiver.recv().await else {
                info!("All command senders dropped.");
                break;
            };
            debug!("Command received: {command:?}");
            if command::handle_command(command, self.finder.as_ref(), &status) {
                break;
            }
        }

        #[cfg(feature = "rest")]
        rest_actor.shutdown().await;
        info!("Airpath has been shut down.");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "rest")]
    #[error("REST error: {0}")]
    Rest(#[from] rest::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
