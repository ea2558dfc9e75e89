#[cfg(feature = "rest")]
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::finder::{self, Flight, Path, PathFinder};

#[derive(Debug)]
pub enum Command {
    FindPath {
        flights: Vec<Flight>,
        reply_sender: oneshot::Sender<Result<Path, finder::Error>>,
    },
    Status {
        reply_sender: oneshot::Sender<Status>,
    },
    Shutdown,
}

impl Command {
    /// Builds a [`Command::FindPath`] together with the receiver of its reply.
    pub fn find_path(
        flights: Vec<Flight>,
    ) -> (Self, oneshot::Receiver<Result<Path, finder::Error>>) {
        let (reply_sender, reply_receiver) = oneshot::channel();
        (
            Self::FindPath {
                flights,
                reply_sender,
            },
            reply_receiver,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[cfg(feature = "rest")]
    pub rest_addr: SocketAddr,
}

/// Returns `true` if the service should shut down.
pub fn handle_command(command: Command, finder: &dyn PathFinder, status: &Status) -> bool {
    match command {
        Command::FindPath {
            flights,
            reply_sender,
        } => {
            handle_find_path_command(&flights, reply_sender, finder);
        }
        Command::Status { reply_sender } => {
            let _ = reply_sender
                .send(status.clone())
                .inspect_err(|_| error!("Failed to send status reply"));
        }
        Command::Shutdown => {
            // Should shutdown
            return true;
        }
    }

    // Should not shutdown
    false
}

fn handle_find_path_command(
    flights: &[Flight],
    reply_sender: oneshot::Sender<Result<Path, finder::Error>>,
    finder: &dyn PathFinder,
) {
    let result = finder.find_path(flights);
    debug!("find path for {} flights: {result:?}", flights.len());
    let _ = reply_sender
        .send(result)
        .inspect_err(|_| error!("Failed to send find path reply"));
}
