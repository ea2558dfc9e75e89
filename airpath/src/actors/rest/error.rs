use std::{io, net::SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to listen on {addr}: {cause}")]
    Bind { addr: SocketAddr, cause: io::Error },
    #[error("IO error: {message}: {cause}")]
    IO { message: String, cause: io::Error },
}
