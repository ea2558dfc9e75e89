#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no path found")]
    NoPath,
    #[error("multiple paths found")]
    MultiplePaths,
}
