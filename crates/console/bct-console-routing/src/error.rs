use thiserror::Error;

pub type RoutingResult<T> = Result<T, RoutingError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Fallback route {0} is not in the route table")]
    UnknownFallback(String),

    #[error("Fallback route {0} must not be guarded")]
    GuardedFallback(String),
}
