use super::domain::SessionId;
use super::session::KycSession;

/// Storage abstraction so the service can be exercised without a database.
///
/// `modify` runs the closure against the stored session under the repository's own
/// exclusion, so a ticket reserved by one request is visible to the next.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: KycSession) -> Result<KycSession, RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<KycSession>, RepositoryError>;
    fn modify<T, F>(&self, id: &SessionId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut KycSession) -> T;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
