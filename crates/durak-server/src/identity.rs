//! Identity verification hook.
//!
//! The server never interprets identity assertions itself — that's the
//! job of whatever issued them (a bot platform, an OAuth provider, a
//! custom token service). It defines the [`IdentityProvider`] trait
//! instead: one async method that takes the opaque assertion from an
//! `authenticate` message and returns who the client is. Implement it
//! with real verification in production, with a permissive stub in
//! development, with a mock in tests.

use durak_protocol::PlayerId;

/// Returned when an identity assertion fails verification. The string is
/// sent back to the client in an `error` message, so keep it free of
/// anything secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identity verification failed: {0}")]
pub struct IdentityError(pub String);

/// A verified identity: the stable player id plus the name shown to
/// other players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub player_id: PlayerId,
    pub display_name: String,
}

/// Verifies a client's identity assertion.
///
/// `Send + Sync + 'static` because the provider is shared across every
/// connection task for the lifetime of the server.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Validates the assertion a client presented in its `authenticate`
    /// message and returns the verified identity.
    fn verify(
        &self,
        assertion: &str,
    ) -> impl std::future::Future<Output = Result<Identity, IdentityError>> + Send;
}
