//! WebSocket boundary of the Durak session server.
//!
//! This crate owns everything between the TCP socket and the lobby: the
//! accept loop, the per-connection handler with its identify-first
//! protocol, the [`ConnectionRegistry`] that maps live connections to
//! verified identities, and the [`IdentityProvider`] seam that keeps
//! identity verification out of the server itself.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use durak_server::{GameServerBuilder, Identity, IdentityError, IdentityProvider};
//! use durak_protocol::PlayerId;
//!
//! /// Accepts any assertion and uses it verbatim as the player id.
//! /// Development only.
//! struct DevIdentity;
//!
//! impl IdentityProvider for DevIdentity {
//!     async fn verify(&self, assertion: &str) -> Result<Identity, IdentityError> {
//!         Ok(Identity {
//!             player_id: PlayerId::new(assertion),
//!             display_name: assertion.to_string(),
//!         })
//!     }
//! }
//!
//! # async fn run() -> Result<(), durak_server::ServerError> {
//! let server = GameServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(DevIdentity)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod identity;
mod registry;
mod server;

pub use error::ServerError;
pub use identity::{Identity, IdentityError, IdentityProvider};
pub use registry::ConnectionRegistry;
pub use server::{GameServer, GameServerBuilder};
