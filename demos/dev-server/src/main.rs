//! Development server: permissive identity, default lobby timings.
//!
//! Run with `cargo run -p dev-server` and point a client at
//! `ws://127.0.0.1:8080`. `DURAK_ADDR` overrides the bind address,
//! `RUST_LOG` the log filter.

use durak_protocol::PlayerId;
use durak_server::{GameServerBuilder, Identity, IdentityError, IdentityProvider};
use tracing_subscriber::EnvFilter;

/// Accepts any non-empty assertion. `id:Name` sets a display name; a
/// bare id doubles as its own name. Development only — there is no
/// verification here at all.
struct DevIdentity;

impl IdentityProvider for DevIdentity {
    async fn verify(&self, assertion: &str) -> Result<Identity, IdentityError> {
        if assertion.is_empty() {
            return Err(IdentityError("empty assertion".into()));
        }
        let (id, name) =
            assertion.split_once(':').unwrap_or((assertion, assertion));
        Ok(Identity {
            player_id: PlayerId::new(id),
            display_name: name.to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("DURAK_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    tracing::warn!(
        "dev identity accepts every assertion; do not expose this server"
    );

    let server = GameServerBuilder::new().bind(&addr).build(DevIdentity).await?;
    tracing::info!(%addr, "dev server ready");
    server.run().await?;
    Ok(())
}
