//! Who is on the other end of each connection.
//!
//! Identity lives in this side table, keyed by [`ConnectionId`] — it is
//! never attached to the transport object itself. That keeps the
//! transport layer identity-free and makes "which player is this
//! socket?" answerable from exactly one place.

use std::collections::HashMap;

use durak_protocol::ConnectionId;

use crate::identity::Identity;

/// `ConnectionId → Identity` for every connection that has passed
/// verification. Connections that haven't identified yet simply have no
/// entry.
#[derive(Default)]
pub struct ConnectionRegistry {
    identities: HashMap<ConnectionId, Identity>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { identities: HashMap::new() }
    }

    /// Binds a verified identity to a connection, replacing any earlier
    /// binding for the same connection id.
    pub fn bind(&mut self, conn_id: ConnectionId, identity: Identity) {
        self.identities.insert(conn_id, identity);
    }

    pub fn identity(&self, conn_id: ConnectionId) -> Option<&Identity> {
        self.identities.get(&conn_id)
    }

    /// Removes the binding for a closed connection, returning the
    /// identity so the caller can run disconnect bookkeeping for it.
    pub fn unbind(&mut self, conn_id: ConnectionId) -> Option<Identity> {
        self.identities.remove(&conn_id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use durak_protocol::PlayerId;

    fn identity(id: &str) -> Identity {
        Identity {
            player_id: PlayerId::new(id),
            display_name: id.to_uppercase(),
        }
    }

    #[test]
    fn test_bind_then_lookup() {
        let mut registry = ConnectionRegistry::new();
        registry.bind(ConnectionId(1), identity("tg_1"));

        let found = registry.identity(ConnectionId(1)).unwrap();
        assert_eq!(found.player_id, PlayerId::new("tg_1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unidentified_connection_has_no_entry() {
        let registry = ConnectionRegistry::new();
        assert!(registry.identity(ConnectionId(7)).is_none());
    }

    #[test]
    fn test_unbind_returns_the_identity() {
        let mut registry = ConnectionRegistry::new();
        registry.bind(ConnectionId(1), identity("tg_1"));

        let removed = registry.unbind(ConnectionId(1)).unwrap();
        assert_eq!(removed.player_id, PlayerId::new("tg_1"));
        assert!(registry.is_empty());
        assert!(registry.unbind(ConnectionId(1)).is_none());
    }

    #[test]
    fn test_rebind_replaces_the_identity() {
        let mut registry = ConnectionRegistry::new();
        registry.bind(ConnectionId(1), identity("tg_1"));
        registry.bind(ConnectionId(1), identity("tg_2"));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.identity(ConnectionId(1)).unwrap().player_id,
            PlayerId::new("tg_2")
        );
    }
}
