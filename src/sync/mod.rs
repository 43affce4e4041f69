//! Bidirectional month sync: last-write-wins merge strategy, the remote
//! store boundary, and the orchestrating engine.

pub mod engine;
pub mod merge;
pub mod remote;

pub use engine::{SyncEngine, SyncReport};
pub use merge::{merge_records, resolve};
pub use remote::{MemoryRemote, RemoteStore};

/// Opaque identity boundary: some owner id when authenticated, `None`
/// while offline. No push or pull happens without an owner.
pub trait IdentityProvider {
    fn owner_id(&self) -> Option<String>;
}

/// Identity of a device that never authenticates.
pub struct OfflineIdentity;

impl IdentityProvider for OfflineIdentity {
    fn owner_id(&self) -> Option<String> {
        None
    }
}

/// Fixed authenticated identity.
pub struct StaticIdentity(pub String);

impl IdentityProvider for StaticIdentity {
    fn owner_id(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
