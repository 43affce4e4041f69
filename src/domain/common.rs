//! Shared traits for records that participate in timestamp-based sync.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Exposes a stable identifier for stored entities.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Contract every record crossing the sync boundary must satisfy: an id,
/// a last-modified timestamp, and a tombstone flag. Push and merge logic
/// is written once against this trait and instantiated per entity type.
pub trait Syncable: Identifiable {
    fn updated_at(&self) -> DateTime<Utc>;
    fn is_deleted(&self) -> bool;
}

/// Owner id used while no identity provider is available. Records created
/// under it stay local until a sync adopts a real owner.
pub const LOCAL_OWNER_ID: &str = "local-owner";
