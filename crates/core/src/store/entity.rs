use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A persisted record managed by the repositories.
///
/// Every entity carries an id, a creation timestamp, and a version stamp
/// that increments on each successful update; the version is what the
/// optimistic lock compares at write time. The serialized form must expose
/// these as top-level `id`, `created_at`, and `version` fields, since the
/// pagination engine and store backends address them by name.
pub trait EntityRecord:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Logical collection name; doubles as the cache namespace.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);
}
