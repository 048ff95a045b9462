//! Local session store trait.
//!
//! Replaces the browser-local key/value storage the web client used for the
//! signed-in user's profile. The store is injected into the components that
//! need it instead of being reached through ambient global state.

use dowurk_types::error::StoreError;
use dowurk_types::user::{USER_RECORD_KEY, UserRecord};

/// Trait for local key/value persistence of client session state.
///
/// Values are arbitrary JSON. Uses RPITIT (native async fn in traits).
/// Implementations live in dowurk-infra.
pub trait SessionStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<serde_json::Value>, StoreError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a key. No-op if key does not exist.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Read the signed-in user's record, if one is stored.
pub async fn load_user<S: SessionStore>(store: &S) -> Result<Option<UserRecord>, StoreError> {
    match store.get(USER_RECORD_KEY).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("invalid user record: {e}"))),
        None => Ok(None),
    }
}

/// Write the signed-in user's record back to the store.
pub async fn save_user<S: SessionStore>(store: &S, user: &UserRecord) -> Result<(), StoreError> {
    let value = serde_json::to_value(user)
        .map_err(|e| StoreError::Serialization(format!("failed to encode user record: {e}")))?;
    store.set(USER_RECORD_KEY, &value).await
}
