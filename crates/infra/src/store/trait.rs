use async_trait::async_trait;
use thiserror::Error;

use quizdesk_core::RecordId;
use quizdesk_schema::{Model, Record, ResourceKind};

/// Errors raised by a backing store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write would break referential integrity (dangling reference, duplicate key,
    /// failed check constraint).
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A stored row could not be turned back into a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Any other backend failure (connection, I/O, lock poisoning).
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// The single shared resource of the service: every record lives here.
///
/// Each mutating call is one transaction. References are enforced by the store:
/// `insert`/`update` fail with [`StoreError::Integrity`] when a referenced record is
/// missing, and `delete` removes everything that (transitively) references the target.
#[async_trait]
pub trait Store: Send + Sync {
    /// All records of `kind`, in creation order.
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Record>, StoreError>;

    async fn get(&self, kind: ResourceKind, id: RecordId) -> Result<Option<Record>, StoreError>;

    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Replace the stored record with the same kind and id; `Ok(None)` when absent.
    async fn update(&self, record: Record) -> Result<Option<Record>, StoreError>;

    /// Delete a record and its dependents; `Ok(false)` when absent.
    async fn delete(&self, kind: ResourceKind, id: RecordId) -> Result<bool, StoreError>;
}

impl dyn Store {
    /// Typed [`Store::list`].
    pub async fn list_models<M: Model>(&self) -> Result<Vec<M>, StoreError> {
        self.list(M::KIND)
            .await?
            .into_iter()
            .map(to_model::<M>)
            .collect()
    }

    /// Typed [`Store::get`].
    pub async fn get_model<M: Model>(&self, id: RecordId) -> Result<Option<M>, StoreError> {
        self.get(M::KIND, id).await?.map(to_model::<M>).transpose()
    }

    /// Typed [`Store::insert`].
    pub async fn insert_model<M: Model>(&self, model: M) -> Result<M, StoreError> {
        to_model(self.insert(model.into_record()).await?)
    }

    /// Typed [`Store::update`].
    pub async fn update_model<M: Model>(&self, model: M) -> Result<Option<M>, StoreError> {
        self.update(model.into_record())
            .await?
            .map(to_model::<M>)
            .transpose()
    }
}

fn to_model<M: Model>(record: Record) -> Result<M, StoreError> {
    M::from_record(record).map_err(|e| StoreError::Corrupt(e.to_string()))
}
