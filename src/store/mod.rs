pub mod memory;
pub mod postgres;

use uuid::Uuid;

use crate::models::build::{Build, BuildPatch, NewBuild};
use crate::models::entry::{Entry, NewEntry};
use crate::models::form_token::{FormToken, TokenStatus};
use crate::models::question::{NewQuestion, Question, QuestionPatch};

pub use memory::MemoryStore;
pub use postgres::{PgBuildStore, PgEntryStore, PgQuestionStore, PgTokenStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Failure modes of the atomic consume-and-append operation.
#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    #[error("form token already consumed")]
    Replayed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub trait QuestionStore {
    async fn get(&self, id: Uuid) -> Result<Option<Question>, StoreError>;

    /// Resolves the given ids; unknown ids are silently absent from the
    /// result. Order of the result is unspecified.
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Question>, StoreError>;

    async fn insert(&self, question: NewQuestion) -> Result<Question, StoreError>;
    async fn update(&self, id: Uuid, patch: QuestionPatch) -> Result<Option<Question>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Question>, i64), StoreError>;
}

pub trait BuildStore {
    async fn get(&self, id: Uuid) -> Result<Option<Build>, StoreError>;
    async fn insert(&self, build: NewBuild) -> Result<Build, StoreError>;
    async fn update(&self, id: Uuid, patch: BuildPatch) -> Result<Option<Build>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Build>, i64), StoreError>;
}

pub trait TokenStore {
    /// Mints a fresh single-use token for one rendered instance of `build_id`.
    async fn issue(&self, build_id: Uuid) -> Result<FormToken, StoreError>;

    /// Read-only status probe; consumption happens in [`EntryStore::append`].
    async fn status(&self, token: &str, build_id: Uuid) -> Result<TokenStatus, StoreError>;
}

pub trait EntryStore {
    /// Atomically consumes the entry's form token and persists the entry.
    /// Either both happen or neither does; a token that was already
    /// consumed (or never issued for this build) yields
    /// [`AppendError::Replayed`] and writes nothing.
    async fn append(&self, entry: NewEntry) -> Result<Entry, AppendError>;

    async fn get(&self, id: Uuid) -> Result<Option<Entry>, StoreError>;
    async fn list_by_build(
        &self,
        build_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Entry>, i64), StoreError>;
}
