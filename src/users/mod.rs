mod memory;
mod repo;
mod repo_types;

pub use memory::MemoryUserStore;
pub use repo::{PgUserStore, StoreError, UniqueField, UserStore};
pub use repo_types::{HistoryEntry, NewUser, SearchKind, User};
