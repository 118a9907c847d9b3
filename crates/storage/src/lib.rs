#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AccountRepository, InMemoryRepository, Storage, StorageError, StoredAccount,
    UserStatsRepository,
};
