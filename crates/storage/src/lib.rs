#![forbid(unsafe_code)]

pub mod directory;
pub mod repository;
pub mod sqlite;

pub use directory::DirectoryContentRepository;
pub use repository::{
    ContentRepository, InMemoryRepository, SAVE_KEY, SaveRepository, Storage, StorageError,
};
