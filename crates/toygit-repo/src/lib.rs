//! Repository handle for toygit.
//!
//! A [`Repository`] ties a working tree to its `.toygit` metadata directory:
//! the loose object store, the staging index, `HEAD` and the config file.
//! The handle is explicit state; any number of repositories can be open in
//! one process.

pub mod config;
pub mod error;
pub mod inspect;
pub mod layout;
pub mod refs;
pub mod repository;
pub mod stage;

pub use config::{CoreConfig, IndexSettings, RepoConfig};
pub use error::{RepoError, RepoResult};
pub use inspect::{InspectMode, Inspection};
pub use layout::{Layout, META_DIR};
pub use refs::HeadRef;
pub use repository::Repository;
pub use stage::{SkippedPath, StageFailure, StageReport, StagedFile};

// Re-export key types
pub use toygit_index::WorkdirStatus;
pub use toygit_object::{Object, ObjectKind, Signature};
pub use toygit_types::ObjectId;
