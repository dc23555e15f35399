//! Git operations using git2-rs.

pub mod commit;
pub mod ignore;
pub mod inspector;

pub use commit::stage_and_commit;
pub use ignore::{DEFAULT_IGNORE_FILE, IGNORE_FILE_NAME, IgnoreFilter};
pub use inspector::{DiffRecord, ModifiedFile, RepoInspector};
