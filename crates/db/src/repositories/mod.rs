//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that only run standalone take `&PgPool`; methods that also run
//! inside the edit-commit transaction take any `PgExecutor` or a
//! `&mut PgConnection`.

pub mod edit_request_repo;
pub mod history_edit_repo;
pub mod photo_repo;
pub mod record_repo;
pub mod user_repo;

pub use edit_request_repo::EditRequestRepo;
pub use history_edit_repo::HistoryEditRepo;
pub use photo_repo::PhotoRepo;
pub use record_repo::RecordRepo;
pub use user_repo::UserRepo;
