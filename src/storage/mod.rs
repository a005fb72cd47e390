//!  Storage is organized through [record_storage::RecordStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Records are stored in record files, one per UTC day a session started on.
//!   - Each line of a record file is one finished session.
//!
//!  The running timer lives next to it in [active_session::ActiveSessionStore].

pub mod active_session;
pub mod entities;
pub mod extract;
pub mod record_storage;
