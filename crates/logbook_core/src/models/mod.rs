pub mod entry;
pub mod signature;
pub mod user;

pub use entry::{EntryFields, EntryFilter, EntryStatus, EntryUpdate, LogEntry, NewEntry, ReviewStamp};
pub use signature::DigitalSignature;
pub use user::{Batch, Role, User, UserId};
