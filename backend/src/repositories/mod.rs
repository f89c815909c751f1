pub mod audit_log;
pub mod common;
pub mod invoice;
pub mod purchase_order;
pub mod reference;
pub mod transaction;
pub mod user;

pub use transaction::{begin_read_snapshot, begin_transaction, commit_transaction};
