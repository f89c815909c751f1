pub mod audit_logs;
pub mod merge;

pub use audit_logs::{get_audit_log_detail, get_audit_log_diff, list_audit_logs};
pub use merge::merge_entities;
