pub mod audit_diff;
pub mod audit_log;
pub mod invoice;
pub mod merge;
pub mod purchase_order;
pub mod reconciliation;
pub mod reference;
