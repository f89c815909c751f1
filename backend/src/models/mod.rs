pub mod actor;
pub mod audit_log;
pub mod invoice;
pub mod purchase_order;
pub mod reconciliation;
pub mod reference;
pub mod user;
