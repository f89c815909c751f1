pub mod money;
pub mod pagination;
