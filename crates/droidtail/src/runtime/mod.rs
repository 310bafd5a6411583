pub mod boot;
pub mod tail;
