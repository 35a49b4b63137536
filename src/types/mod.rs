pub mod activity;
pub mod filter;
pub mod summary;
