pub mod aggregate;
pub mod load;
pub mod units;
