pub mod base;
pub mod eod;
