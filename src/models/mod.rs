pub mod stock;
pub mod table;
