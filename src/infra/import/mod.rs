pub mod csv;
pub mod xlsx;
