// File I/O operations

pub mod csv;
pub mod store;
pub mod xlsx;
