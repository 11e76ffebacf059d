pub mod dir;
pub mod memory;
