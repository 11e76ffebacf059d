pub mod memory;
pub mod output_dir;
