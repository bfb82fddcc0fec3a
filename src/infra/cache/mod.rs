pub mod memory;
pub mod data_cache;
