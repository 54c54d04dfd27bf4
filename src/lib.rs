pub mod config;
pub mod io;
pub mod positioner;
pub mod style;
pub mod transform;
pub mod transform_cache;
pub mod types;
pub mod visualization;
