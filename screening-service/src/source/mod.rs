//! Source gateway implementations

pub mod http;
pub mod memory;

pub use http::{HttpConfig, HttpSource};
pub use memory::ListSource;
