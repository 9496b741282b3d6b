mod config;
mod ingest;
mod orders;
mod render;

pub use config::*;
pub use ingest::*;
pub use orders::*;
pub use render::*;
