mod orders;
mod pool;
mod types;

#[cfg(test)]
mod tests;

pub use orders::*;
pub use pool::*;
pub use types::*;
