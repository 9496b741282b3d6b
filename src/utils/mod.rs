mod file;
mod validation;

pub use file::*;
pub use validation::*;
