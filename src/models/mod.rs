// Re-export all model types from submodules
mod card;
mod catalog;

pub use card::*;
pub use catalog::*;
