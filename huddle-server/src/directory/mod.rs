mod directory;
mod memory;

pub use directory::*;
pub use memory::*;
