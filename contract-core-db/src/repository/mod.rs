pub mod memory;
pub mod pagination;
pub mod store;

pub use memory::*;
pub use pagination::*;
pub use store::*;
