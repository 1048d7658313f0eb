pub mod field_value;
pub mod kinds;

pub use field_value::*;
pub use kinds::*;
