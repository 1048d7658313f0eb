pub mod access_guard;
pub mod history;
pub mod mutation_gate;

pub use access_guard::*;
pub use history::*;
pub use mutation_gate::*;
