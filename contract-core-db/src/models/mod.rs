pub mod audited;
pub mod change_record;
pub mod contract;
pub mod department;
pub mod principal;

pub use audited::*;
pub use change_record::*;
pub use contract::*;
pub use department::*;
pub use principal::*;
