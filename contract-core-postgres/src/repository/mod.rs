pub mod audit_store;
pub mod contract_sql;
pub mod department_sql;
pub mod entity_sql;
pub mod principal_directory;

pub use audit_store::*;
pub use entity_sql::*;
pub use principal_directory::*;
