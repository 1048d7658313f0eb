pub mod repository;
pub mod unit_of_work;

pub use repository::audit_store::PgAuditStore;
pub use repository::principal_directory::PgPrincipalDirectory;
pub use unit_of_work::TxHandle;

#[cfg(test)]
pub mod test_helper;
