pub mod connection;
pub mod manager;
pub mod models;
pub mod tenants;

pub use connection::{PgConnectionSource, PgSchemaConnection};
pub use manager::{DatabaseError, DatabaseManager};
pub use tenants::PgTenantRegistry;
