// handlers/scoped/mod.rs - Tenant context handlers
//
// Reached as /<slug>/... and routed after the prefix is stripped. The bound
// connection in the request extensions is already scoped to the tenant.

pub mod dashboard; // GET /dashboard/

pub use dashboard::dashboard;
