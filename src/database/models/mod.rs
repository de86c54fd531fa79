pub mod tenant;

pub use tenant::{ApprovalStatus, Domain, NewTenant, SchoolType, Tenant};
