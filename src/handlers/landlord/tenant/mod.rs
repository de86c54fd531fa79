// handlers/landlord/tenant/mod.rs - Tenant lifecycle handlers

pub mod deactivate; // DELETE /landlord/tenants/:slug
pub mod list;       // GET /landlord/tenants
pub mod review;     // PUT /landlord/tenants/:slug/review
pub mod show;       // GET /landlord/tenants/:slug

pub use deactivate::tenant_deactivate;
pub use list::tenant_list;
pub use review::tenant_review;
pub use show::tenant_show;
