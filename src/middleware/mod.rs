pub mod response;
pub mod tenant_path;

pub use response::{ApiResponse, ApiResult};
pub use tenant_path::{tenant_path_middleware, TenancyState};
