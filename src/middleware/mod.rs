pub mod auth;
pub mod response;

pub use auth::{require_access_token, require_refresh_token, AccessPrincipal, RefreshPrincipal};
pub use response::{ApiResponse, ApiResult};
