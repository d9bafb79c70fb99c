// handlers/protected/mod.rs - Guarded handlers (/api/*)
//
// Every handler here runs behind `require_access_token` or
// `require_refresh_token` and reads its caller from the request extensions.
// Records owned by someone else are reported as absent.
pub mod access_tokens;
pub mod auth;
pub mod cardsets;
pub mod games;
pub mod images;
pub mod refresh_tokens;
