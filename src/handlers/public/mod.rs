// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, public image files and liveness. Inputs here come from
// anonymous callers and are validated before touching the store.
pub mod imagefiles;
pub mod root;
pub mod tokens;
pub mod users;

pub use imagefiles::{image_response, imagefile_get};
pub use root::{api_root, health, root};
pub use tokens::tokens_post;
pub use users::users_post;
