//! The API layer, containing web handlers and routing.

pub mod handlers;
pub mod router;

pub use handlers::ApiDoc;
pub use router::{DEFAULT_BODY_LIMIT_BYTES, create_router, create_router_with_body_limit};
