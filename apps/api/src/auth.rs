mod bootstrap;
mod request_context;
mod session;

pub use bootstrap::bootstrap_handler;
pub use request_context::request_metadata;
pub use session::{logout_handler, me_handler};

pub const SESSION_PRINCIPAL_KEY: &str = "principal";
/// Absolute session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
