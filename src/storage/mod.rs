pub mod session_store;

pub use session_store::{Session, SessionStore, TOKEN_ENV_VAR};
