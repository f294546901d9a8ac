//! # RPC API
//!
//! HTTP/JSON surface in the Twirp convention: every method is a `POST` to
//! `/twirp/keytree.v1.SecretTree/<Method>` with a JSON body, and errors come
//! back as `{"code", "msg"}` with a matching HTTP status.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState, SERVICE_PATH};
pub use server::start_api_server;
