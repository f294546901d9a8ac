//! Secret tree model and traversal.
//!
//! [`model`] holds the response types, [`walker`] one level of listing,
//! [`decode`] the typed leaf schemas, and [`builder`] the full
//! environment/service/file materialization.

pub mod builder;
pub mod decode;
pub mod model;
pub mod path;
pub mod walker;

use std::future::Future;

use tokio_util::sync::CancellationToken;

pub use builder::{FanOut, TreeBuilder, DEFAULT_ENVIRONMENTS, VALUES_ROOT};
pub use decode::{decode_values, FromFields, VerificationRecord};
pub use model::{
    Environment, File, Service, TemplateContent, TemplateListResult, Tree, ValidationResult, Value,
};
pub use path::{join_path, last_segment};
pub use walker::{list_children, ListingWarnings};

use crate::store::{Result, StoreError};

/// Await `fut` unless `token` is cancelled first.
///
/// A store call abandoned this way yields [`StoreError::Cancelled`].
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(StoreError::Cancelled),
        result = fut => result,
    }
}
