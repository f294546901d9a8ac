//! Full tree materialization.
//!
//! For each configured environment, in order: open a session, list `values/`
//! for services, list each service for files, and read each file's leaf data.
//! Any list or read failure aborts the whole build; no partial tree is ever
//! returned.
//!
//! With [`FanOut::Concurrent`] the environments, the services of an
//! environment, and the files of a service are fetched concurrently. Results
//! are tagged with their listing index and re-sorted before assembly, so the
//! output is identical to a sequential build.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::cancellable;
use super::decode::decode_values;
use super::model::{Environment, File, Service, Tree};
use super::path::last_segment;
use super::walker::{list_children, ListingWarnings};
use crate::store::{Result, SecretStore, StoreConnector};

/// Environments materialized by a full tree request, in output order.
pub const DEFAULT_ENVIRONMENTS: [&str; 4] = ["dev", "QA", "local", "secrets"];

/// Root listed in every environment to discover services.
pub const VALUES_ROOT: &str = "values/";

/// How each level of the tree is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOut {
    #[default]
    Sequential,
    Concurrent,
}

impl FromStr for FanOut {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!("unknown fan-out mode '{}'", other)),
        }
    }
}

impl fmt::Display for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// Builds a [`Tree`] across a fixed, ordered list of environments.
pub struct TreeBuilder {
    connector: Arc<dyn StoreConnector>,
    environments: Vec<String>,
    warnings: ListingWarnings,
    fan_out: FanOut,
}

impl TreeBuilder {
    pub fn new(connector: Arc<dyn StoreConnector>, environments: Vec<String>) -> Self {
        Self {
            connector,
            environments,
            warnings: ListingWarnings::default(),
            fan_out: FanOut::default(),
        }
    }

    pub fn with_listing_warnings(mut self, warnings: ListingWarnings) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Materialize every environment.
    ///
    /// # Errors
    ///
    /// The first list, read, or decode failure encountered, or
    /// [`StoreError::Cancelled`](crate::store::StoreError::Cancelled) once `cancel` fires.
    #[instrument(skip_all, fields(environments = self.environments.len(), fan_out = %self.fan_out))]
    pub async fn build(&self, cancel: &CancellationToken) -> Result<Tree> {
        let environments =
            self.each(self.environments.iter(), |name| self.build_environment(name, cancel)).await?;

        let service_count: usize = environments.iter().map(|e| e.services.len()).sum();
        tracing::info!(
            environments = environments.len(),
            services = service_count,
            "Materialized secret tree"
        );

        Ok(Tree { environments })
    }

    async fn build_environment(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Environment> {
        let session = cancellable(cancel, self.connector.connect(name)).await?;

        let service_paths =
            cancellable(cancel, list_children(session.as_ref(), VALUES_ROOT, self.warnings))
                .await?;

        tracing::debug!(environment = %name, services = service_paths.len(), "Listed services");

        let services = self
            .each(service_paths.iter(), |path| self.build_service(&session, path, cancel))
            .await?;

        Ok(Environment { name: name.to_string(), services })
    }

    async fn build_service(
        &self,
        session: &Arc<dyn SecretStore>,
        service_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Service> {
        let file_paths =
            cancellable(cancel, list_children(session.as_ref(), service_path, self.warnings))
                .await?;

        let files =
            self.each(file_paths.iter(), |path| build_file(session.as_ref(), path, cancel)).await?;

        Ok(Service { name: last_segment(service_path).to_string(), files })
    }

    /// Run `f` over `items` per the fan-out mode, keeping input order.
    async fn each<I, T, F, Fut>(&self, items: I, f: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.fan_out {
            FanOut::Sequential => {
                let mut out = Vec::new();
                for fut in items.into_iter().map(f) {
                    out.push(fut.await?);
                }
                Ok(out)
            }
            FanOut::Concurrent => join_ordered(items.into_iter().map(f)).await,
        }
    }
}

async fn build_file(
    session: &dyn SecretStore,
    file_path: &str,
    cancel: &CancellationToken,
) -> Result<File> {
    let values = match cancellable(cancel, session.read_data(file_path)).await? {
        Some(fields) => decode_values(file_path, &fields)?,
        None => Vec::new(),
    };

    Ok(File { name: last_segment(file_path).to_string(), values })
}

/// Drive `futures` concurrently, then restore their input order.
///
/// Stops at the first error; the remaining futures are dropped, which
/// abandons their in-flight store calls.
async fn join_ordered<T, Fut>(futures: impl Iterator<Item = Fut>) -> Result<Vec<T>>
where
    Fut: Future<Output = Result<T>>,
{
    let mut pending: FuturesUnordered<_> = futures
        .enumerate()
        .map(|(index, fut)| async move { fut.await.map(|value| (index, value)) })
        .collect();

    let mut completed = Vec::with_capacity(pending.len());
    while let Some(result) = pending.next().await {
        completed.push(result?);
    }

    completed.sort_by_key(|(index, _)| *index);
    Ok(completed.into_iter().map(|(_, value)| value).collect())
}
