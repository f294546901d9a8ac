//! Secret tree request handlers.
//!
//! Four independent operations over the secret store. Each call opens its own
//! session (one per environment for [`SecretTreeService::get_full_tree`]),
//! runs under the configured request deadline, and either returns a complete
//! result or an error; nothing is cached between calls.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::config::TreeConfig;
use crate::observability::metrics;
use crate::store::{Result, StoreConnector, StoreError};
use crate::tree::{
    cancellable, last_segment, list_children, FanOut, FromFields, ListingWarnings,
    TemplateContent, TemplateListResult, Tree, TreeBuilder, ValidationResult, VerificationRecord,
};

/// Runtime settings for [`SecretTreeService`].
#[derive(Debug, Clone)]
pub struct TreeSettings {
    /// Ordered environments for full tree requests
    pub environments: Vec<String>,

    /// Environment bound for template requests
    pub default_environment: String,

    /// Warning policy for listings other than template listings
    pub listing_warnings: ListingWarnings,

    pub fan_out: FanOut,

    /// Deadline applied to every request
    pub request_timeout: Duration,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self::from(&TreeConfig::default())
    }
}

impl From<&TreeConfig> for TreeSettings {
    fn from(config: &TreeConfig) -> Self {
        Self {
            environments: config.environments.clone(),
            default_environment: config.default_environment.clone(),
            listing_warnings: config.listing_warnings,
            fan_out: config.fan_out,
            request_timeout: config.request_timeout(),
        }
    }
}

/// Service implementing the secret tree operations
pub struct SecretTreeService {
    connector: Arc<dyn StoreConnector>,
    settings: TreeSettings,
}

impl SecretTreeService {
    pub fn new(connector: Arc<dyn StoreConnector>, settings: TreeSettings) -> Self {
        Self { connector, settings }
    }

    /// Template files directly under `templates/<service>/`, directories excluded.
    ///
    /// Listing warnings always fail this call, regardless of the configured
    /// policy.
    pub async fn list_service_templates(
        &self,
        service: &str,
        cancel: &CancellationToken,
    ) -> Result<TemplateListResult> {
        validate_segment("service", service)?;

        let span = crate::rpc_span!("ListServiceTemplates", service = %service);
        self.run("ListServiceTemplates", cancel, async {
            let session = self.connector.connect(&self.settings.default_environment).await?;
            let prefix = format!("templates/{}/", service);

            let children = list_children(session.as_ref(), &prefix, ListingWarnings::Fatal)
                .await
                .map_err(|e| match e {
                    StoreError::StoreWarning { warnings, .. } => {
                        StoreError::warning(service, warnings)
                    }
                    other => other,
                })?;

            let templates = children
                .iter()
                .filter(|path| !path.ends_with('/'))
                .map(|path| last_segment(path).to_string())
                .collect();

            Ok(TemplateListResult { templates })
        })
        .instrument(span)
        .await
    }

    /// Content of `templates/<service>/<file>/template-file`.
    pub async fn get_template(
        &self,
        service: &str,
        file: &str,
        cancel: &CancellationToken,
    ) -> Result<TemplateContent> {
        validate_segment("service", service)?;
        validate_segment("file", file)?;

        let span = crate::rpc_span!("GetTemplate", service = %service, file = %file);
        self.run("GetTemplate", cancel, async {
            let session = self.connector.connect(&self.settings.default_environment).await?;
            let path = format!("templates/{}/{}/template-file", service, file);

            match session.read_data(&path).await? {
                Some(fields) => TemplateContent::from_fields(&path, &fields),
                None => Err(StoreError::not_found(format!("No file {} under {}", file, service))),
            }
        })
        .instrument(span)
        .await
    }

    /// Verification flag stored at `verification/<service>` in `env`.
    pub async fn validate(
        &self,
        service: &str,
        env: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        validate_segment("service", service)?;
        validate_segment("env", env)?;

        let span = crate::rpc_span!("Validate", service = %service, env = %env);
        self.run("Validate", cancel, async {
            let session = self.connector.connect(env).await?;
            let path = format!("verification/{}", service);

            match session.read_data(&path).await? {
                Some(fields) => {
                    let record = VerificationRecord::from_fields(&path, &fields)?;
                    Ok(ValidationResult { is_valid: record.verified })
                }
                None => Err(StoreError::not_found(format!(
                    "No verification for {} found under {} environment",
                    service, env
                ))),
            }
        })
        .instrument(span)
        .await
    }

    /// Complete snapshot of every configured environment.
    pub async fn get_full_tree(&self, cancel: &CancellationToken) -> Result<Tree> {
        let span = crate::rpc_span!("GetFullTree");
        self.run("GetFullTree", cancel, async {
            TreeBuilder::new(self.connector.clone(), self.settings.environments.clone())
                .with_listing_warnings(self.settings.listing_warnings)
                .with_fan_out(self.settings.fan_out)
                .build(cancel)
                .await
        })
        .instrument(span)
        .await
    }

    /// Apply cancellation and the request deadline, then record the outcome.
    async fn run<T, F>(
        &self,
        method: &'static str,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();

        let result =
            match tokio::time::timeout(self.settings.request_timeout, cancellable(cancel, fut))
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout_seconds = self.settings.request_timeout.as_secs(),
                        "Request deadline elapsed"
                    );
                    Err(StoreError::Cancelled)
                }
            };

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => {
                metrics::record_rpc(method, "ok", elapsed);
                info!(duration_ms = (elapsed * 1000.0) as u64, "Request completed");
            }
            Err(e) => {
                metrics::record_rpc(method, e.kind(), elapsed);
                warn!(error = %e, kind = e.kind(), "Request failed");
            }
        }

        result
    }
}

/// Reject names that are empty or would address a different namespace.
fn validate_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_argument(field, "must not be empty"));
    }
    if value.contains('/') {
        return Err(StoreError::invalid_argument(field, "must not contain '/'"));
    }
    Ok(())
}
