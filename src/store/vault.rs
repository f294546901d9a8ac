//! HashiCorp Vault secret store.
//!
//! Sessions are bound to one environment. Logical paths are mapped onto KV v2
//! mounts: the first path segment names the mount, and the environment is
//! inserted as the first component below it unless the mount is shared by all
//! environments (`templates`).
//!
//! ```text
//! values/billing/app.yml   (env dev)  ->  values/data/dev/billing/app.yml
//! verification/billing     (env QA)   ->  verification/data/QA/billing
//! templates/billing/       (any env)  ->  templates/metadata/billing/
//! ```
//!
//! Reads go through `vaultrs::kv2`. Listings are issued directly over HTTP
//! because the KV helpers in `vaultrs` discard the response `warnings`.
//!
//! # Example
//!
//! ```rust,ignore
//! use keytree::store::{StoreConnector, VaultConfig, VaultConnector};
//!
//! let connector = VaultConnector::new(VaultConfig::from_env())?;
//! let session = connector.connect("dev").await?;
//! let listing = session.list("values/").await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::{Fields, Listing, SecretStore, StoreConnector};
use super::error::{Result, StoreError};
use super::types::SecretToken;
use super::SHARED_MOUNTS;
use crate::errors::Error;
use crate::observability::metrics;

/// Configuration for the Vault backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Access token; acquiring it is the credential provider's job
    pub token: Option<SecretToken>,

    /// Vault namespace (Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// PEM CA certificate used to verify the server
    pub ca_cert_path: Option<PathBuf>,

    /// Per-call HTTP timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            ca_cert_path: None,
            timeout_seconds: 30,
        }
    }
}

impl VaultConfig {
    /// Load Vault settings from `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`,
    /// `VAULT_CACERT`, and `KEYTREE_VAULT_TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let address = std::env::var("VAULT_ADDR").unwrap_or(defaults.address);
        let token =
            std::env::var("VAULT_TOKEN").ok().filter(|t| !t.is_empty()).map(SecretToken::new);
        let namespace = std::env::var("VAULT_NAMESPACE").ok().filter(|n| !n.is_empty());
        let ca_cert_path =
            std::env::var("VAULT_CACERT").ok().filter(|p| !p.is_empty()).map(PathBuf::from);
        let timeout_seconds = std::env::var("KEYTREE_VAULT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.timeout_seconds);

        Self { address, token, namespace, ca_cert_path, timeout_seconds }
    }

    fn normalized_address(&self) -> String {
        self.address.trim_end_matches('/').to_string()
    }
}

/// Opens environment-bound Vault sessions.
///
/// The HTTP client used for listings is built once and shared; each call to
/// [`StoreConnector::connect`] builds a fresh `vaultrs` client for reads.
pub struct VaultConnector {
    config: VaultConfig,
    http: reqwest::Client,
}

impl VaultConnector {
    /// Creates a connector for the given configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the address is empty or the CA certificate cannot be loaded
    pub fn new(config: VaultConfig) -> crate::errors::Result<Self> {
        if config.address.is_empty() {
            return Err(Error::config("Vault address cannot be empty"));
        }

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if let Some(path) = config.ca_cert_path.as_ref() {
            let pem = std::fs::read(path).map_err(|e| {
                Error::config(format!("Failed to read CA certificate '{}': {}", path.display(), e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::config(format!("Invalid CA certificate '{}': {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

}

#[async_trait]
impl StoreConnector for VaultConnector {
    async fn connect(&self, environment: &str) -> Result<Arc<dyn SecretStore>> {
        let address = self.config.normalized_address();

        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(&address);
        settings.timeout(Some(Duration::from_secs(self.config.timeout_seconds)));

        if let Some(token) = self.config.token.as_ref() {
            settings.token(token.expose());
        }

        if let Some(namespace) = self.config.namespace.clone() {
            settings.namespace(Some(namespace));
        }

        if let Some(path) = self.config.ca_cert_path.as_ref() {
            settings.ca_certs(vec![path.to_string_lossy().into_owned()]);
        }

        let settings = settings.build().map_err(|e| {
            StoreError::unavailable(&address, format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            StoreError::unavailable(&address, format!("Failed to create Vault client: {}", e))
        })?;

        tracing::debug!(environment = %environment, address = %address, "Opened Vault session");

        Ok(Arc::new(VaultSession {
            environment: environment.to_string(),
            address,
            token: self.config.token.clone(),
            namespace: self.config.namespace.clone(),
            client,
            http: self.http.clone(),
        }))
    }
}

/// A Vault session bound to one environment.
pub struct VaultSession {
    environment: String,
    address: String,
    token: Option<SecretToken>,
    namespace: Option<String>,
    client: VaultClient,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<ListData>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

impl VaultSession {
    /// Map a logical path to its mount and the environment-scoped path below it.
    fn resolve<'a>(&self, path: &'a str) -> (&'a str, String) {
        resolve_path(&self.environment, path)
    }

    async fn list_raw(&self, path: &str) -> Result<Listing> {
        let (mount, scoped) = self.resolve(path);
        let url = format!("{}/v1/{}/metadata/{}", self.address, mount, scoped);

        let mut request = self.http.get(&url).query(&[("list", "true")]);
        if let Some(token) = self.token.as_ref() {
            request = request.header("X-Vault-Token", token.expose());
        }
        if let Some(namespace) = self.namespace.as_ref() {
            request = request.header("X-Vault-Namespace", namespace);
        }

        let response =
            request.send().await.map_err(|e| StoreError::unavailable(path, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Listing::default());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::unavailable(
                path,
                format!("Vault returned {} for list: {}", status, body.trim()),
            ));
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::unavailable(path, format!("Invalid list response: {}", e)))?;

        let keys = body.data.map(|d| d.keys).unwrap_or_default();
        Ok(Listing::new(keys).with_warnings(body.warnings.unwrap_or_default()))
    }

    async fn read_raw(&self, path: &str) -> Result<Option<Fields>> {
        let (mount, scoped) = self.resolve(path);

        match kv2::read::<Fields>(&self.client, mount, &scoped).await {
            Ok(fields) => Ok(Some(fields)),
            Err(ClientError::APIError { code: 404, .. }) => Ok(None),
            Err(e) => Err(StoreError::unavailable(path, e.to_string())),
        }
    }
}

#[async_trait]
impl SecretStore for VaultSession {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn list(&self, path: &str) -> Result<Listing> {
        let started = Instant::now();
        let result = self
            .list_raw(path)
            .instrument(crate::store_span!("list", self.environment, path))
            .await;
        metrics::record_store_call("list", result.is_ok(), started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                environment = %self.environment,
                path = %path,
                "Failed to list path in Vault"
            );
        }
        result
    }

    async fn read_data(&self, path: &str) -> Result<Option<Fields>> {
        let started = Instant::now();
        let result = self
            .read_raw(path)
            .instrument(crate::store_span!("read", self.environment, path))
            .await;
        metrics::record_store_call("read", result.is_ok(), started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                environment = %self.environment,
                path = %path,
                "Failed to read path from Vault"
            );
        }
        result
    }
}

/// Split a logical path into its mount and the environment-scoped remainder.
pub fn resolve_path<'a>(environment: &str, path: &'a str) -> (&'a str, String) {
    let (mount, rest) = path.split_once('/').unwrap_or((path, ""));

    if SHARED_MOUNTS.contains(&mount) {
        (mount, rest.to_string())
    } else {
        (mount, format!("{}/{}", environment, rest))
    }
}
