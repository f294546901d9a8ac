//! In-memory secret store for testing and local development.
//!
//! Entries are stored under their logical paths, per environment, with a
//! shared partition for mounts that every environment sees (`templates/`).
//! Listings are derived from the stored paths in insertion order, so the
//! order a test inserts entries in is the order the tree builder observes.
//!
//! Faults (list errors, read errors, listing warnings) can be attached to any
//! path to exercise the error contract without a live backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::client::{Fields, Listing, SecretStore, StoreConnector};
use super::error::{Result, StoreError};
use super::is_shared_path;
use crate::errors::Error;

#[derive(Debug, Clone)]
enum FaultKind {
    ListError(String),
    ReadError(String),
    Warnings(Vec<String>),
}

#[derive(Debug, Clone)]
struct Fault {
    /// `None` applies the fault in every environment
    environment: Option<String>,
    path: String,
    kind: FaultKind,
}

#[derive(Debug, Clone, Default)]
struct MemoryData {
    shared: Vec<(String, Fields)>,
    environments: HashMap<String, Vec<(String, Fields)>>,
    faults: Vec<Fault>,
}

/// In-memory store and connector.
///
/// Configure it with the `with_*` builders before handing it to a service;
/// once shared, its contents are read-only.
///
/// # Example
///
/// ```rust,ignore
/// let store = MemoryStore::new()
///     .with_entry("dev", "values/billing/app.yml", fields)
///     .with_list_error("QA", "values/", "permission denied");
/// let session = store.connect("dev").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<MemoryData>,
    sessions: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `fields` at `path` for one environment.
    pub fn with_entry(
        mut self,
        environment: impl Into<String>,
        path: impl Into<String>,
        fields: Fields,
    ) -> Self {
        Arc::make_mut(&mut self.data)
            .environments
            .entry(environment.into())
            .or_default()
            .push((path.into(), fields));
        self
    }

    /// Store `fields` at `path` in the partition every environment shares.
    pub fn with_shared_entry(mut self, path: impl Into<String>, fields: Fields) -> Self {
        Arc::make_mut(&mut self.data).shared.push((path.into(), fields));
        self
    }

    /// Register an environment with no entries.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.data).environments.entry(environment.into()).or_default();
        self
    }

    /// Make listing `path` in `environment` fail.
    pub fn with_list_error(
        self,
        environment: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.with_fault(Some(environment.into()), path, FaultKind::ListError(message.into()))
    }

    /// Make reading `path` in `environment` fail.
    pub fn with_read_error(
        self,
        environment: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.with_fault(Some(environment.into()), path, FaultKind::ReadError(message.into()))
    }

    /// Attach warnings to every listing of `path`, in any environment.
    pub fn with_warnings(self, path: impl Into<String>, warnings: Vec<String>) -> Self {
        self.with_fault(None, path, FaultKind::Warnings(warnings))
    }

    fn with_fault(
        mut self,
        environment: Option<String>,
        path: impl Into<String>,
        kind: FaultKind,
    ) -> Self {
        Arc::make_mut(&mut self.data).faults.push(Fault { environment, path: path.into(), kind });
        self
    }

    /// Number of sessions opened through this store so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Load a store from a YAML seed file.
    ///
    /// ```yaml
    /// shared:
    ///   - path: templates/billing/app.yml/template-file
    ///     fields: { data: "ZGI6IHt9", ext: ".yml" }
    /// environments:
    ///   - name: dev
    ///     entries:
    ///       - path: values/billing/app.yml
    ///         fields: { db_host: "db.dev.internal" }
    /// ```
    pub fn from_seed_file(path: &Path) -> crate::errors::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read seed file '{}': {}", path.display(), e))
        })?;
        Self::from_seed_str(&contents)
    }

    /// Load a store from YAML seed contents.
    pub fn from_seed_str(contents: &str) -> crate::errors::Result<Self> {
        let seed: SeedFile = serde_yaml::from_str(contents)
            .map_err(|e| Error::config(format!("Invalid seed file: {}", e)))?;

        let mut store = Self::new();
        for entry in seed.shared {
            store = store.with_shared_entry(entry.path, entry.fields);
        }
        for environment in seed.environments {
            store = store.with_environment(environment.name.clone());
            for entry in environment.entries {
                store = store.with_entry(environment.name.clone(), entry.path, entry.fields);
            }
        }

        tracing::info!(
            environments = store.data.environments.len(),
            shared_entries = store.data.shared.len(),
            "Loaded in-memory secret store seed"
        );
        Ok(store)
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    shared: Vec<SeedEntry>,
    #[serde(default)]
    environments: Vec<SeedEnvironment>,
}

#[derive(Debug, Deserialize)]
struct SeedEnvironment {
    name: String,
    #[serde(default)]
    entries: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    path: String,
    #[serde(default)]
    fields: Fields,
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self, environment: &str) -> Result<Arc<dyn SecretStore>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemorySession {
            environment: environment.to_string(),
            data: self.data.clone(),
        }))
    }
}

/// A session over a [`MemoryStore`], bound to one environment.
#[derive(Debug)]
pub struct MemorySession {
    environment: String,
    data: Arc<MemoryData>,
}

impl MemorySession {
    fn partition(&self, path: &str) -> &[(String, Fields)] {
        if is_shared_path(path) {
            &self.data.shared
        } else {
            self.data.environments.get(&self.environment).map(Vec::as_slice).unwrap_or(&[])
        }
    }

    fn faults_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FaultKind> + 'a {
        self.data
            .faults
            .iter()
            .filter(move |f| {
                f.path == path
                    && f.environment.as_deref().map_or(true, |env| env == self.environment)
            })
            .map(|f| &f.kind)
    }
}

#[async_trait]
impl SecretStore for MemorySession {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn list(&self, path: &str) -> Result<Listing> {
        let mut warnings = Vec::new();
        for fault in self.faults_for(path) {
            match fault {
                FaultKind::ListError(message) => {
                    return Err(StoreError::unavailable(path, message.clone()))
                }
                FaultKind::Warnings(w) => warnings.extend(w.iter().cloned()),
                FaultKind::ReadError(_) => {}
            }
        }

        let prefix = if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };

        let mut keys: Vec<String> = Vec::new();
        for (entry_path, _) in self.partition(path) {
            let Some(rest) = entry_path.strip_prefix(&prefix) else { continue };
            if rest.is_empty() {
                continue;
            }
            let child = match rest.find('/') {
                Some(idx) => &rest[..=idx],
                None => rest,
            };
            if !keys.iter().any(|k| k == child) {
                keys.push(child.to_string());
            }
        }

        Ok(Listing::new(keys).with_warnings(warnings))
    }

    async fn read_data(&self, path: &str) -> Result<Option<Fields>> {
        for fault in self.faults_for(path) {
            if let FaultKind::ReadError(message) = fault {
                return Err(StoreError::unavailable(path, message.clone()));
            }
        }

        Ok(self
            .partition(path)
            .iter()
            .find(|(entry_path, _)| entry_path == path)
            .map(|(_, fields)| fields.clone()))
    }
}
