use std::path::{Path, PathBuf};

use anyhow::Context;
use infakt_core::InfaktClient;

use crate::account::download_account_details;
use crate::catalog::default_catalog;
use crate::config::MirrorConfig;
use crate::mirror::writer::WriteResult;
use crate::mirror::{CategoryMirror, CategorySpec};

pub const ACCOUNT_DETAILS_UNIT: &str = "account details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitResult {
    pub name: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units: Vec<UnitResult>,
}

impl RunSummary {
    pub fn all_success(&self) -> bool {
        self.units.iter().all(|unit| unit.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .filter(|unit| !unit.success)
            .map(|unit| unit.name.as_str())
    }

    fn record(&mut self, name: &str, success: bool) {
        self.units.push(UnitResult {
            name: name.to_string(),
            success,
        });
    }
}

pub struct Runner {
    client: InfaktClient,
    data_dir: PathBuf,
    catalog: Vec<CategorySpec>,
    account_details: bool,
}

impl Runner {
    pub fn new(client: InfaktClient, data_dir: impl Into<PathBuf>, catalog: Vec<CategorySpec>) -> Self {
        Self {
            client,
            data_dir: data_dir.into(),
            catalog,
            account_details: true,
        }
    }

    pub fn from_config(config: &MirrorConfig) -> anyhow::Result<Self> {
        let client = InfaktClient::with_base_url(&config.api_domain, config.api_key.clone())
            .context("invalid INFAKT_API_DOMAIN")?
            .with_retry_policy(config.retry);
        Ok(Self::new(
            client,
            config.data_dir.clone(),
            default_catalog(config.page_size),
        ))
    }

    pub fn with_account_details(mut self, enabled: bool) -> Self {
        self.account_details = enabled;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("failed to create data directory {:?}", self.data_dir))
    }

    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        if self.account_details {
            match download_account_details(&self.client, &self.data_dir).await {
                Ok(result) => {
                    tracing::info!(
                        changed = result == WriteResult::Written,
                        "finished fetching account details"
                    );
                    summary.record(ACCOUNT_DETAILS_UNIT, true);
                }
                Err(err) => {
                    tracing::error!(
                        category = ACCOUNT_DETAILS_UNIT,
                        kind = err.kind(),
                        error = %err,
                        "failed to handle account details"
                    );
                    summary.record(ACCOUNT_DETAILS_UNIT, false);
                }
            }
        }

        for spec in &self.catalog {
            let mirror = CategoryMirror::new(&self.client, spec, &self.data_dir);
            match mirror.run().await {
                Ok(report) => {
                    tracing::info!(
                        category = %spec.name,
                        listed = report.listed,
                        written = report.written,
                        unchanged = report.unchanged,
                        renamed = report.renamed,
                        tombstoned = report.tombstoned,
                        attachments = report.attachments,
                        "finished mirroring category"
                    );
                    summary.record(&spec.name, true);
                }
                Err(err) => {
                    tracing::error!(
                        category = %spec.name,
                        kind = err.kind(),
                        error = %err,
                        "failed to mirror category"
                    );
                    summary.record(&spec.name, false);
                }
            }
        }

        summary
    }
}
