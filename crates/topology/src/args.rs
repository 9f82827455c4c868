//! Enrichment CLI arguments.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::CertificateTrust;

/// Default bound on a single document fetch or certificate read.
pub const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 10;

/// Settings for the per-peer enrichment pass.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Enrichment")]
#[serde(default)]
pub struct EnrichmentArgs {
    /// Timeout for each DID document fetch and each TLS certificate read.
    #[arg(long = "enrichment.timeout", value_name = "SECONDS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// How peer certificates are checked before their subject is read.
    #[arg(long = "enrichment.certificate-trust", value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_trust: Option<CertificateTrust>,
}

impl EnrichmentArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .unwrap_or(DEFAULT_ENRICHMENT_TIMEOUT_SECS),
        )
    }

    pub fn certificate_trust(&self) -> CertificateTrust {
        self.certificate_trust.unwrap_or_default()
    }
}
