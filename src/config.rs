pub use crate::schema::Config;

use crate::schema::{Findings, Key, Severity};

// config values are generated at compile time from cfg.toml
include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// Logs every provisioning value, secrets redacted.
pub fn log_summary(config: &Config<'_>) {
    for key in Key::ALL {
        log::info!("{} = {}", key.symbol(), config.value(key));
    }
}

/// Logs the result of [`Config::check`], returning `false` when it holds errors.
pub fn log_findings(findings: &Findings) -> bool {
    for finding in findings {
        match finding.severity() {
            Severity::Warning => log::warn!("{}", finding),
            Severity::Error => log::error!("{}", finding),
        }
    }
    !findings.has_errors()
}
