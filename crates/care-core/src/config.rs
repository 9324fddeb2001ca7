//! Discharge summary service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::lock::LOCK_DURATION;

/// Signed download links stay valid for two days.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);
/// Longest validity accepted for a signed download link.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_FROM_EMAIL: &str = "webmaster@localhost";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:9000/files";

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for generating, storing and sending discharge summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    pub typst_binary: PathBuf,
    pub compiler_working_dir: PathBuf,
    pub logo_path: PathBuf,
    pub lock_ttl: Duration,
    pub signed_url_ttl: Duration,
    pub default_from_email: String,
    pub storage_root: PathBuf,
    /// Where queued outgoing mail is written
    pub outbox_dir: PathBuf,
    pub signing_secret: String,
    pub public_base_url: String,
}

impl SummaryConfig {
    /// Defaults relative to a static asset root and a storage root.
    pub fn new<S: AsRef<Path>, R: Into<PathBuf>>(static_root: S, storage_root: R) -> Self {
        let storage_root = storage_root.into();
        Self {
            typst_binary: PathBuf::from(care_typst::DEFAULT_TYPST_BINARY),
            compiler_working_dir: PathBuf::from("/"),
            logo_path: static_root
                .as_ref()
                .join("images")
                .join("logos")
                .join("black-logo.svg"),
            lock_ttl: LOCK_DURATION,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            default_from_email: DEFAULT_FROM_EMAIL.to_string(),
            outbox_dir: storage_root.join("outbox"),
            storage_root,
            signing_secret: String::new(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }

    pub fn with_typst_binary<P: Into<PathBuf>>(mut self, binary: P) -> Self {
        self.typst_binary = binary.into();
        self
    }

    pub fn with_compiler_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.compiler_working_dir = dir.into();
        self
    }

    pub fn with_logo_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.logo_path = path.into();
        self
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    pub fn with_default_from_email(mut self, email: &str) -> Self {
        self.default_from_email = email.to_string();
        self
    }

    pub fn with_outbox_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.outbox_dir = dir.into();
        self
    }

    pub fn with_signing_secret(mut self, secret: &str) -> Self {
        self.signing_secret = secret.to_string();
        self
    }

    pub fn with_public_base_url(mut self, url: &str) -> Self {
        self.public_base_url = url.to_string();
        self
    }

    /// Read `CARE_*` environment variables.
    ///
    /// `CARE_STATIC_ROOT`, `CARE_STORAGE_ROOT` and `CARE_SIGNING_SECRET` are
    /// required; everything else falls back to the defaults of [`SummaryConfig::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let static_root = lookup("CARE_STATIC_ROOT").ok_or(ConfigError::Missing("CARE_STATIC_ROOT"))?;
        let storage_root =
            lookup("CARE_STORAGE_ROOT").ok_or(ConfigError::Missing("CARE_STORAGE_ROOT"))?;
        let secret =
            lookup("CARE_SIGNING_SECRET").ok_or(ConfigError::Missing("CARE_SIGNING_SECRET"))?;

        let mut config = Self::new(static_root, storage_root).with_signing_secret(&secret);

        if let Some(binary) = lookup("CARE_TYPST_BINARY") {
            config.typst_binary = binary.into();
        }
        if let Some(dir) = lookup("CARE_COMPILER_WORKING_DIR") {
            config.compiler_working_dir = dir.into();
        }
        if let Some(path) = lookup("CARE_LOGO_PATH") {
            config.logo_path = path.into();
        }
        if let Some(raw) = lookup("CARE_LOCK_TTL_SECS") {
            config.lock_ttl = parse_secs("CARE_LOCK_TTL_SECS", raw)?;
        }
        if let Some(raw) = lookup("CARE_SIGNED_URL_TTL_SECS") {
            config.signed_url_ttl = parse_secs("CARE_SIGNED_URL_TTL_SECS", raw)?;
        }
        if let Some(email) = lookup("CARE_DEFAULT_FROM_EMAIL") {
            config.default_from_email = email;
        }
        if let Some(dir) = lookup("CARE_OUTBOX_DIR") {
            config.outbox_dir = dir.into();
        }
        if let Some(url) = lookup("CARE_PUBLIC_BASE_URL") {
            config.public_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::Missing("signing_secret"));
        }
        if self.default_from_email.trim().is_empty() {
            return Err(ConfigError::Missing("default_from_email"));
        }
        if self.lock_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                name: "lock_ttl",
                value: "0".to_string(),
            });
        }
        if self.signed_url_ttl.is_zero() || self.signed_url_ttl > MAX_SIGNED_URL_TTL {
            return Err(ConfigError::Invalid {
                name: "signed_url_ttl",
                value: self.signed_url_ttl.as_secs().to_string(),
            });
        }
        Ok(())
    }
}

fn parse_secs(name: &'static str, raw: String) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SummaryConfig::new("/app/staticfiles", "/var/care");
        assert_eq!(config.typst_binary, PathBuf::from("typst"));
        assert_eq!(config.compiler_working_dir, PathBuf::from("/"));
        assert_eq!(
            config.logo_path,
            PathBuf::from("/app/staticfiles/images/logos/black-logo.svg")
        );
        assert_eq!(config.lock_ttl, Duration::from_secs(120));
        assert_eq!(config.signed_url_ttl, Duration::from_secs(172_800));
        assert_eq!(config.outbox_dir, PathBuf::from("/var/care/outbox"));
    }

    #[test]
    fn test_validation() {
        let config = SummaryConfig::new("/s", "/r");
        assert_eq!(config.validate(), Err(ConfigError::Missing("signing_secret")));

        let config = config.with_signing_secret("k").with_default_from_email(" ");
        assert_eq!(config.validate(), Err(ConfigError::Missing("default_from_email")));

        let config = config.with_default_from_email("care@example.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = SummaryConfig::from_lookup(lookup(&[
            ("CARE_STATIC_ROOT", "/static"),
            ("CARE_STORAGE_ROOT", "/data"),
            ("CARE_SIGNING_SECRET", "s3cret"),
            ("CARE_TYPST_BINARY", "/usr/local/bin/typst"),
            ("CARE_SIGNED_URL_TTL_SECS", "3600"),
        ]))
        .unwrap();

        assert_eq!(config.typst_binary, PathBuf::from("/usr/local/bin/typst"));
        assert_eq!(config.signed_url_ttl, Duration::from_secs(3600));
        assert_eq!(config.lock_ttl, LOCK_DURATION);
        assert_eq!(config.signing_secret, "s3cret");
    }

    #[test]
    fn test_from_lookup_errors() {
        let missing = SummaryConfig::from_lookup(lookup(&[("CARE_STATIC_ROOT", "/s")]));
        assert_eq!(missing, Err(ConfigError::Missing("CARE_STORAGE_ROOT")));

        let invalid = SummaryConfig::from_lookup(lookup(&[
            ("CARE_STATIC_ROOT", "/s"),
            ("CARE_STORAGE_ROOT", "/d"),
            ("CARE_SIGNING_SECRET", "k"),
            ("CARE_LOCK_TTL_SECS", "two minutes"),
        ]));
        assert!(matches!(invalid, Err(ConfigError::Invalid { name: "CARE_LOCK_TTL_SECS", .. })));
    }

    #[test]
    fn test_signed_url_ttl_bounds() {
        let config = SummaryConfig::new("/s", "/r").with_signing_secret("k");

        let zero = config.clone().with_signed_url_ttl(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid { name: "signed_url_ttl", .. })));

        let week = config.clone().with_signed_url_ttl(MAX_SIGNED_URL_TTL);
        assert!(week.validate().is_ok());

        let too_long = SummaryConfig::from_lookup(lookup(&[
            ("CARE_STATIC_ROOT", "/s"),
            ("CARE_STORAGE_ROOT", "/d"),
            ("CARE_SIGNING_SECRET", "k"),
            ("CARE_SIGNED_URL_TTL_SECS", "9223372036854775807"),
        ]));
        assert_eq!(
            too_long,
            Err(ConfigError::Invalid {
                name: "signed_url_ttl",
                value: "9223372036854775807".to_string(),
            })
        );
    }
}
