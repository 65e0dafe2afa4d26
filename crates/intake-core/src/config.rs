//! Configuration module
//!
//! Server, database and upload-policy settings loaded from the environment.
//! The upload policy is an explicit value handed to the validator; nothing in
//! the pipeline reads limits from globals.

use std::collections::BTreeSet;
use std::env;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_CONCURRENT_UPLOADS: usize = 64;
const DEFAULT_ALLOWED_EXTENSIONS: &str = ".jpg";

/// Per-deployment upload policy: byte ceiling plus extension allowlist.
///
/// Extensions are stored lowercase with a leading dot (`.jpg`), whatever form
/// they were configured in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: usize,
    allowed_extensions: BTreeSet<String>,
}

impl UploadPolicy {
    pub fn new<I, S>(max_bytes: usize, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        Self {
            max_bytes,
            allowed_extensions,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    /// `extension` must already be normalized.
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }

    pub fn allowed_list(&self) -> Vec<String> {
        self.allowed_extensions.iter().cloned().collect()
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_BYTES, [DEFAULT_ALLOWED_EXTENSIONS])
    }
}

/// Lowercase an extension and give it a leading dot. Blank input yields `None`.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Absent means the in-memory store (development only).
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub upload_policy: UploadPolicy,
    /// Allowance on top of the upload ceiling for boundaries, part headers and small fields.
    pub multipart_overhead_bytes: usize,
    pub request_timeout_secs: u64,
    pub max_concurrent_uploads: usize,
    /// `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| MAX_UPLOAD_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a valid number"))?;

        let allowed_extensions: Vec<String> = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            upload_policy: UploadPolicy::new(max_upload_bytes, allowed_extensions),
            multipart_overhead_bytes: env::var("MULTIPART_OVERHEAD_BYTES")
                .unwrap_or_else(|_| MULTIPART_OVERHEAD_BYTES.to_string())
                .parse()
                .unwrap_or(MULTIPART_OVERHEAD_BYTES),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            max_concurrent_uploads: env::var("MAX_CONCURRENT_UPLOADS")
                .unwrap_or_else(|_| MAX_CONCURRENT_UPLOADS.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_UPLOADS),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Largest request body accepted by the HTTP layer.
    pub fn request_body_limit(&self) -> usize {
        self.upload_policy
            .max_bytes()
            .saturating_add(self.multipart_overhead_bytes)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload_policy.max_bytes() == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than 0"));
        }

        if self.upload_policy.allowed_extensions().is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        if self.max_concurrent_uploads == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_UPLOADS must be greater than 0"
            ));
        }

        match &self.database_url {
            Some(url) if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) => {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
            None if self.is_production() => {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be set in production; the in-memory store is not durable"
                ));
            }
            _ => {}
        }

        Ok(())
    }
}
