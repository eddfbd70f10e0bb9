//! Server configuration.
//!
//! Every process-wide knob lives in [`ServerConfig`], built once at startup
//! via its [`ServerConfigBuilder`] and then shared read-only with every
//! request handler. Nothing in it is mutated after the server starts.

use crate::error::ConvertError;
use serde::Serialize;
use std::path::PathBuf;

/// Default byte budget for JPEG/PNG outputs, in KiB.
pub const DEFAULT_BUDGET_KB: u64 = 500;

/// Default request body ceiling (100 MiB). Base64 inflates uploads by a
/// third, so this admits roughly 75 MiB of raw files per request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 100 * 1024 * 1024;

/// Configuration for the conversion server.
///
/// # Example
/// ```rust
/// use pixdoc::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(8080)
///     .default_budget_kb(250)
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Address to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 5000.
    pub port: u16,

    /// Maximum accepted request body in bytes. Default: 100 MiB.
    ///
    /// Uploads arrive base64-encoded inside JSON, so the whole batch must fit
    /// in one body.
    pub max_request_bytes: usize,

    /// Byte budget in KiB applied when a request omits `max_file_size`.
    /// Default: 500.
    pub default_budget_kb: u64,

    /// Title written into DOCX and PPTX outputs. Default: "Converted Images".
    pub document_title: String,

    /// Explicit path to the pdfium shared library. If None, the system
    /// library search path is used.
    pub pdfium_library: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            default_budget_kb: DEFAULT_BUDGET_KB,
            document_title: "Converted Images".to_string(),
            pdfium_library: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_request_bytes(mut self, bytes: usize) -> Self {
        self.config.max_request_bytes = bytes;
        self
    }

    pub fn default_budget_kb(mut self, kb: u64) -> Self {
        self.config.default_budget_kb = kb;
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.config.document_title = title.into();
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, ConvertError> {
        let c = &self.config;
        if c.host.trim().is_empty() {
            return Err(ConvertError::InvalidConfig("host must not be empty".into()));
        }
        if c.max_request_bytes < 1024 {
            return Err(ConvertError::InvalidConfig(format!(
                "max_request_bytes must be ≥ 1024, got {}",
                c.max_request_bytes
            )));
        }
        if c.document_title.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "document_title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
