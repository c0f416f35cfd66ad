//! HTTP gateway exposing each pipeline stage as its own endpoint.
//!
//! Every stage is a `POST` with a JSON body and answers either the stage's
//! result object or `{"error": "..."}`. Pre-flight `OPTIONS` probes get an
//! empty success with permissive cross-origin headers.

pub mod api;
pub mod server;

use serde::{Deserialize, Serialize};

pub use server::{router, run};

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Request headers allowed in cross-origin calls.
    pub allowed_headers: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            allowed_headers: vec![
                "authorization".to_string(),
                "x-client-info".to_string(),
                "apikey".to_string(),
                "content-type".to_string(),
            ],
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
