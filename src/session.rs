//! Session identity resolved once per process from the hosting launch
//! context and injected into the transport layer.

use std::env;

pub const AUTH_SCHEME: &str = "tma";

/// Launch credential carried on every gateway call. A missing credential is
/// not an error: calls go out unauthenticated and the backend rejects them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    init_data: Option<String>,
}

impl Session {
    pub fn new(init_data: Option<String>) -> Self {
        let init_data = init_data
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self { init_data }
    }

    /// Reads `LAUNCH_INIT_DATA` from the environment.
    pub fn from_env() -> Self {
        Self::new(env::var("LAUNCH_INIT_DATA").ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.init_data.is_some()
    }

    /// `Authorization` header value, when a credential is present.
    pub fn authorization(&self) -> Option<String> {
        self.init_data
            .as_ref()
            .map(|raw| format!("{AUTH_SCHEME} {raw}"))
    }

    /// Masked form for logs and diagnostics.
    pub fn masked(&self) -> String {
        match &self.init_data {
            Some(raw) => match (raw.get(..4), raw.get(raw.len().saturating_sub(4)..)) {
                (Some(head), Some(tail)) if raw.len() > 8 => format!("{head}****{tail}"),
                _ => "****".to_string(),
            },
            None => "<unauthenticated>".to_string(),
        }
    }
}
