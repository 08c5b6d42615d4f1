//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Page;

/// Offset pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Rows to skip. Defaults to 0.
    #[serde(default)]
    pub skip: u32,
    /// Rows to return (1 to 100). Defaults to 50.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    Page::DEFAULT_LIMIT
}

impl PageParams {
    /// Converts to a clamped [`Page`].
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Always `"success"`.
    pub status: &'static str,
}

impl StatusResponse {
    /// The success acknowledgement.
    #[must_use]
    pub const fn success() -> Self {
        Self { status: "success" }
    }
}
