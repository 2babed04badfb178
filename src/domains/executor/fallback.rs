use serde_json::Value;
use tracing::debug;

use super::RequestExecutor;
use super::request::ApiRequest;
use crate::domains::tools::ToolResult;

/// Ordered API-version prefixes for platforms whose endpoints moved between
/// versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChain {
    prefixes: Vec<String>,
}

impl VersionChain {
    pub fn new(prefixes: &[&str]) -> Self {
        Self {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Nexus REST: stable, then beta, then the older combined prefix.
    pub fn nexus() -> Self {
        Self::new(&["v1", "beta", "v1/beta"])
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Try `request` under each prefix of `chain` in order.
///
/// Only a 404 advances to the next prefix; any other outcome is returned
/// immediately. When every prefix answers 404 the last error is returned.
/// An empty chain means a single attempt with the request as given.
pub async fn execute_versioned(
    executor: &dyn RequestExecutor,
    request: &ApiRequest,
    chain: &VersionChain,
) -> ToolResult<Value> {
    let Some((last, rest)) = chain.prefixes.split_last() else {
        return executor.execute(request).await;
    };

    for prefix in rest {
        let attempt = request.clone().with_prefix(prefix);
        match executor.execute(&attempt).await {
            Err(e) if e.is_not_found() => {
                debug!(
                    prefix = %prefix,
                    path = %attempt.path_display(),
                    "Not found, trying next API version"
                );
            }
            other => return other,
        }
    }

    executor.execute(&request.clone().with_prefix(last)).await
}
