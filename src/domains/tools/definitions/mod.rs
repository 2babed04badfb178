//! Tool definitions module.
//!
//! One catalog per platform. A process serves exactly one of them, picked
//! from configuration at startup.

mod common;
pub mod datadog;
pub mod docker;
pub mod elasticsearch;
pub mod github;
pub mod gitlab;
pub mod jenkins;
pub mod nexus;

use super::registry::ToolDescriptor;
use crate::core::config::Platform;

/// Every tool descriptor served for `platform`.
pub fn catalog(platform: Platform) -> Vec<ToolDescriptor> {
    match platform {
        Platform::Jenkins => jenkins::tools(),
        Platform::Github => github::tools(),
        Platform::Gitlab => gitlab::tools(),
        Platform::Nexus => nexus::tools(),
        Platform::Docker => docker::tools(),
        Platform::Datadog => datadog::tools(),
        Platform::Elasticsearch => elasticsearch::tools(),
    }
}
