//! Call-time logic.
//!
//! - **executor**: turns an [`ApiRequest`](executor::ApiRequest) into one
//!   outbound HTTP call and a normalized result.
//! - **tools**: parameter schemas, the per-platform catalogs and the
//!   dispatcher that ties them to the executor.

pub mod executor;
pub mod tools;
