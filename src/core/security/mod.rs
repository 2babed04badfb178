// Security module for outbound endpoint construction
//
// This module keeps caller-supplied path material from escaping the
// configured base URL: no absolute-URL overrides, no `.`/`..` traversal,
// and every segment percent-encoded on its own.

pub mod endpoint;

pub use endpoint::{EndpointError, join_endpoint, split_path, validate_segment};
