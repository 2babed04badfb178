use reqwest::Url;

/// Errors that can occur while building an outbound endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("Path '{0}' looks like an absolute URL; only paths relative to the base URL are allowed")]
    AbsoluteUrl(String),

    #[error("Path segment '{0}' is not allowed")]
    Traversal(String),

    #[error("Path segments must not be empty")]
    EmptySegment,

    #[error("Base URL '{0}' cannot carry a path")]
    CannotBeBase(String),
}

/// Validates a single path segment before it is encoded onto the base URL.
pub fn validate_segment(segment: &str) -> Result<(), EndpointError> {
    match segment {
        "" => Err(EndpointError::EmptySegment),
        "." | ".." => Err(EndpointError::Traversal(segment.to_string())),
        _ => Ok(()),
    }
}

/// Splits a relative path such as `"/api/json"` into validated segments.
///
/// Leading, trailing and doubled slashes are ignored. Anything that would
/// let the path replace the host (`scheme://...` or `//host/...`) is rejected.
///
/// # Examples
///
/// ```rust
/// use devops_mcp_server::core::security::split_path;
///
/// assert_eq!(split_path("/job/build/api/json").unwrap(), vec!["job", "build", "api", "json"]);
/// assert!(split_path("https://evil.example.com/").is_err());
/// ```
pub fn split_path(path: &str) -> Result<Vec<String>, EndpointError> {
    let trimmed = path.trim();
    if trimmed.contains("://") || trimmed.starts_with("//") {
        return Err(EndpointError::AbsoluteUrl(trimmed.to_string()));
    }

    trimmed
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| validate_segment(s).map(|()| s.to_string()))
        .collect()
}

/// Joins `prefix` and `segments` onto `base`, percent-encoding each segment.
///
/// The base URL's own path is kept, so `https://host/service/rest` plus
/// `["v1"]` and `["repositories"]` yields `https://host/service/rest/v1/repositories`.
pub fn join_endpoint(
    base: &Url,
    prefix: &[String],
    segments: &[String],
) -> Result<Url, EndpointError> {
    for segment in prefix.iter().chain(segments) {
        validate_segment(segment)?;
    }

    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| EndpointError::CannotBeBase(base.to_string()))?;
        path.pop_if_empty();
        path.extend(prefix.iter().chain(segments));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_path_ignores_extra_slashes() {
        assert_eq!(split_path("//").unwrap_err(), EndpointError::AbsoluteUrl("//".into()));
        assert_eq!(split_path("/api//json/").unwrap(), strings(&["api", "json"]));
        assert!(split_path("").unwrap().is_empty());
    }

    #[test]
    fn test_split_path_rejects_absolute_urls() {
        assert!(matches!(
            split_path("http://other.example.com/api"),
            Err(EndpointError::AbsoluteUrl(_))
        ));
        assert!(matches!(
            split_path("//other.example.com/api"),
            Err(EndpointError::AbsoluteUrl(_))
        ));
    }

    #[test]
    fn test_split_path_rejects_traversal() {
        assert_eq!(
            split_path("docs/../../admin").unwrap_err(),
            EndpointError::Traversal("..".into())
        );
        assert!(split_path("./api").is_err());
    }

    #[test]
    fn test_join_keeps_base_path() {
        let base = Url::parse("https://repo.example.com/service/rest").unwrap();
        let url =
            join_endpoint(&base, &strings(&["v1", "beta"]), &strings(&["repositories"])).unwrap();
        assert_eq!(url.as_str(), "https://repo.example.com/service/rest/v1/beta/repositories");
    }

    #[test]
    fn test_join_on_bare_host() {
        let base = Url::parse("https://ci.example.com").unwrap();
        let url = join_endpoint(&base, &[], &strings(&["api", "json"])).unwrap();
        assert_eq!(url.as_str(), "https://ci.example.com/api/json");
    }

    #[test]
    fn test_join_encodes_each_segment() {
        let base = Url::parse("https://ci.example.com/").unwrap();
        let segments = strings(&["job", "my job/with?odd#chars", "api"]);
        let url = join_endpoint(&base, &[], &segments).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ci.example.com/job/my%20job%2Fwith%3Fodd%23chars/api"
        );
        assert_eq!(url.host_str(), Some("ci.example.com"));
    }

    #[test]
    fn test_join_rejects_dot_segments() {
        let base = Url::parse("https://ci.example.com/").unwrap();
        assert!(join_endpoint(&base, &[], &strings(&["job", ".."])).is_err());
        assert!(join_endpoint(&base, &[], &strings(&["job", ""])).is_err());
    }
}
