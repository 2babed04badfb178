//! GitHub REST tools.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::{Map, Value, json};

use super::common::page_fields;
use crate::domains::executor::ApiRequest;
use crate::domains::tools::{FieldSpec, ParamSchema, ToolCall, ToolDescriptor, ToolResult};

const ISSUE_STATES: &[&str] = &["open", "closed", "all"];
const VISIBILITIES: &[&str] = &["all", "public", "private"];
const REPO_SORTS: &[&str] = &["created", "updated", "pushed", "full_name"];
const DIRECTIONS: &[&str] = &["asc", "desc"];

fn owner_repo_fields() -> [FieldSpec; 2] {
    [
        FieldSpec::string("owner", "Repository owner (user or organization)").non_empty(),
        FieldSpec::string("repo", "Repository name").non_empty(),
    ]
}

/// `owner` and `repo`, then `fields`, then optionally the page fields.
fn repo_schema(fields: Vec<FieldSpec>, paginated: bool) -> ParamSchema {
    let mut all: Vec<FieldSpec> = owner_repo_fields().into_iter().chain(fields).collect();
    if paginated {
        all.extend(page_fields(30));
    }
    ParamSchema::new(all)
}

fn repo_request(call: &ToolCall<'_>, method: Method, tail: &[&str]) -> ToolResult<ApiRequest> {
    let owner = call.params.require_str("owner")?;
    let repo = call.params.require_str("repo")?;
    let mut segments = vec!["repos".to_string(), owner.to_string(), repo.to_string()];
    segments.extend(tail.iter().map(|s| s.to_string()));
    Ok(ApiRequest::new(method, segments))
}

fn paginate(call: &ToolCall<'_>, request: ApiRequest) -> ApiRequest {
    request
        .query_opt("per_page", call.params.i64("per_page"))
        .query_opt("page", call.params.i64("page"))
}

/// Comma-joined items of a string array parameter.
fn joined(call: &ToolCall<'_>, name: &str) -> Option<String> {
    let items = call.params.strings(name);
    (!items.is_empty()).then(|| items.join(","))
}

/// Decode base64 file content in place when it is valid UTF-8 text.
fn decode_file_content(mut payload: Value) -> Value {
    let Some(file) = payload.as_object_mut() else {
        return payload;
    };
    if file.get("encoding").and_then(Value::as_str) != Some("base64") {
        return payload;
    }

    let encoded: String = file
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match STANDARD.decode(encoded).map(String::from_utf8) {
        Ok(Ok(text)) => {
            file.insert("content".into(), Value::String(text));
            file.insert("encoding".into(), json!("utf-8"));
        }
        _ => {
            file.insert("binary".into(), json!(true));
        }
    }
    payload
}

fn search_repositories(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let query = call.params.require_str("query")?;
        let search = ApiRequest::get(["search", "repositories"]).query("q", query);
        let request = paginate(&call, search);
        call.send(request).await
    }
    .boxed()
}

fn list_user_repositories(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(["user", "repos"])
            .query_opt("visibility", call.params.str("visibility"))
            .query_opt("sort", call.params.str("sort"));
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

fn create_repository(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let body = json!({
            "name": call.params.require_str("name")?,
            "description": call.params.str("description").unwrap_or_default(),
            "private": call.params.bool("private").unwrap_or(false),
            "auto_init": call.params.bool("auto_init").unwrap_or(false),
        });
        call.send(ApiRequest::post(["user", "repos"]).json(body)).await
    }
    .boxed()
}

fn get_file_contents(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = repo_request(&call, Method::GET, &["contents"])?
            .append_path("path", call.params.require_str("path")?)?
            .query_opt("ref", call.params.str("branch"));
        let payload = call.send(request).await?;
        Ok(decode_file_content(payload))
    }
    .boxed()
}

fn list_issues(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = repo_request(&call, Method::GET, &["issues"])?
            .query_opt("state", call.params.str("state"))
            .query_opt("labels", joined(&call, "labels"))
            .query_opt("sort", call.params.str("sort"))
            .query_opt("direction", call.params.str("direction"))
            .query_opt("since", call.params.str("since"));
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

fn create_issue(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        body.insert("title".into(), json!(call.params.require_str("title")?));
        body.insert("body".into(), json!(call.params.str("body").unwrap_or_default()));
        for key in ["assignees", "labels", "milestone"] {
            if let Some(value) = call.params.get(key) {
                body.insert(key.into(), value.clone());
            }
        }

        let request = repo_request(&call, Method::POST, &["issues"])?.json(Value::Object(body));
        call.send(request).await
    }
    .boxed()
}

fn list_pull_requests(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = repo_request(&call, Method::GET, &["pulls"])?
            .query_opt("state", call.params.str("state"))
            .query_opt("base", call.params.str("base"))
            .query_opt("head", call.params.str("head"));
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "search_repositories",
            "Search GitHub repositories using GitHub search syntax.",
            ParamSchema::new(
                std::iter::once(FieldSpec::string("query", "Search query").non_empty())
                    .chain(page_fields(30))
                    .collect(),
            ),
            search_repositories,
        ),
        ToolDescriptor::new(
            "list_user_repositories",
            "List repositories of the authenticated user.",
            ParamSchema::new(
                [
                    FieldSpec::string("visibility", "Repository visibility")
                        .one_of(VISIBILITIES)
                        .default("all"),
                    FieldSpec::string("sort", "Sort field").one_of(REPO_SORTS).default("full_name"),
                ]
                .into_iter()
                .chain(page_fields(30))
                .collect(),
            ),
            list_user_repositories,
        ),
        ToolDescriptor::new(
            "create_repository",
            "Create a repository for the authenticated user.",
            ParamSchema::new(vec![
                FieldSpec::string("name", "Repository name").non_empty(),
                FieldSpec::string("description", "Repository description"),
                FieldSpec::boolean("private", "Create as private").default(false),
                FieldSpec::boolean("auto_init", "Initialize with a README").default(false),
            ]),
            create_repository,
        ),
        ToolDescriptor::new(
            "get_file_contents",
            "Get a file (decoded when text) or a directory listing from a repository.",
            repo_schema(
                vec![
                    FieldSpec::string("path", "Path inside the repository").non_empty(),
                    FieldSpec::string(
                        "branch",
                        "Branch, tag or commit; defaults to the default branch",
                    ),
                ],
                false,
            ),
            get_file_contents,
        ),
        ToolDescriptor::new(
            "list_issues",
            "List and filter issues of a repository.",
            repo_schema(
                vec![
                    FieldSpec::string("state", "Issue state").one_of(ISSUE_STATES).default("open"),
                    FieldSpec::string_array("labels", "Label names that must all match"),
                    FieldSpec::string("sort", "Sort field")
                        .one_of(&["created", "updated", "comments"])
                        .default("created"),
                    FieldSpec::string("direction", "Sort direction")
                        .one_of(DIRECTIONS)
                        .default("desc"),
                    FieldSpec::string("since", "Only issues updated after this ISO 8601 timestamp"),
                ],
                true,
            ),
            list_issues,
        ),
        ToolDescriptor::new(
            "create_issue",
            "Create an issue in a repository.",
            repo_schema(
                vec![
                    FieldSpec::string("title", "Issue title").non_empty(),
                    FieldSpec::string("body", "Issue description"),
                    FieldSpec::string_array("assignees", "Usernames to assign"),
                    FieldSpec::string_array("labels", "Label names"),
                    FieldSpec::integer("milestone", "Milestone number").min(1),
                ],
                false,
            ),
            create_issue,
        ),
        ToolDescriptor::new(
            "list_pull_requests",
            "List pull requests of a repository.",
            repo_schema(
                vec![
                    FieldSpec::string("state", "Pull request state")
                        .one_of(ISSUE_STATES)
                        .default("open"),
                    FieldSpec::string("base", "Filter by base branch"),
                    FieldSpec::string("head", "Filter by head, as user:ref-name"),
                ],
                true,
            ),
            list_pull_requests,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::Platform;
    use crate::domains::executor::RequestBody;
    use crate::domains::executor::mock::MockExecutor;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::definitions::common::testing::call;

    fn query_of(request: &ApiRequest, key: &str) -> Option<String> {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[tokio::test]
    async fn test_search_repositories_pagination() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"total_count": 0, "items": []}))));
        call(Platform::Github, &mock, "search_repositories", json!({"query": "lang:rust"}))
            .await
            .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(request.path_display(), "/search/repositories");
        assert_eq!(query_of(&request, "q").as_deref(), Some("lang:rust"));
        assert_eq!(query_of(&request, "per_page").as_deref(), Some("30"));
        assert_eq!(query_of(&request, "page").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_per_page_bounds_checked_before_io() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Github,
            &mock,
            "search_repositories",
            json!({"query": "x", "per_page": 500}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.field(), Some("per_page"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_visibility_enum() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Github,
            &mock,
            "list_user_repositories",
            json!({"visibility": "internal"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.field(), Some("visibility"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_file_contents_decodes_base64() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({
            "name": "README.md",
            "encoding": "base64",
            "content": "aGVsbG8g\nd29ybGQ=\n"
        }))));
        let value = call(
            Platform::Github,
            &mock,
            "get_file_contents",
            json!({"owner": "o", "repo": "r", "path": "docs/README.md", "branch": "main"}),
        )
        .await
        .unwrap();
        assert_eq!(value["content"], "hello world");
        assert_eq!(value["encoding"], "utf-8");

        let request = mock.last_call().unwrap();
        assert_eq!(request.path_display(), "/repos/o/r/contents/docs/README.md");
        assert_eq!(query_of(&request, "ref").as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_get_file_contents_rejects_traversal() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Github,
            &mock,
            "get_file_contents",
            json!({"owner": "o", "repo": "r", "path": "../../orgs/x"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.field(), Some("path"));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_binary_content_kept() {
        let value = decode_file_content(json!({"encoding": "base64", "content": "//79"}));
        assert_eq!(value["binary"], true);
        assert_eq!(value["content"], "//79");
    }

    #[tokio::test]
    async fn test_create_issue_body() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"number": 12}))));
        call(
            Platform::Github,
            &mock,
            "create_issue",
            json!({"owner": "o", "repo": "r", "title": "Bug", "labels": ["bug"]}),
        )
        .await
        .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({"title": "Bug", "body": "", "labels": ["bug"]})))
        );
    }

    #[tokio::test]
    async fn test_list_issues_joins_labels() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!([]))));
        call(
            Platform::Github,
            &mock,
            "list_issues",
            json!({"owner": "o", "repo": "r", "labels": ["bug", "p1"], "state": "all"}),
        )
        .await
        .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(query_of(&request, "labels").as_deref(), Some("bug,p1"));
        assert_eq!(query_of(&request, "state").as_deref(), Some("all"));
    }

    #[tokio::test]
    async fn test_non_string_labels_rejected_before_io() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Github,
            &mock,
            "list_issues",
            json!({"owner": "o", "repo": "r", "labels": ["bug", 7]}),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ToolError::validation("labels", "item 1: expected a string, got integer"));
        assert_eq!(mock.call_count(), 0);
    }
}
