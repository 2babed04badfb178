//! GitLab REST (v4) tools.
//!
//! `project_id` is a numeric id or a `group/project` path. It is sent as a
//! single path segment, so the slash is percent-encoded as GitLab expects.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::{Map, Value, json};

use super::common::page_fields;
use crate::domains::executor::ApiRequest;
use crate::domains::tools::{FieldSpec, ParamSchema, ToolCall, ToolDescriptor, ToolResult};

const VISIBILITIES: &[&str] = &["private", "internal", "public"];
const MR_STATES: &[&str] = &["opened", "closed", "locked", "merged", "all"];
const PIPELINE_STATUSES: &[&str] = &[
    "created",
    "waiting_for_resource",
    "preparing",
    "pending",
    "running",
    "success",
    "failed",
    "canceled",
    "skipped",
    "manual",
    "scheduled",
];

fn project_field() -> FieldSpec {
    FieldSpec::string("project_id", "Project id or full path such as group/project").non_empty()
}

fn with_pages(mut fields: Vec<FieldSpec>) -> ParamSchema {
    fields.extend(page_fields(20));
    ParamSchema::new(fields)
}

fn project_request(call: &ToolCall<'_>, method: Method, tail: &[&str]) -> ToolResult<ApiRequest> {
    let project = call.params.require_str("project_id")?;
    let segments = ["projects", project].into_iter().chain(tail.iter().copied());
    Ok(ApiRequest::new(method, segments))
}

fn paginate(call: &ToolCall<'_>, request: ApiRequest) -> ApiRequest {
    request
        .query_opt("per_page", call.params.i64("per_page"))
        .query_opt("page", call.params.i64("page"))
}

fn list_projects(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(["projects"])
            .query_opt("search", call.params.str("search"))
            .query_opt("visibility", call.params.str("visibility"))
            .query_opt("owned", call.params.bool("owned"))
            .query("order_by", "id")
            .query("sort", "desc");
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

fn get_project(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { call.send(project_request(&call, Method::GET, &[])?).await }.boxed()
}

fn create_project(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        body.insert("name".into(), json!(call.params.require_str("name")?));
        body.insert("visibility".into(), json!(call.params.str("visibility")));
        body.insert(
            "initialize_with_readme".into(),
            json!(call.params.bool("initialize_with_readme").unwrap_or(false)),
        );
        if let Some(description) = call.params.str("description") {
            body.insert("description".into(), json!(description));
        }
        if let Some(namespace_id) = call.params.i64("namespace_id") {
            body.insert("namespace_id".into(), json!(namespace_id));
        }

        call.send(ApiRequest::post(["projects"]).json(Value::Object(body)))
            .await
    }
    .boxed()
}

fn list_merge_requests(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = project_request(&call, Method::GET, &["merge_requests"])?
            .query_opt("state", call.params.str("state"))
            .query_opt("target_branch", call.params.str("target_branch"))
            .query_opt("source_branch", call.params.str("source_branch"));
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

fn list_pipelines(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = project_request(&call, Method::GET, &["pipelines"])?
            .query_opt("status", call.params.str("status"))
            .query_opt("ref", call.params.str("ref"));
        call.send(paginate(&call, request)).await
    }
    .boxed()
}

fn trigger_pipeline(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let variables: Vec<Value> = call
            .params
            .string_map("variables")
            .into_iter()
            .map(|(key, value)| json!({"key": key, "value": value}))
            .collect();
        let mut body = json!({ "ref": call.params.require_str("ref")? });
        if !variables.is_empty() {
            body["variables"] = Value::Array(variables);
        }

        let request = project_request(&call, Method::POST, &["pipeline"])?.json(body);
        call.send(request).await
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_projects",
            "List or search GitLab projects visible to the token.",
            with_pages(vec![
                FieldSpec::string("search", "Search term"),
                FieldSpec::string("visibility", "Project visibility").one_of(VISIBILITIES),
                FieldSpec::boolean("owned", "Only projects owned by the current user"),
            ]),
            list_projects,
        ),
        ToolDescriptor::new(
            "get_project",
            "Get details of a project.",
            ParamSchema::new(vec![project_field()]),
            get_project,
        ),
        ToolDescriptor::new(
            "create_project",
            "Create a new project.",
            ParamSchema::new(vec![
                FieldSpec::string("name", "Project name").non_empty(),
                FieldSpec::string("description", "Project description"),
                FieldSpec::string("visibility", "Project visibility")
                    .one_of(VISIBILITIES)
                    .default("private"),
                FieldSpec::boolean("initialize_with_readme", "Create an initial README")
                    .default(false),
                FieldSpec::integer("namespace_id", "Group to create the project in").min(1),
            ]),
            create_project,
        ),
        ToolDescriptor::new(
            "list_merge_requests",
            "List merge requests of a project.",
            with_pages(vec![
                project_field(),
                FieldSpec::string("state", "Merge request state")
                    .one_of(MR_STATES)
                    .default("opened"),
                FieldSpec::string("target_branch", "Filter by target branch"),
                FieldSpec::string("source_branch", "Filter by source branch"),
            ]),
            list_merge_requests,
        ),
        ToolDescriptor::new(
            "list_pipelines",
            "List CI pipelines of a project.",
            with_pages(vec![
                project_field(),
                FieldSpec::string("status", "Pipeline status").one_of(PIPELINE_STATUSES),
                FieldSpec::string("ref", "Branch or tag"),
            ]),
            list_pipelines,
        ),
        ToolDescriptor::new(
            "trigger_pipeline",
            "Create a pipeline for a branch or tag.",
            ParamSchema::new(vec![
                project_field(),
                FieldSpec::string("ref", "Branch or tag to run on").non_empty(),
                FieldSpec::string_map("variables", "Pipeline variables"),
            ]),
            trigger_pipeline,
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
    use crate::domains::tools::definitions::common::testing::call;

    #[tokio::test]
    async fn test_project_path_is_one_segment() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"id": 1}))));
        call(Platform::Gitlab, &mock, "get_project", json!({"project_id": "group/app"}))
            .await
            .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(request.segments, vec!["projects", "group/app"]);
    }

    #[tokio::test]
    async fn test_create_project_defaults_private() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"id": 2}))));
        call(Platform::Gitlab, &mock, "create_project", json!({"name": "svc"}))
            .await
            .unwrap();
        assert_eq!(
            mock.last_call().unwrap().body,
            Some(RequestBody::Json(json!({
                "name": "svc",
                "visibility": "private",
                "initialize_with_readme": false
            })))
        );
    }

    #[tokio::test]
    async fn test_merge_request_state_enum() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Gitlab,
            &mock,
            "list_merge_requests",
            json!({"project_id": "1", "state": "open"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.field(), Some("state"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trigger_pipeline_variables() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"id": 99}))));
        call(
            Platform::Gitlab,
            &mock,
            "trigger_pipeline",
            json!({"project_id": "7", "ref": "main", "variables": {"DEPLOY": "1"}}),
        )
        .await
        .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path_display(), "/projects/7/pipeline");
        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({
                "ref": "main",
                "variables": [{"key": "DEPLOY", "value": "1"}]
            })))
        );
    }
}
