//! Nexus Repository Manager tools.
//!
//! Endpoints moved between `v1`, `beta` and `v1/beta` across Nexus releases,
//! so every call goes through the Nexus version chain.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};

use super::common::or_summary;
use crate::domains::executor::{ApiRequest, VersionChain};
use crate::domains::tools::{FieldSpec, ParamSchema, ToolCall, ToolDescriptor, ToolResult};

async fn send(call: &ToolCall<'_>, request: ApiRequest) -> ToolResult<Value> {
    call.send_versioned(request, &VersionChain::nexus()).await
}

fn get_status(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let payload = send(&call, ApiRequest::get(["status"])).await?;
        Ok(or_summary(payload, json!({"available": true})))
    }
    .boxed()
}

fn list_repositories(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { send(&call, ApiRequest::get(["repositories"])).await }.boxed()
}

fn get_repository(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let name = call.params.require_str("repository")?;
        send(&call, ApiRequest::get(["repositories", name])).await
    }
    .boxed()
}

fn search_components(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(["search"])
            .query_opt("repository", call.params.str("repository"))
            .query_opt("q", call.params.str("keyword"))
            .query_opt("format", call.params.str("format"))
            .query_opt("group", call.params.str("group"))
            .query_opt("name", call.params.str("name"))
            .query_opt("version", call.params.str("version"))
            .query_opt("continuationToken", call.params.str("continuation_token"));
        send(&call, request).await
    }
    .boxed()
}

fn list_users(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(["security", "users"])
            .query_opt("userId", call.params.str("user_id"))
            .query_opt("source", call.params.str("source"));
        send(&call, request).await
    }
    .boxed()
}

fn list_blob_stores(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { send(&call, ApiRequest::get(["blobstores"])).await }.boxed()
}

fn delete_component(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = call.params.require_str("component_id")?;
        let payload = send(&call, ApiRequest::delete(["components", id])).await?;
        Ok(or_summary(payload, json!({"component_id": id, "deleted": true})))
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_status",
            "Check that the Nexus instance is up and can serve requests.",
            ParamSchema::empty(),
            get_status,
        ),
        ToolDescriptor::new(
            "list_repositories",
            "List all repositories with their format, type and URL.",
            ParamSchema::empty(),
            list_repositories,
        ),
        ToolDescriptor::new(
            "get_repository",
            "Get one repository by name.",
            ParamSchema::new(vec![
                FieldSpec::string("repository", "Repository name").non_empty(),
            ]),
            get_repository,
        ),
        ToolDescriptor::new(
            "search_components",
            "Search components. Use continuation_token from a previous page to continue.",
            ParamSchema::new(vec![
                FieldSpec::string("repository", "Restrict to one repository"),
                FieldSpec::string("keyword", "Free-text keyword"),
                FieldSpec::string("format", "Component format, e.g. maven2, npm, docker"),
                FieldSpec::string("group", "Component group"),
                FieldSpec::string("name", "Component name"),
                FieldSpec::string("version", "Component version"),
                FieldSpec::string("continuation_token", "Token from the previous page"),
            ]),
            search_components,
        ),
        ToolDescriptor::new(
            "list_users",
            "List users, optionally filtered by id prefix and realm source.",
            ParamSchema::new(vec![
                FieldSpec::string("user_id", "User id prefix"),
                FieldSpec::string("source", "User source, e.g. default or LDAP"),
            ]),
            list_users,
        ),
        ToolDescriptor::new(
            "list_blob_stores",
            "List blob stores with usage counters.",
            ParamSchema::empty(),
            list_blob_stores,
        ),
        ToolDescriptor::new(
            "delete_component",
            "Delete a component by id.",
            ParamSchema::new(vec![
                FieldSpec::string("component_id", "Component id").non_empty(),
            ]),
            delete_component,
        ),
    ]
}
