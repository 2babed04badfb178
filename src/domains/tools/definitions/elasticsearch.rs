//! Elasticsearch tools.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::domains::executor::ApiRequest;
use crate::domains::tools::{
    FieldSpec, FieldType, ParamSchema, ToolCall, ToolDescriptor, ToolError, ToolResult,
};

const HEALTH_LEVELS: &[&str] = &["cluster", "indices", "shards"];
const REFRESH_POLICIES: &[&str] = &["true", "false", "wait_for"];

fn index_field() -> FieldSpec {
    FieldSpec::string("index_name", "Index name").non_empty()
}

fn refresh_field() -> FieldSpec {
    FieldSpec::string("refresh", "Refresh policy").one_of(REFRESH_POLICIES)
}

fn index_request(call: &ToolCall<'_>, method: Method, tail: &[&str]) -> ToolResult<ApiRequest> {
    let index = call.params.require_str("index_name")?;
    let segments = std::iter::once(index).chain(tail.iter().copied());
    Ok(ApiRequest::new(method, segments))
}

fn cluster_health(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut request = ApiRequest::get(["_cluster", "health"]);
        if let Some(index) = call.params.str("index") {
            request.segments.push(index.to_string());
        }
        let request = request
            .query_opt("level", call.params.str("level"))
            .query_opt("timeout", call.params.str("timeout"));
        call.send(request).await
    }
    .boxed()
}

fn list_indices(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut request = ApiRequest::get(["_cat", "indices"]);
        if let Some(pattern) = call.params.str("pattern") {
            request.segments.push(pattern.to_string());
        }
        call.send(request.query("format", "json")).await
    }
    .boxed()
}

fn create_index(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        for key in ["settings", "mappings", "aliases"] {
            if let Some(value) = call.params.get(key) {
                body.insert(key.to_string(), value.clone());
            }
        }
        let request = index_request(&call, Method::PUT, &[])?.json(Value::Object(body));
        call.send(request).await
    }
    .boxed()
}

/// `PUT /{index}/_doc/{id}` with an id, `POST /{index}/_doc` without.
fn index_document(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let document = call
            .params
            .get("document")
            .cloned()
            .ok_or_else(|| ToolError::validation("document", "is required"))?;

        let request = match call.params.str("id") {
            Some(id) => index_request(&call, Method::PUT, &["_doc", id])?,
            None => index_request(&call, Method::POST, &["_doc"])?,
        };
        let request = request
            .query_opt("refresh", call.params.str("refresh"))
            .json(document);
        call.send(request).await
    }
    .boxed()
}

fn get_document(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = call.params.require_str("id")?;
        let request = index_request(&call, Method::GET, &["_doc", id])?
            .query_opt("_source_includes", call.params.str("source_includes"))
            .query_opt("_source_excludes", call.params.str("source_excludes"));
        call.send(request).await
    }
    .boxed()
}

fn search(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        body.insert(
            "query".into(),
            call.params.get("query").cloned().unwrap_or(json!({"match_all": {}})),
        );
        let renamed = [
            ("from_offset", "from"),
            ("size", "size"),
            ("sort", "sort"),
            ("aggs", "aggs"),
        ];
        for (param, key) in renamed {
            if let Some(value) = call.params.get(param) {
                body.insert(key.to_string(), value.clone());
            }
        }

        let request = index_request(&call, Method::POST, &["_search"])?.json(Value::Object(body));
        call.send(request).await
    }
    .boxed()
}

/// Bulk body: alternating action and source objects, sent as NDJSON.
fn bulk(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let lines: Vec<Value> = call
            .params
            .get("operations")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut request = match call.params.str("index_name") {
            Some(index) => ApiRequest::post([index, "_bulk"]),
            None => ApiRequest::post(["_bulk"]),
        };
        request = request
            .query_opt("refresh", call.params.str("refresh"))
            .ndjson(lines);
        call.send(request).await
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "cluster_health",
            "Get cluster health, optionally for one index and at a finer level.",
            ParamSchema::new(vec![
                FieldSpec::string("index", "Restrict to this index or pattern"),
                FieldSpec::string("level", "Detail level").one_of(HEALTH_LEVELS),
                FieldSpec::string("timeout", "Wait timeout, e.g. 30s"),
            ]),
            cluster_health,
        ),
        ToolDescriptor::new(
            "list_indices",
            "List indices with health, document count and size.",
            ParamSchema::new(vec![FieldSpec::string("pattern", "Index pattern, e.g. logs-*")]),
            list_indices,
        ),
        ToolDescriptor::new(
            "create_index",
            "Create an index with optional settings, mappings and aliases.",
            ParamSchema::new(vec![
                index_field(),
                FieldSpec::object("settings", "Index settings"),
                FieldSpec::object("mappings", "Index mappings"),
                FieldSpec::object("aliases", "Index aliases"),
            ]),
            create_index,
        ),
        ToolDescriptor::new(
            "index_document",
            "Create or replace a document. Without an id one is generated.",
            ParamSchema::new(vec![
                index_field(),
                FieldSpec::object("document", "Document source").required(),
                FieldSpec::string("id", "Document id"),
                refresh_field(),
            ]),
            index_document,
        ),
        ToolDescriptor::new(
            "get_document",
            "Get a document by id.",
            ParamSchema::new(vec![
                index_field(),
                FieldSpec::string("id", "Document id").non_empty(),
                FieldSpec::string("source_includes", "Comma-separated source fields to include"),
                FieldSpec::string("source_excludes", "Comma-separated source fields to exclude"),
            ]),
            get_document,
        ),
        ToolDescriptor::new(
            "search",
            "Search an index with the query DSL. Defaults to match_all.",
            ParamSchema::new(vec![
                index_field(),
                FieldSpec::object("query", "Query DSL object"),
                FieldSpec::integer("from_offset", "Offset of the first hit").min(0),
                FieldSpec::integer("size", "Number of hits").range(0, 10_000),
                FieldSpec::array("sort", "Sort criteria"),
                FieldSpec::object("aggs", "Aggregations"),
            ]),
            search,
        ),
        ToolDescriptor::new(
            "bulk",
            "Run bulk operations. operations alternates action and source objects.",
            ParamSchema::new(vec![
                FieldSpec::array("operations", "Action and source objects, in order")
                    .items(FieldType::Object)
                    .non_empty(),
                FieldSpec::string("index_name", "Default index for the operations"),
                refresh_field(),
            ]),
            bulk,
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
    async fn test_cluster_health_level_enum() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(Platform::Elasticsearch, &mock, "cluster_health", json!({"level": "nodes"}))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("level"));
        assert_eq!(mock.call_count(), 0);

        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"status": "green"}))));
        let args = json!({"level": "indices"});
        let value = call(Platform::Elasticsearch, &mock, "cluster_health", args)
            .await
            .unwrap();
        assert_eq!(value["status"], "green");
        assert_eq!(mock.paths(), vec!["/_cluster/health"]);
    }

    #[tokio::test]
    async fn test_index_document_method_depends_on_id() {
        let mock = Arc::new(
            MockExecutor::new()
                .then(Ok(json!({"result": "created"})))
                .then(Ok(json!({}))),
        );
        call(
            Platform::Elasticsearch,
            &mock,
            "index_document",
            json!({"index_name": "logs", "document": {"msg": "a"}, "id": "1"}),
        )
        .await
        .unwrap();
        call(
            Platform::Elasticsearch,
            &mock,
            "index_document",
            json!({"index_name": "logs", "document": {"msg": "b"}}),
        )
        .await
        .unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].method, Method::PUT);
        assert_eq!(calls[0].path_display(), "/logs/_doc/1");
        assert_eq!(calls[1].method, Method::POST);
        assert_eq!(calls[1].path_display(), "/logs/_doc");
    }

    #[tokio::test]
    async fn test_bulk_sends_ndjson() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"errors": false, "items": []}))));
        call(
            Platform::Elasticsearch,
            &mock,
            "bulk",
            json!({
                "index_name": "logs",
                "operations": [{"index": {"_id": "1"}}, {"msg": "hello"}]
            }),
        )
        .await
        .unwrap();
        let request = mock.last_call().unwrap();
        assert_eq!(request.path_display(), "/logs/_bulk");
        assert_eq!(
            request.body,
            Some(RequestBody::NdJson(vec![json!({"index": {"_id": "1"}}), json!({"msg": "hello"})]))
        );
    }

    #[tokio::test]
    async fn test_bulk_rejects_non_object_lines() {
        let mock = Arc::new(MockExecutor::new());
        let err = call(
            Platform::Elasticsearch,
            &mock,
            "bulk",
            json!({"operations": [{"index": {}}, "oops"]}),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ToolError::validation("operations", "item 1: expected an object, got string")
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_defaults_to_match_all() {
        let mock = Arc::new(MockExecutor::new().then(Ok(json!({"hits": {"hits": []}}))));
        call(Platform::Elasticsearch, &mock, "search", json!({"index_name": "logs", "size": 5}))
            .await
            .unwrap();
        assert_eq!(
            mock.last_call().unwrap().body,
            Some(RequestBody::Json(json!({"query": {"match_all": {}}, "size": 5})))
        );
    }
}
