//! Datadog API (v1) tools.

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use crate::domains::executor::ApiRequest;
use crate::domains::tools::{
    FieldSpec, ParamSchema, ToolCall, ToolDescriptor, ToolError, ToolResult,
};

const MONITOR_TYPES: &[&str] = &[
    "metric alert",
    "service check",
    "event alert",
    "query alert",
    "composite",
    "log alert",
];
const ALERT_TYPES: &[&str] = &["info", "warning", "error", "success"];
const EVENT_PRIORITIES: &[&str] = &["normal", "low"];

/// Window used by `query_metrics` when `from_time` is omitted.
const DEFAULT_QUERY_WINDOW_SECS: i64 = 3600;

fn api<'s>(segments: impl IntoIterator<Item = &'s str>) -> Vec<&'s str> {
    ["api", "v1"].into_iter().chain(segments).collect()
}

fn monitor_id_field() -> FieldSpec {
    FieldSpec::integer("monitor_id", "Monitor id").required().min(1)
}

fn monitor_id(call: &ToolCall<'_>) -> ToolResult<String> {
    call.params
        .i64("monitor_id")
        .map(|id| id.to_string())
        .ok_or_else(|| ToolError::validation("monitor_id", "is required"))
}

/// Copy the listed optional parameters into a request body.
fn copy_present(call: &ToolCall<'_>, body: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = call.params.get(key) {
            body.insert(key.to_string(), value.clone());
        }
    }
}

fn list_monitors(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(api(["monitor"]))
            .query_opt("name", call.params.str("name"))
            .query_opt("tags", call.params.str("tags"))
            .query_opt("monitor_tags", call.params.str("monitor_tags"))
            .query_opt("page", call.params.i64("page"))
            .query_opt("page_size", call.params.i64("page_size"));
        call.send(request).await
    }
    .boxed()
}

fn get_monitor(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = monitor_id(&call)?;
        call.send(ApiRequest::get(api(["monitor", id.as_str()]))).await
    }
    .boxed()
}

fn create_monitor(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        copy_present(&call, &mut body, &["name", "type", "query", "message", "tags", "priority"]);
        call.send(ApiRequest::post(api(["monitor"])).json(Value::Object(body)))
            .await
    }
    .boxed()
}

fn mute_monitor(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = monitor_id(&call)?;
        let mut body = Map::new();
        copy_present(&call, &mut body, &["scope", "end"]);
        let request =
            ApiRequest::post(api(["monitor", id.as_str(), "mute"])).json(Value::Object(body));
        call.send(request).await
    }
    .boxed()
}

fn create_event(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let mut body = Map::new();
        copy_present(&call, &mut body, &["title", "text", "tags", "alert_type", "priority"]);
        call.send(ApiRequest::post(api(["events"])).json(Value::Object(body)))
            .await
    }
    .boxed()
}

fn query_metrics(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let query = call.params.require_str("query")?;
        let to = call.params.i64("to_time").unwrap_or_else(|| Utc::now().timestamp());
        let from = call
            .params
            .i64("from_time")
            .unwrap_or(to - DEFAULT_QUERY_WINDOW_SECS);
        if from >= to {
            return Err(ToolError::validation(
                "from_time",
                format!("must be earlier than to_time ({to})"),
            ));
        }

        let request = ApiRequest::get(api(["query"]))
            .query("from", from)
            .query("to", to)
            .query("query", query);
        call.send(request).await
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_monitors",
            "List monitors, optionally filtered by name and tags.",
            ParamSchema::new(vec![
                FieldSpec::string("name", "Substring of the monitor name"),
                FieldSpec::string("tags", "Comma-separated scope tags, e.g. env:prod"),
                FieldSpec::string("monitor_tags", "Comma-separated monitor tags"),
                FieldSpec::integer("page", "Page number, starting at 0").min(0),
                FieldSpec::integer("page_size", "Monitors per page").range(1, 1000),
            ]),
            list_monitors,
        ),
        ToolDescriptor::new(
            "get_monitor",
            "Get one monitor by id.",
            ParamSchema::new(vec![monitor_id_field()]),
            get_monitor,
        ),
        ToolDescriptor::new(
            "create_monitor",
            "Create a monitor.",
            ParamSchema::new(vec![
                FieldSpec::string("name", "Monitor name").non_empty(),
                FieldSpec::string("type", "Monitor type").required().one_of(MONITOR_TYPES),
                FieldSpec::string("query", "Monitor query").non_empty(),
                FieldSpec::string("message", "Notification message").default(""),
                FieldSpec::string_array("tags", "Monitor tags"),
                FieldSpec::integer("priority", "Priority from 1 (high) to 5 (low)").range(1, 5),
            ]),
            create_monitor,
        ),
        ToolDescriptor::new(
            "mute_monitor",
            "Mute a monitor, optionally for one scope and until a time.",
            ParamSchema::new(vec![
                monitor_id_field(),
                FieldSpec::string("scope", "Scope to mute, e.g. host:web-1"),
                FieldSpec::integer("end", "POSIX timestamp when the mute ends").min(0),
            ]),
            mute_monitor,
        ),
        ToolDescriptor::new(
            "create_event",
            "Post an event to the event stream.",
            ParamSchema::new(vec![
                FieldSpec::string("title", "Event title").non_empty(),
                FieldSpec::string("text", "Event body").non_empty(),
                FieldSpec::string_array("tags", "Event tags"),
                FieldSpec::string("alert_type", "Alert type").one_of(ALERT_TYPES).default("info"),
                FieldSpec::string("priority", "Event priority")
                    .one_of(EVENT_PRIORITIES)
                    .default("normal"),
            ]),
            create_event,
        ),
        ToolDescriptor::new(
            "query_metrics",
            "Query timeseries points. Defaults to the last hour.",
            ParamSchema::new(vec![
                FieldSpec::string("query", "Metric query, e.g. avg:system.cpu.user{*}").non_empty(),
                FieldSpec::integer("from_time", "Start, POSIX seconds").min(0),
                FieldSpec::integer("to_time", "End, POSIX seconds").min(0),
            ]),
            query_metrics,
        ),
    ]
}
