//! Docker Engine API tools.
//!
//! Every path is prefixed with the configured API version (`/v1.43/...`).

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::{Map, Value, json};
use tracing::info;

use super::common::or_summary;
use crate::domains::executor::{ApiRequest, ResponseFraming};
use crate::domains::tools::{
    FieldSpec, ParamSchema, Params, ToolCall, ToolDescriptor, ToolError, ToolResult,
};

const DEFAULT_API_VERSION: &str = "v1.43";

fn container_field() -> FieldSpec {
    FieldSpec::string("container_id", "Container id or name").non_empty()
}

fn engine_request<'s, I>(call: &ToolCall<'_>, method: Method, segments: I) -> ApiRequest
where
    I: IntoIterator<Item = &'s str>,
{
    ApiRequest::new(method, segments).with_prefix(call.context.api_version_or(DEFAULT_API_VERSION))
}

fn container_request(call: &ToolCall<'_>, method: Method, tail: &[&str]) -> ToolResult<ApiRequest> {
    let id = call.params.require_str("container_id")?;
    let segments = ["containers", id].into_iter().chain(tail.iter().copied());
    Ok(engine_request(call, method, segments))
}

/// Engine `ContainerConfig` body from the create parameters.
fn container_config(params: &Params) -> ToolResult<Value> {
    let mut config = Map::new();
    config.insert("Image".into(), json!(params.require_str("image")?));

    if let Some(command) = params.str("command") {
        let argv = shell_words::split(command)
            .map_err(|e| ToolError::validation("command", e.to_string()))?;
        if !argv.is_empty() {
            config.insert("Cmd".into(), json!(argv));
        }
    }

    let env: Vec<String> = params
        .string_map("environment")
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    if !env.is_empty() {
        config.insert("Env".into(), json!(env));
    }

    let mut host_config = Map::new();
    let ports = params.string_map("ports");
    if !ports.is_empty() {
        let mut exposed = Map::new();
        let mut bindings = Map::new();
        for (container_port, host_port) in ports {
            let key = if container_port.contains('/') {
                container_port
            } else {
                format!("{container_port}/tcp")
            };
            exposed.insert(key.clone(), json!({}));
            bindings.insert(key, json!([{ "HostPort": host_port }]));
        }
        config.insert("ExposedPorts".into(), Value::Object(exposed));
        host_config.insert("PortBindings".into(), Value::Object(bindings));
    }

    let binds: Vec<String> = params
        .string_map("volumes")
        .into_iter()
        .map(|(host, container)| format!("{host}:{container}:rw"))
        .collect();
    if !binds.is_empty() {
        host_config.insert("Binds".into(), json!(binds));
    }

    if !host_config.is_empty() {
        config.insert("HostConfig".into(), Value::Object(host_config));
    }
    Ok(Value::Object(config))
}

async fn create(call: &ToolCall<'_>) -> ToolResult<Value> {
    let request = engine_request(call, Method::POST, ["containers", "create"])
        .query_opt("name", call.params.str("name"))
        .json(container_config(call.params)?);
    call.send(request).await
}

fn list_containers(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = engine_request(&call, Method::GET, ["containers", "json"])
            .query_opt("all", call.params.bool("all"));
        call.send(request).await
    }
    .boxed()
}

fn inspect_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { call.send(container_request(&call, Method::GET, &["json"])?).await }.boxed()
}

fn create_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { create(&call).await }.boxed()
}

/// Create, then start. A failed start leaves the created container in place.
fn run_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let created = create(&call).await.map_err(|e| e.in_step("create container"))?;
        let id = created
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::internal("create container: response has no Id"))?
            .to_string();
        info!(container = %id, "Container created, starting");

        let start = engine_request(&call, Method::POST, ["containers", id.as_str(), "start"]);
        call.send(start)
            .await
            .map_err(|e| e.in_step(&format!("start container {id}")))?;

        Ok(json!({
            "id": id,
            "warnings": created.get("Warnings").cloned().unwrap_or(Value::Null),
            "started": true,
        }))
    }
    .boxed()
}

fn start_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = call.params.require_str("container_id")?;
        let payload = call.send(container_request(&call, Method::POST, &["start"])?).await?;
        Ok(or_summary(payload, json!({"id": id, "started": true})))
    }
    .boxed()
}

fn stop_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = call.params.require_str("container_id")?;
        let request = container_request(&call, Method::POST, &["stop"])?
            .query_opt("t", call.params.i64("timeout"));
        let payload = call.send(request).await?;
        Ok(or_summary(payload, json!({"id": id, "stopped": true})))
    }
    .boxed()
}

fn remove_container(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let id = call.params.require_str("container_id")?;
        let request = container_request(&call, Method::DELETE, &[])?
            .query_opt("force", call.params.bool("force"));
        let payload = call.send(request).await?;
        Ok(or_summary(payload, json!({"id": id, "removed": true})))
    }
    .boxed()
}

fn list_images(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = engine_request(&call, Method::GET, ["images", "json"])
            .query_opt("all", call.params.bool("all"));
        call.send(request).await
    }
    .boxed()
}

/// The engine streams pull progress as one JSON document per line; keep
/// only the final status line.
fn pull_image(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let image = call.params.require_str("image")?;
        let tag = call.params.str("tag").unwrap_or("latest");
        let request = engine_request(&call, Method::POST, ["images", "create"])
            .query("fromImage", image)
            .query("tag", tag);

        let payload = call.send(request).await?;
        let status = match payload {
            Value::String(stream) => stream
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).unwrap_or_else(|_| json!(line)))
                .unwrap_or(Value::Null),
            other => other,
        };
        Ok(json!({"image": format!("{image}:{tag}"), "status": status}))
    }
    .boxed()
}

/// Non-TTY containers answer with a multiplexed stream; frame headers are
/// stripped by the executor.
fn get_container_logs(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = container_request(&call, Method::GET, &["logs"])?
            .query("stdout", "true")
            .query("stderr", "true")
            .query_opt("tail", call.params.i64("tail"))
            .framing(ResponseFraming::DockerStream);
        call.send(request).await
    }
    .boxed()
}

fn create_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("image", "Image reference, e.g. nginx:1.27").non_empty(),
        FieldSpec::string("name", "Container name"),
        FieldSpec::string("command", "Command to run, split with shell quoting rules"),
        FieldSpec::string_map("ports", "Container port to host port, e.g. {\"80/tcp\": \"8080\"}"),
        FieldSpec::string_map("environment", "Environment variables"),
        FieldSpec::string_map("volumes", "Host path to container path bind mounts"),
    ]
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_containers",
            "List containers. Only running ones unless all is true.",
            ParamSchema::new(vec![
                FieldSpec::boolean("all", "Include stopped containers").default(false),
            ]),
            list_containers,
        ),
        ToolDescriptor::new(
            "inspect_container",
            "Get low-level information about a container.",
            ParamSchema::new(vec![container_field()]),
            inspect_container,
        ),
        ToolDescriptor::new(
            "create_container",
            "Create a container without starting it.",
            ParamSchema::new(create_fields()),
            create_container,
        ),
        ToolDescriptor::new(
            "run_container",
            "Create a container and start it. If the start fails the created container is kept.",
            ParamSchema::new(create_fields()),
            run_container,
        ),
        ToolDescriptor::new(
            "start_container",
            "Start a stopped container.",
            ParamSchema::new(vec![container_field()]),
            start_container,
        ),
        ToolDescriptor::new(
            "stop_container",
            "Stop a running container.",
            ParamSchema::new(vec![
                container_field(),
                FieldSpec::integer("timeout", "Seconds to wait before killing").min(0).default(10),
            ]),
            stop_container,
        ),
        ToolDescriptor::new(
            "remove_container",
            "Remove a container.",
            ParamSchema::new(vec![
                container_field(),
                FieldSpec::boolean("force", "Kill the container first if it is running")
                    .default(false),
            ]),
            remove_container,
        ),
        ToolDescriptor::new(
            "list_images",
            "List local images.",
            ParamSchema::new(vec![
                FieldSpec::boolean("all", "Include intermediate images").default(false),
            ]),
            list_images,
        ),
        ToolDescriptor::new(
            "pull_image",
            "Pull an image from its registry.",
            ParamSchema::new(vec![
                FieldSpec::string("image", "Image name").non_empty(),
                FieldSpec::string("tag", "Image tag").default("latest"),
            ]),
            pull_image,
        ),
        ToolDescriptor::new(
            "get_container_logs",
            "Get the last lines of a container's stdout and stderr.",
            ParamSchema::new(vec![
                container_field(),
                FieldSpec::integer("tail", "Number of lines from the end").min(1).default(100),
            ]),
            get_container_logs,
        ),
    ]
}
