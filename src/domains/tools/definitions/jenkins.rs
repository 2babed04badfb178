//! Jenkins tools.
//!
//! Job names may address folders (`team/app`); each level becomes a
//! `job/<name>` pair in the URL.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};

use super::common::or_summary;
use crate::core::security::split_path;
use crate::domains::executor::ApiRequest;
use crate::domains::tools::{
    FieldSpec, ParamSchema, ToolCall, ToolDescriptor, ToolError, ToolResult,
};

fn job_name_field() -> FieldSpec {
    FieldSpec::string("job_name", "Job name, with folders separated by '/'").non_empty()
}

/// `team/app` -> `job/team/job/app`.
fn job_segments(job_name: &str) -> ToolResult<Vec<String>> {
    let parts = split_path(job_name).map_err(|e| ToolError::validation("job_name", e.to_string()))?;
    Ok(parts
        .into_iter()
        .flat_map(|part| ["job".to_string(), part])
        .collect())
}

fn job_request(call: &ToolCall<'_>, tail: &[&str]) -> ToolResult<ApiRequest> {
    let mut segments = job_segments(call.params.require_str("job_name")?)?;
    segments.extend(tail.iter().map(|s| s.to_string()));
    Ok(ApiRequest::get(segments))
}

/// Build number segment, or `lastBuild` when omitted.
fn build_ref(call: &ToolCall<'_>) -> String {
    call.params
        .i64("build_number")
        .map(|n| n.to_string())
        .unwrap_or_else(|| "lastBuild".to_string())
}

fn get_server_info(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { call.send(ApiRequest::get(["api", "json"])).await }.boxed()
}

fn list_jobs(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let request = ApiRequest::get(["api", "json"]).query("tree", "jobs[name,url,color]");
        call.send(request).await
    }
    .boxed()
}

fn get_job(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { call.send(job_request(&call, &["api", "json"])?).await }.boxed()
}

fn get_build(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let build = build_ref(&call);
        call.send(job_request(&call, &[build.as_str(), "api", "json"])?).await
    }
    .boxed()
}

fn list_builds(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let limit = call.params.i64("limit").unwrap_or(10);
        let request = job_request(&call, &["api", "json"])?.query(
            "tree",
            format!("builds[number,result,url,timestamp,duration]{{0,{limit}}}"),
        );
        call.send(request).await
    }
    .boxed()
}

fn trigger_build(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let job_name = call.params.require_str("job_name")?;
        let parameters = call.params.string_map("parameters");

        let endpoint = if parameters.is_empty() { "build" } else { "buildWithParameters" };
        let mut request = ApiRequest::post(job_segments(job_name)?);
        request.segments.push(endpoint.to_string());
        for (key, value) in &parameters {
            request = request.query(key, value);
        }

        let payload = call.send(request).await?;
        Ok(or_summary(
            payload,
            json!({"job": job_name, "queued": true, "parameters": parameters.len()}),
        ))
    }
    .boxed()
}

fn get_console_output(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let build = build_ref(&call);
        call.send(job_request(&call, &[build.as_str(), "consoleText"])?).await
    }
    .boxed()
}

fn get_queue(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move { call.send(ApiRequest::get(["queue", "api", "json"])).await }.boxed()
}

fn create_job(call: ToolCall<'_>) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let job_name = call.params.require_str("job_name")?;
        let config_xml = call.params.require_str("config_xml")?;
        let request = ApiRequest::post(["createItem"])
            .query("name", job_name)
            .text("text/xml", config_xml);

        let payload = call.send(request).await?;
        Ok(or_summary(payload, json!({"job": job_name, "created": true})))
    }
    .boxed()
}

pub fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_server_info",
            "Get Jenkins server information: mode, executors and top-level jobs.",
            ParamSchema::empty(),
            get_server_info,
        ),
        ToolDescriptor::new(
            "list_jobs",
            "List top-level Jenkins jobs with their status color.",
            ParamSchema::empty(),
            list_jobs,
        ),
        ToolDescriptor::new(
            "get_job",
            "Get details of a Jenkins job.",
            ParamSchema::new(vec![job_name_field()]),
            get_job,
        ),
        ToolDescriptor::new(
            "get_build",
            "Get one build of a job. Defaults to the last build.",
            ParamSchema::new(vec![
                job_name_field(),
                FieldSpec::integer("build_number", "Build number; omit for the last build").min(1),
            ]),
            get_build,
        ),
        ToolDescriptor::new(
            "list_builds",
            "List recent builds of a job with result, timestamp and duration.",
            ParamSchema::new(vec![
                job_name_field(),
                FieldSpec::integer("limit", "Maximum number of builds").range(1, 100).default(10),
            ]),
            list_builds,
        ),
        ToolDescriptor::new(
            "trigger_build",
            "Queue a build, optionally with build parameters.",
            ParamSchema::new(vec![
                job_name_field(),
                FieldSpec::string_map("parameters", "Build parameters as name/value strings"),
            ]),
            trigger_build,
        ),
        ToolDescriptor::new(
            "get_console_output",
            "Get the console log of a build as plain text.",
            ParamSchema::new(vec![
                job_name_field(),
                FieldSpec::integer("build_number", "Build number; omit for the last build").min(1),
            ]),
            get_console_output,
        ),
        ToolDescriptor::new(
            "get_queue",
            "List items waiting in the build queue.",
            ParamSchema::empty(),
            get_queue,
        ),
        ToolDescriptor::new(
            "create_job",
            "Create a job from its config.xml.",
            ParamSchema::new(vec![
                FieldSpec::string("job_name", "Name of the new job").non_empty(),
                FieldSpec::string("config_xml", "Job configuration XML").non_empty(),
            ]),
            create_job,
        ),
    ]
}
