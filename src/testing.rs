// src/testing.rs

//! Test doubles: in-memory hubs and provisioners, plus a fake hub REST server.

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    extract::{Path as AxumPath, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::cli::{Cli, Command, CreateArgs};
use crate::error::ProvisionError;
use crate::hub::{ApiLimit, DevHub, HubConnector};
use crate::provision::{
    CreateRequest, EventSink, JobId, ProvisionEvent, ProvisionResponse, Provisioner,
    ScratchOrgResult,
};

/* ---------------- cli ---------------- */

/// Parse `scratchorg create -v hub <extra...>`.
pub fn create_args(extra: &[&str]) -> CreateArgs {
    let mut argv = vec!["scratchorg", "create", "-v", "hubA"];
    argv.extend_from_slice(extra);
    match Cli::parse_from(argv).command {
        Command::Create(a) => a,
        other => panic!("unexpected {other:?}"),
    }
}

pub fn sample_result() -> ScratchOrgResult {
    ScratchOrgResult {
        username: "test-user@scratch.example".into(),
        org_id: "00D000000000042".into(),
        scratch_org_info: json!({ "Status": "Active" }),
        auth_fields: json!({
            "username": "test-user@scratch.example",
            "orgId": "00D000000000042",
            "loginUrl": "https://scratch.example",
            "expirationDate": "2030-01-08",
        }),
        warnings: vec![],
    }
}

/* ---------------- in-memory hubs ---------------- */

#[derive(Debug, Clone)]
pub struct FakeHub {
    id: String,
    instance_url: Option<String>,
    limits: Vec<ApiLimit>,
    fail_limits: bool,
}

impl FakeHub {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            instance_url: Some(format!("https://{}.example", id)),
            limits: Vec::new(),
            fail_limits: false,
        }
    }

    pub fn with_capacity(id: &str, active: i64, daily: i64) -> Self {
        Self::new(id)
            .with_limit("ActiveScratchOrgs", 10, active)
            .with_limit("DailyScratchOrgs", 20, daily)
    }

    pub fn with_limit(mut self, name: &str, max: i64, remaining: i64) -> Self {
        self.limits.push(ApiLimit::new(name, max, remaining));
        self
    }

    pub fn failing_limits(mut self) -> Self {
        self.fail_limits = true;
        self
    }

    pub fn without_instance_url(mut self) -> Self {
        self.instance_url = None;
        self
    }
}

#[async_trait]
impl DevHub for FakeHub {
    fn id(&self) -> &str {
        &self.id
    }

    fn instance_url(&self) -> Option<&str> {
        self.instance_url.as_deref()
    }

    async fn fetch_limits(&self) -> Result<Vec<ApiLimit>> {
        if self.fail_limits {
            bail!("limits request to {} failed", self.id);
        }
        Ok(self.limits.clone())
    }
}

#[derive(Default)]
pub struct FakeConnector {
    hubs: HashMap<String, FakeHub>,
    connected: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hub(mut self, hub: FakeHub) -> Self {
        self.hubs.insert(hub.id.clone(), hub);
        self
    }

    /// Ids `connect` was called with, in order.
    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl HubConnector for FakeConnector {
    type Hub = FakeHub;

    async fn connect(&self, id: &str) -> Result<FakeHub> {
        self.connected.lock().unwrap().push(id.to_string());
        match self.hubs.get(id) {
            Some(h) => Ok(h.clone()),
            None => bail!("cannot authenticate to dev hub {}", id),
        }
    }
}

/* ---------------- scripted provisioner ---------------- */

pub enum Scripted {
    /// Emit these statuses, then return `sample_result()`.
    Complete(Vec<&'static str>),
    /// Return a job id and no result.
    Queue,
    Fail(ProvisionError),
}

pub struct FakeProvisioner {
    script: Scripted,
    calls: AtomicUsize,
    saw_sink: AtomicBool,
    last_wait: Mutex<Option<Duration>>,
}

impl FakeProvisioner {
    pub fn new(script: Scripted) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            saw_sink: AtomicBool::new(false),
            last_wait: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saw_sink(&self) -> bool {
        self.saw_sink.load(Ordering::SeqCst)
    }

    pub fn last_wait(&self) -> Option<Duration> {
        *self.last_wait.lock().unwrap()
    }

    fn run(
        &self,
        job_id: JobId,
        wait: Duration,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_wait.lock().unwrap() = Some(wait);

        if let Some(sink) = sink {
            self.saw_sink.store(true, Ordering::SeqCst);
            if let Scripted::Complete(statuses) = &self.script {
                for s in statuses {
                    sink.emit(ProvisionEvent::status(job_id.clone(), *s));
                }
            }
        }

        match &self.script {
            Scripted::Complete(_) => Ok(ProvisionResponse {
                job_id,
                result: Some(sample_result()),
            }),
            Scripted::Queue => Ok(ProvisionResponse {
                job_id,
                result: None,
            }),
            Scripted::Fail(e) => Err(e.clone()),
        }
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    type Hub = FakeHub;

    async fn create(
        &self,
        _hub: &FakeHub,
        request: &CreateRequest,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError> {
        self.run(JobId::from("2SR000000000001"), request.wait, sink)
    }

    async fn resume(
        &self,
        _hub: &FakeHub,
        job_id: &JobId,
        wait: Duration,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError> {
        self.run(job_id.clone(), wait, sink)
    }
}

/* ---------------- fake hub REST server ---------------- */

const TOKEN: &str = "Bearer test-token";

#[derive(Debug, Default)]
pub struct HubState {
    active_remaining: i64,
    daily_remaining: i64,
    statuses: Vec<&'static str>,
    polls: usize,
    submitted: Vec<JsonValue>,
}

impl HubState {
    pub fn with_limits(active: i64, daily: i64) -> Self {
        Self {
            active_remaining: active,
            daily_remaining: daily,
            ..Default::default()
        }
    }

    /// Status returned by each successive poll; the last one repeats.
    pub fn with_statuses(statuses: &[&'static str]) -> Self {
        Self {
            active_remaining: 1,
            daily_remaining: 1,
            statuses: statuses.to_vec(),
            ..Default::default()
        }
    }
}

type Shared = Arc<Mutex<HubState>>;

pub struct FakeServer {
    addr: std::net::SocketAddr,
    state: Shared,
}

impl FakeServer {
    pub async fn start(state: HubState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/services/data/:version/limits", get(limits))
            .route(
                "/services/data/:version/sobjects/ScratchOrgInfo",
                post(submit),
            )
            .route(
                "/services/data/:version/sobjects/ScratchOrgInfo/:id",
                get(poll),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }

    pub fn submitted(&self) -> Vec<JsonValue> {
        self.state.lock().unwrap().submitted.clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(TOKEN)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!([{ "errorCode": "INVALID_SESSION_ID" }])),
    )
        .into_response()
}

async fn limits(AxumState(state): AxumState<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let s = state.lock().unwrap();
    Json(json!({
        "ActiveScratchOrgs": { "Max": 3, "Remaining": s.active_remaining },
        "DailyScratchOrgs": { "Max": 6, "Remaining": s.daily_remaining },
        "DailyApiRequests": { "Max": 15000, "Remaining": 14000 }
    }))
    .into_response()
}

async fn submit(
    AxumState(state): AxumState<Shared>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.lock().unwrap().submitted.push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "id": "2SR000000000001", "success": true, "errors": [] })),
    )
        .into_response()
}

async fn poll(
    AxumState(state): AxumState<Shared>,
    AxumPath((_version, id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    let idx = s.polls.min(s.statuses.len().saturating_sub(1));
    let status = s.statuses.get(idx).copied().unwrap_or("New");
    s.polls += 1;
    let error_code = (status == "Error").then_some("C-9999");

    Json(json!({
        "Id": id,
        "Status": status,
        "ErrorCode": error_code,
        "SignupUsername": "test-user@scratch.example",
        "ScratchOrg": "00D000000000042",
        "LoginUrl": "https://scratch.example",
        "ExpirationDate": "2030-01-08"
    }))
    .into_response()
}
