// src/runner.rs

use anyhow::{anyhow, Context};
use dialoguer::Password;
use serde::Serialize;
use serde_json::json;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Cli, Command, CreateArgs};
use crate::config::Config;
use crate::error::CreateError;
use crate::hub::rest::RestHubConnector;
use crate::hub::{has_capacity, select_hub, ApiLimit, DevHub, HubConnector};
use crate::messages::Messages;
use crate::provision::rest::RestProvisioner;
use crate::provision::{
    build_request, invoke, load_definition, resume, EventSink, Invocation, JobId, Provisioner,
    ScratchOrgResult, Secret,
};
use crate::sinks::spinner::SpinnerSink;
use crate::state::{OrgSettings, State};
use crate::util::bin_name;

/// Env var consulted before prompting for a connected-app secret.
pub const CLIENT_SECRET_ENV: &str = "SCRATCHORG_CLIENT_SECRET";

/// Everything a command needs besides its own flags.
pub struct RunContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub messages: Messages,
    pub json: bool,
    /// Draw the spinner. Off when stderr is not a terminal.
    pub interactive: bool,
}

impl RunContext {
    pub fn new(config: Config, config_path: PathBuf, messages: Messages, json: bool) -> Self {
        let state_path = config_path.with_file_name("state.yaml");
        Self {
            config,
            config_path,
            state_path,
            messages,
            json,
            interactive: std::io::stderr().is_terminal(),
        }
    }

    fn config_display(&self) -> String {
        self.config_path.display().to_string()
    }
}

/// Command lifecycle, logged as the run moves through it.
#[derive(Debug, Clone, Copy)]
enum Phase {
    ResolvingHub,
    Invoking,
    Succeeded,
    Queued,
    TimedOut,
    Failed,
}

fn enter(phase: Phase) {
    tracing::info!(?phase, "create");
}

/// Entry point from `main.rs`.
pub async fn run(cli: Cli, ctx: &RunContext) -> Result<(), CreateError> {
    match cli.command {
        Command::Create(args) => {
            let secret = match &args.client_id {
                Some(id) => Some(read_client_secret(&ctx.messages, id)?),
                None => None,
            };

            let connector =
                RestHubConnector::new(&ctx.config, ctx.config_display(), args.api_version.clone());
            let provisioner = RestProvisioner::new(ctx.config.provision.poll_interval());

            let outcome = create_with(ctx, &connector, &provisioner, &args, secret).await;
            report(ctx, outcome)
        }

        Command::Resume { job_id, wait } => {
            let connector = RestHubConnector::new(&ctx.config, ctx.config_display(), None);
            let provisioner = RestProvisioner::new(ctx.config.provision.poll_interval());

            let outcome = resume_with(
                ctx,
                &connector,
                &provisioner,
                &JobId::from(job_id),
                Duration::from_secs(wait * 60),
            )
            .await;
            report(ctx, outcome)
        }

        Command::Limits {
            target_dev_hub,
            api_version,
        } => {
            let connector = RestHubConnector::new(&ctx.config, ctx.config_display(), api_version);
            let reports = limits_with(&connector, &target_dev_hub).await?;
            print_limits(ctx, &reports)?;
            Ok(())
        }
    }
}

/* ---------------- create ---------------- */

/// Select a hub, submit the request and record the outcome in the state file.
///
/// - The definition file and state file are read before any hub is contacted.
/// - Only synchronous requests get a spinner.
/// - Queued and timed-out jobs are saved as pending so `resume` can find their hub.
/// - Once the hub has answered, the returned outcome is the provisioning outcome;
///   state write failures are only logged.
pub async fn create_with<C, P>(
    ctx: &RunContext,
    connector: &C,
    provisioner: &P,
    args: &CreateArgs,
    secret: Option<Secret>,
) -> Result<Invocation, CreateError>
where
    C: HubConnector,
    P: Provisioner<Hub = C::Hub>,
{
    let definition = match &args.definition_file {
        Some(path) => Some(load_definition(path)?),
        None => None,
    };
    let request = build_request(args, definition, secret);
    let settings = OrgSettings::from_request(&request);
    let mut state = State::load(&ctx.state_path)?;

    enter(Phase::ResolvingHub);
    if !ctx.json {
        eprintln!("{}", ctx.messages.get("create.resolving_hub", &[]));
    }
    let hub = select_hub(connector, &args.target_dev_hub, args.hub_probe_policy).await?;
    if !ctx.json {
        eprintln!("{}", ctx.messages.get("create.hub_selected", &[hub.id()]));
    }

    enter(Phase::Invoking);
    let mut spinner = if request.is_async() {
        None
    } else {
        Some(SpinnerSink::start(
            &ctx.messages,
            ctx.messages.get("create.spinner_start", &[]),
            !ctx.interactive,
        )?)
    };
    let sink = spinner.as_mut().map(|s| s as &mut dyn EventSink);

    let outcome = invoke(provisioner, &hub, &request, sink).await;
    let last_status = match &spinner {
        Some(s) => {
            s.clear();
            s.last_status().to_string()
        }
        None => String::new(),
    };

    match &outcome {
        Ok(Invocation::Completed { job_id, result }) => {
            enter(Phase::Succeeded);
            tracing::info!(job_id = %job_id, username = %result.username, "scratch org active");
            state.record_org(hub.id(), result, settings);
            persist(&state, &ctx.state_path);
        }
        Ok(Invocation::Queued { job_id }) => {
            enter(Phase::Queued);
            state.add_pending(job_id, hub.id(), settings);
            persist(&state, &ctx.state_path);
        }
        Err(CreateError::Timeout { job_id }) => {
            enter(Phase::TimedOut);
            tracing::info!(job_id = ?job_id, last_status = %last_status, "wait elapsed");
            if let Some(job_id) = job_id {
                state.add_pending(job_id, hub.id(), settings);
                persist(&state, &ctx.state_path);
            }
        }
        Err(err) => {
            enter(Phase::Failed);
            tracing::warn!(error = %err, "scratch org request failed");
        }
    }

    outcome
}

/// Write the state file, logging instead of failing.
fn persist(state: &State, path: &Path) {
    if let Err(e) = state.save(path) {
        tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "failed to update state file");
    }
}

/* ---------------- resume ---------------- */

/// Continue polling a pending job on the hub it was submitted to.
pub async fn resume_with<C, P>(
    ctx: &RunContext,
    connector: &C,
    provisioner: &P,
    job_id: &JobId,
    wait: Duration,
) -> Result<Invocation, CreateError>
where
    C: HubConnector,
    P: Provisioner<Hub = C::Hub>,
{
    let mut state = State::load(&ctx.state_path)?;
    let pending = state.pending.get(job_id.as_str()).cloned().ok_or_else(|| {
        anyhow!(
            "No pending scratch org request with job id {} in {}",
            job_id,
            ctx.state_path.display()
        )
    })?;

    let hub = connector
        .connect(&pending.hub)
        .await
        .with_context(|| format!("Failed to reconnect to dev hub '{}'", pending.hub))?;

    let mut spinner = SpinnerSink::start(
        &ctx.messages,
        ctx.messages.get("resume.spinner_start", &[job_id.as_str()]),
        !ctx.interactive,
    )?;

    let outcome = resume(provisioner, &hub, job_id, wait, Some(&mut spinner)).await;
    spinner.clear();

    match &outcome {
        Ok(Invocation::Completed { result, .. }) => {
            tracing::info!(job_id = %job_id, username = %result.username, "scratch org active");
            state.pending.remove(job_id.as_str());
            state.record_org(&pending.hub, result, pending.settings);
            persist(&state, &ctx.state_path);
        }
        Ok(Invocation::Queued { .. }) => {}
        Err(err) => tracing::warn!(job_id = %job_id, error = %err, "resume did not complete"),
    }

    outcome
}

/* ---------------- limits ---------------- */

/// Limits of one hub plus its capacity verdict.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubLimits {
    pub hub: String,
    pub has_capacity: bool,
    pub limits: Vec<ApiLimit>,
}

/// Query every hub in order. The first failure stops the run.
pub async fn limits_with<C: HubConnector>(
    connector: &C,
    hubs: &[String],
) -> anyhow::Result<Vec<HubLimits>> {
    let mut out = Vec::with_capacity(hubs.len());

    for id in hubs {
        let hub = connector.connect(id).await?;
        let limits = hub
            .fetch_limits()
            .await
            .with_context(|| format!("Failed to read limits of dev hub '{}'", id))?;

        out.push(HubLimits {
            hub: id.clone(),
            has_capacity: has_capacity(&limits),
            limits,
        });
    }

    Ok(out)
}

fn print_limits(ctx: &RunContext, reports: &[HubLimits]) -> anyhow::Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        println!("{}", ctx.messages.get("limits.header", &[report.hub.as_str()]));
        for limit in &report.limits {
            println!("  {:<40} {:>8} / {:<8}", limit.name, limit.remaining, limit.max);
        }
        let verdict = if report.has_capacity {
            "limits.capacity_ok"
        } else {
            "limits.capacity_none"
        };
        println!("{}", ctx.messages.get(verdict, &[report.hub.as_str()]));
    }

    Ok(())
}

/* ---------------- output ---------------- */

fn report(ctx: &RunContext, outcome: Result<Invocation, CreateError>) -> Result<(), CreateError> {
    let bin = bin_name();

    match outcome {
        Ok(Invocation::Completed { job_id, result }) => {
            print_warnings(ctx, &result);
            if ctx.json {
                let out = json!({ "jobId": job_id, "result": result });
                println!("{}", serde_json::to_string_pretty(&out).context("Failed to render JSON")?);
            } else {
                println!(
                    "{}",
                    ctx.messages
                        .get("create.success", &[result.username.as_str(), result.org_id.as_str()])
                );
            }
            Ok(())
        }

        Ok(Invocation::Queued { job_id }) => {
            if ctx.json {
                let out = json!({ "jobId": job_id, "status": "queued" });
                println!("{}", serde_json::to_string_pretty(&out).context("Failed to render JSON")?);
            } else {
                println!("{}", ctx.messages.get("create.queued", &[bin.as_str(), job_id.as_str()]));
            }
            Ok(())
        }

        Err(CreateError::Timeout { job_id }) => {
            eprintln!("{}", timeout_hint(&ctx.messages, &bin, job_id.as_ref()));
            Err(CreateError::Timeout { job_id })
        }

        Err(err) => {
            eprintln!("{}", ctx.messages.get("create.failed", &[]));
            Err(err)
        }
    }
}

/// Resume hint for a run whose wait ran out.
pub fn timeout_hint(messages: &Messages, bin: &str, job_id: Option<&JobId>) -> String {
    match job_id {
        Some(id) => messages.get("create.timeout", &[bin, id.as_str()]),
        None => messages.get("create.timeout_untracked", &[]),
    }
}

fn print_warnings(ctx: &RunContext, result: &ScratchOrgResult) {
    for w in &result.warnings {
        tracing::warn!(warning = %w, "scratch org warning");
        if !ctx.json {
            eprintln!("{}", ctx.messages.get("create.warning", &[w.as_str()]));
        }
    }
}

/// Connected-app secret: env var first, then an interactive prompt.
fn read_client_secret(messages: &Messages, client_id: &str) -> anyhow::Result<Secret> {
    if let Ok(value) = std::env::var(CLIENT_SECRET_ENV) {
        if !value.is_empty() {
            return Ok(Secret::new(value));
        }
    }

    if !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "A client secret is required for --client-id {}. Set {} when not running in a terminal.",
            client_id,
            CLIENT_SECRET_ENV
        );
    }

    let value = Password::new()
        .with_prompt(messages.get("create.prompt_secret", &[client_id]))
        .interact()
        .context("Failed to read client secret")?;

    Ok(Secret::new(value))
}
