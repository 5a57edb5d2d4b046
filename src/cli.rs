// src/cli.rs

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::hub::ProbePolicy;

/// Provision disposable scratch orgs from a pool of dev hubs.
///
/// Dev hubs are declared in `config.yaml` (see `--config`).
/// Flags always override values from a definition file.
#[derive(Parser, Debug)]
#[command(name = "scratchorg", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Path to config file
    ///
    /// Defaults to ~/.scratchorg/config.yaml
    #[arg(long, global = true, env = "SCRATCHORG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a scratch org on the first dev hub with capacity.
    Create(CreateArgs),

    /// Keep waiting on a scratch org request that timed out or was queued.
    Resume {
        /// Job id printed by `create`
        #[arg(short, long)]
        job_id: String,

        /// Minutes to wait for the org to become active
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(2..))]
        wait: u64,
    },

    /// Show scratch org limits for one or more dev hubs.
    Limits {
        /// Dev hub alias or username (repeatable)
        #[arg(short = 'v', long = "target-dev-hub", required = true)]
        target_dev_hub: Vec<String>,

        /// Override the API version used for the request
        #[arg(long, value_parser = parse_api_version)]
        api_version: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Dev hub alias or username (repeatable; tried in order)
    #[arg(short = 'v', long = "target-dev-hub", required = true)]
    pub target_dev_hub: Vec<String>,

    /// Alias for the new scratch org
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Override the API version used for requests
    #[arg(long, value_parser = parse_api_version)]
    pub api_version: Option<String>,

    /// Consumer key of a connected app; prompts for its secret
    #[arg(short = 'i', long)]
    pub client_id: Option<String>,

    /// Scratch org definition file (JSON)
    #[arg(short = 'f', long, value_parser = parse_existing_file)]
    pub definition_file: Option<PathBuf>,

    /// Description of the scratch org
    #[arg(long)]
    pub description: Option<String>,

    /// Days before the org expires
    #[arg(short = 'y', long, default_value_t = 7, value_parser = clap::value_parser!(u8).range(1..=30))]
    pub duration_days: u8,

    /// Platform edition
    #[arg(short, long, value_enum, conflicts_with = "snapshot")]
    pub edition: Option<Edition>,

    /// Name of the scratch org
    #[arg(long)]
    pub name: Option<String>,

    /// Do not include second-generation package ancestors
    #[arg(long)]
    pub no_ancestors: bool,

    /// Create the org with no namespace
    #[arg(short = 'm', long)]
    pub no_namespace: bool,

    /// Release of the org relative to the hub
    #[arg(long, value_enum)]
    pub release: Option<Release>,

    /// Make the new org the default
    #[arg(short = 'd', long)]
    pub set_default: bool,

    /// Org id to clone shape from (00D...)
    #[arg(long, value_parser = parse_source_org)]
    pub source_org: Option<String>,

    /// Turn off local source tracking for the org
    #[arg(long = "no-track-source", action = ArgAction::SetFalse)]
    pub track_source: bool,

    /// Username of the org's admin user
    #[arg(long)]
    pub username: Option<String>,

    /// Minutes to wait for the org to become active
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(2..))]
    pub wait: u64,

    /// Submit the request and return without waiting
    #[arg(long = "async")]
    pub is_async: bool,

    /// Email address of the admin user
    #[arg(long)]
    pub admin_email: Option<String>,

    /// Snapshot to create the org from
    #[arg(long)]
    pub snapshot: Option<String>,

    /// How to treat a dev hub that cannot be reached
    #[arg(long, value_enum, default_value_t = ProbePolicy::FailFast)]
    pub hub_probe_policy: ProbePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Edition {
    Developer,
    Enterprise,
    Group,
    Professional,
    PartnerDeveloper,
    PartnerEnterprise,
    PartnerGroup,
    PartnerProfessional,
}

impl Edition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Developer => "developer",
            Edition::Enterprise => "enterprise",
            Edition::Group => "group",
            Edition::Professional => "professional",
            Edition::PartnerDeveloper => "partner-developer",
            Edition::PartnerEnterprise => "partner-enterprise",
            Edition::PartnerGroup => "partner-group",
            Edition::PartnerProfessional => "partner-professional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Release {
    Preview,
    Previous,
}

impl Release {
    pub fn as_str(&self) -> &'static str {
        match self {
            Release::Preview => "preview",
            Release::Previous => "previous",
        }
    }
}

/* ---------------- value parsers ---------------- */

fn source_org_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^00D([a-zA-Z0-9]{12}|[a-zA-Z0-9]{15})$").expect("valid regex"))
}

fn api_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.0$").expect("valid regex"))
}

fn parse_source_org(raw: &str) -> Result<String, String> {
    if source_org_re().is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err("must be a 15 or 18 character org id starting with 00D".to_string())
    }
}

fn parse_api_version(raw: &str) -> Result<String, String> {
    if api_version_re().is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err("must look like 61.0".to_string())
    }
}

fn parse_existing_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file not found: {}", raw))
    }
}
