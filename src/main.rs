//! `admindesk`: terminal console for the AY admin dashboard API.

mod api;
mod audit;
mod cli;
mod config;
mod confirm;
mod error;
mod fetcher;
mod filter;
mod forms;
mod models;
mod notify;
mod profile;
mod screen;
mod status;
mod table;
mod view;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "admindesk", about = "Terminal console for the AY admin dashboard")]
pub struct Args {
    #[arg(long, env = "ADMINDESK_API_BASE_URL", help = "API base URL (falls back to VITE_API_BASE_URL)")]
    pub base_url: Option<String>,

    #[arg(long, help = "Config file path (skips the layered search)")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "/", help = "Screen to open first (e.g. /managers)")]
    pub screen: String,

    #[arg(
        short = 'c',
        long = "command",
        value_name = "CMD",
        action = clap::ArgAction::Append,
        help = "Run a command and exit (repeatable, e.g. -c 'search ada')"
    )]
    pub commands: Vec<String>,

    #[arg(long, help = "Answer yes to confirmation prompts")]
    pub yes: bool,

    #[arg(long, help = "Skip the startup endpoint check")]
    pub skip_probe: bool,

    #[arg(long, help = "Audit log directory")]
    pub audit_dir: Option<PathBuf>,

    #[arg(long, help = "Disable the audit log")]
    pub no_audit: bool,

    #[arg(long, help = "Debug logging (overridden by RUST_LOG)")]
    pub debug: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "admindesk=debug" } else { "admindesk=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_audit(cfg: &config::Config, args: &Args, session_id: &str) -> audit::AuditLog {
    if args.no_audit || !cfg.audit_enabled() {
        return audit::AuditLog::disabled(session_id);
    }
    let Some(dir) = args.audit_dir.clone().or_else(|| cfg.audit_dir()) else {
        return audit::AuditLog::disabled(session_id);
    };
    let path = dir.join(format!("{}.jsonl", session_id));
    let opened = std::fs::create_dir_all(&dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| audit::AuditLog::open(&path, session_id));
    match opened {
        Ok(log) => log,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "audit log unavailable");
            audit::AuditLog::disabled(session_id)
        }
    }
}

/// Check every collection endpoint once and report drift.
fn probe(client: &api::RestClient, notifier: &dyn notify::Notifier, base_url: &str) {
    let findings = client.probe();
    let mut unreachable = None;
    for finding in findings {
        match finding {
            api::ProbeFinding::Ok { key } => tracing::debug!(key, "endpoint ok"),
            api::ProbeFinding::Missing { key, path } => notifier.warning(&format!(
                "Endpoint drift: endpoints.{} ({}) is not known to the server",
                key, path
            )),
            api::ProbeFinding::Failed { key, reason } => {
                tracing::debug!(key, %reason, "endpoint probe failed");
                unreachable.get_or_insert(reason);
            }
        }
    }
    if let Some(reason) = unreachable {
        notifier.warning(&format!("Cannot reach the API at {}: {}", base_url, reason));
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.debug);

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load()?
    };
    cfg.override_base_url(args.base_url.clone());

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            eprintln!("Config error {}", e);
        }
        return Err(anyhow::anyhow!("invalid configuration ({} problems)", errors.len()));
    }
    let endpoints = cfg.endpoint_table().map_err(anyhow::Error::msg)?;
    let transport = api::HttpTransport::new(cfg.base_url(), cfg.timeout_ms(), cfg.bearer_token());
    tracing::debug!(
        base_url = transport.base_url(),
        version = %endpoints.version,
        "configuration loaded"
    );

    let client = api::RestClient::new(Box::new(transport), endpoints);
    let notifier: Rc<dyn notify::Notifier> = Rc::new(notify::ConsoleNotifier);

    if !args.skip_probe {
        probe(&client, notifier.as_ref(), cfg.base_url());
    }

    let profile_path = cfg.profile_path();
    let profile = profile_path.as_deref().and_then(profile::load);

    let session_id = uuid::Uuid::new_v4().to_string();
    let audit = open_audit(&cfg, &args, &session_id);

    let services = Rc::new(fetcher::Services {
        client,
        notifier,
        audit: RefCell::new(audit),
        operator_id: profile.as_ref().and_then(|p| p.operator_id()),
    });

    let one_shot = !args.commands.is_empty();
    let confirm = confirm::PromptConfirm::new(args.yes || cfg.assume_yes(), !one_shot);

    let ctx = cli::Context::new(services, Box::new(confirm), profile, profile_path);
    cli::open(&ctx, &args.screen);

    if one_shot {
        cli::run_commands(&ctx, &args.commands)
    } else {
        cli::run_repl(ctx)
    }
}
