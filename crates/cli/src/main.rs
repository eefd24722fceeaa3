mod config;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use demetsiiify_client::{ActionError, ApiClient, Monitor, MonitorEvent, StreamEnd};
use demetsiiify_core::validation::validate_recipient;
use demetsiiify_core::{JobMonitor, PreferenceStore};
use demetsiiify_types::{JobStatus, NotifyRequest};

use crate::config::{Cli, Command, ImportArgs, NotifyArgs};
use crate::render::{form_error_lines, RenderOptions, Renderer, WELCOME};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    demetsiiify_observability::init_tracing(cli.verbose)
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    match &cli.command {
        Command::Import(args) => run_import(&cli, args).await,
        Command::Notify(args) => run_notify(&cli, args).await,
        Command::DismissWelcome => dismiss_welcome(&cli),
    }
}

fn load_preferences(cli: &Cli) -> PreferenceStore {
    match cli.preferences_path() {
        Some(path) => PreferenceStore::load_or_default(path),
        None => {
            tracing::warn!("no config directory; welcome state will not be remembered");
            PreferenceStore::in_memory()
        }
    }
}

async fn run_import(cli: &Cli, args: &ImportArgs) -> Result<()> {
    let api = ApiClient::new(&cli.client_config()).context("invalid server URL")?;
    let base_url = api.base_url().to_string();
    let mut monitor = Monitor::new(api, load_preferences(cli));
    let options = RenderOptions {
        show_traceback: args.traceback,
    };

    eprintln!("\n\u{1f4dc} demetsiiify v{}\n", env!("CARGO_PKG_VERSION"));
    if monitor.state().show_welcome() {
        eprintln!("{WELCOME}");
    }

    let mut renderer = Renderer::new(base_url, options);
    let mut rejected = 0usize;
    let mut lost = 0usize;

    for url in &args.urls {
        match monitor.submit_url(url).await {
            Ok(job_id) => {
                let Some(view) = monitor.state().job(&job_id) else {
                    continue;
                };
                renderer.println(format!("  \u{2192} {} submitted as {}", url, job_id));
                if view.status().is_terminal() {
                    settle(&mut renderer, &monitor, &job_id, args.open);
                } else {
                    renderer.track(view);
                }
            }
            Err(ActionError::Invalid(e)) => {
                rejected += 1;
                renderer.println(format!("  \u{2717} {url}: {e}"));
                monitor.form_mut().dismiss_error();
            }
            Err(ActionError::Failed(_)) => {
                rejected += 1;
                for line in form_error_lines(monitor.form(), options) {
                    renderer.println(line);
                }
                monitor.form_mut().dismiss_error();
            }
        }
    }

    if let Some(email) = &args.notify {
        if monitor.state().has_jobs() {
            monitor.notifications_mut().open();
            monitor.notifications_mut().set_recipient(email.as_str());
            match monitor.register_notifications().await {
                Ok(()) => renderer.println(format!(
                    "  \u{2709} {} will be notified once the jobs are done",
                    email
                )),
                Err(ActionError::Invalid(e)) => renderer.println(format!("  \u{2717} {e}")),
                Err(ActionError::Failed(_)) => {
                    let message = monitor
                        .notifications()
                        .error_message()
                        .unwrap_or("notification registration failed");
                    renderer.println(format!("  \u{2717} {message}"));
                }
            }
        }
    }

    loop {
        let event = tokio::select! {
            event = monitor.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                renderer.clear();
                eprintln!("\n  Interrupted; jobs keep running on the server.");
                return Ok(());
            }
        };
        let Some(event) = event else {
            break;
        };
        match &event {
            MonitorEvent::Updated { job_id } => {
                if let Some(view) = monitor.state().job(job_id) {
                    renderer.update(view);
                }
            }
            MonitorEvent::Settled { job_id, .. } => {
                settle(&mut renderer, &monitor, job_id, args.open);
            }
            MonitorEvent::StreamLost { job_id, reason } => {
                lost += 1;
                if let Some(view) = monitor.state().job(job_id) {
                    renderer.abandon(view, &describe_end(reason));
                }
            }
        }
    }
    renderer.clear();

    let failed = monitor
        .state()
        .jobs()
        .filter(|view| view.status() == JobStatus::Failed)
        .count();
    let unfinished = unfinished_imports(rejected, failed, lost);
    if unfinished > 0 {
        bail!("{} of {} imports did not finish", unfinished, args.urls.len());
    }
    eprintln!();
    Ok(())
}

/// Imports rejected on submission, failed on the server, or whose stream
/// went away before they settled.
fn unfinished_imports(rejected: usize, failed: usize, lost: usize) -> usize {
    rejected + failed + lost
}

fn settle(renderer: &mut Renderer, monitor: &Monitor, job_id: &str, open_viewer: bool) {
    let Some(view) = monitor.state().job(job_id) else {
        return;
    };
    renderer.settle(view);
    if !open_viewer {
        return;
    }
    if let Some(viewer) = view.viewer_url() {
        let url = monitor.api().absolute(&viewer);
        if let Err(e) = open::that(&url) {
            tracing::warn!(url = %url, error = %e, "could not open browser");
        }
    }
}

fn describe_end(reason: &StreamEnd) -> String {
    match reason {
        StreamEnd::Terminal => "job settled".to_string(),
        StreamEnd::Exhausted => "the server closed the status stream".to_string(),
        StreamEnd::Failed(message) => message.clone(),
    }
}

async fn run_notify(cli: &Cli, args: &NotifyArgs) -> Result<()> {
    let recipient = validate_recipient(&args.email)?;
    let api = ApiClient::new(&cli.client_config()).context("invalid server URL")?;
    let request = NotifyRequest {
        recipient,
        jobs: args.jobs.clone(),
    };
    if let Err(e) = api.notify(&request).await {
        tracing::debug!(error = ?e, "notify failed");
        bail!("{}", e.user_message());
    }
    eprintln!(
        "  \u{2709} {} will be notified about {} job(s)",
        request.recipient,
        request.jobs.len()
    );
    Ok(())
}

fn dismiss_welcome(cli: &Cli) -> Result<()> {
    let path = cli
        .preferences_path()
        .ok_or_else(|| anyhow!("could not determine the config directory; pass --preferences"))?;
    let mut state = JobMonitor::new(PreferenceStore::load_or_default(&path));
    state.dismiss_welcome()?;
    eprintln!("  \u{2713} Welcome text hidden ({})", path.display());
    Ok(())
}
