//! Terminal rendering of the monitor state.
//!
//! One indicatif bar per job while it is queued or running. Settled jobs
//! replace their bar with a summary line.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use demetsiiify_core::{JobView, SubmissionForm};
use demetsiiify_types::{JobId, JobStatus};

/// Bar resolution; ratios are scaled to this many steps.
const BAR_STEPS: u64 = 1000;

pub const WELCOME: &str = "\
  Hi there!

  This tool creates fresh IIIF manifests (http://iiif.io) from your dusty
  old METS/MODS files. With a IIIF manifest you can annotate and share
  digitized works, get permalinks to every part of the object, and compare
  objects from different sources side by side in Mirador.

  Conversion is a work in progress and has only been tested with METS/MODS
  files that follow the recommendations of the German Research Foundation
  (DFG). Since the DFG-Viewer is based on METS, a DFG-Viewer URL works as
  well: the METS location is extracted from it.

  Run `demetsiiify dismiss-welcome` to hide this text.
";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub show_traceback: bool,
}

pub struct Renderer {
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
    base_url: String,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(base_url: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
            base_url: base_url.into(),
            options,
        }
    }

    /// Print a line above the bars without tearing them.
    pub fn println(&self, line: impl AsRef<str>) {
        if self.multi.println(line.as_ref()).is_err() {
            eprintln!("{}", line.as_ref());
        }
    }

    /// Add a bar for a job that is still in progress.
    pub fn track(&mut self, view: &JobView) {
        if !view.show_progress_bar() || self.bars.contains_key(view.id()) {
            return;
        }
        let pb = self.multi.add(ProgressBar::new(BAR_STEPS));
        pb.set_style(bar_style());
        pb.enable_steady_tick(Duration::from_millis(120));
        self.bars.insert(view.id().to_string(), pb);
        self.update(view);
    }

    pub fn update(&mut self, view: &JobView) {
        let Some(pb) = self.bars.get(view.id()) else {
            return;
        };
        pb.set_position(bar_position(view));
        pb.set_message(progress_message(view));
    }

    /// Replace the bar of a settled job with its summary.
    pub fn settle(&mut self, view: &JobView) -> Vec<String> {
        if let Some(pb) = self.bars.remove(view.id()) {
            pb.finish_and_clear();
        }
        let lines = settled_lines(view, &self.base_url, self.options);
        for line in &lines {
            self.println(line);
        }
        lines
    }

    /// Drop the bar of a job whose stream went away.
    pub fn abandon(&mut self, view: &JobView, reason: &str) {
        if let Some(pb) = self.bars.remove(view.id()) {
            pb.abandon_with_message(format!("{} (connection lost)", view.headline()));
        }
        self.println(format!("  \u{2717} Lost track of {}: {}", view.headline(), reason));
    }

    pub fn clear(&mut self) {
        for (_, pb) in self.bars.drain() {
            pb.finish_and_clear();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner} [{bar:30}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

pub fn bar_position(view: &JobView) -> u64 {
    let ratio = view.completion_ratio().unwrap_or(1.0);
    (ratio * BAR_STEPS as f64).round() as u64
}

pub fn progress_message(view: &JobView) -> String {
    let snapshot = view.snapshot();
    match snapshot.status {
        JobStatus::Queued => match snapshot.position {
            Some(position) => format!("{} (queued, position {})", view.headline(), position),
            None => format!("{} (queued)", view.headline()),
        },
        JobStatus::Started => match (snapshot.current_image, snapshot.total_images) {
            (Some(current), Some(total)) => {
                format!("{} (image {}/{})", view.headline(), current, total)
            }
            _ => format!("{} (started)", view.headline()),
        },
        JobStatus::Finished | JobStatus::Failed => view.headline().to_string(),
    }
}

/// Summary of a finished or failed job.
pub fn settled_lines(view: &JobView, base_url: &str, options: RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    match view.status() {
        JobStatus::Finished => {
            lines.push(format!("  \u{2713} {}", view.headline()));
            if let Some(owner) = view.attribution_text() {
                lines.push(format!("    provided by {owner}"));
            }
            if let Some((result, _)) = view.result_selection() {
                lines.push(format!("    manifest: {result}"));
            }
            if let Some(viewer) = view.viewer_url() {
                lines.push(format!("    viewer:   {base_url}{viewer}"));
            }
        }
        JobStatus::Failed => {
            lines.push(format!("  \u{2717} Could not import {}", view.headline()));
            if let Some(mut display) = view.diagnostic() {
                if let Some(url) = display.mets_url() {
                    lines.push(format!("    No IIIF manifest could be generated from {url}."));
                }
                if options.show_traceback {
                    display.toggle();
                }
                match display.visible_traceback() {
                    Some(traceback) if !traceback.is_empty() => {
                        lines.extend(traceback.lines().map(|l| format!("    | {l}")));
                    }
                    Some(_) => {}
                    None => lines.push("    Re-run with --traceback to see the server error.".into()),
                }
            }
        }
        JobStatus::Queued | JobStatus::Started => {}
    }
    lines
}

/// Inline message or diagnostic of a failed submission.
pub fn form_error_lines(form: &SubmissionForm, options: RenderOptions) -> Vec<String> {
    if let Some(message) = form.error_message() {
        return vec![format!("  \u{2717} {message}")];
    }
    let Some(display) = form.diagnostic() else {
        return Vec::new();
    };
    let mut lines = vec!["  \u{2717} Could not import METS".to_string()];
    if let Some(url) = display.mets_url() {
        lines.push(format!("    No IIIF manifest could be generated from {url}."));
    }
    if options.show_traceback {
        lines.extend(display.traceback().lines().map(|l| format!("    | {l}")));
    } else {
        lines.push("    Re-run with --traceback to see the server error.".into());
    }
    lines
}
