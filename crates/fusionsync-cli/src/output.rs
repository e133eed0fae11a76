//! Console report lines.

use colored::{ColoredString, Colorize};
use fusionsync_core::sync::{ResourceReport, UploadOutcome};
use fusionsync_core::watch::WatchReport;
use fusionsync_core::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Failure,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    pub fn render(&self) -> ColoredString {
        match self.tone {
            Tone::Success => self.text.green(),
            Tone::Warning => self.text.yellow(),
            Tone::Failure => self.text.red(),
            Tone::Detail => self.text.normal(),
        }
    }
}

pub fn print_lines(lines: &[Line]) {
    for line in lines {
        println!("{}", line.render());
    }
}

/// Indented detail lines for an error, expanding server validation messages.
pub fn error_details(error: &fusionsync_core::Error) -> Vec<Line> {
    let Some(errors) = error.remote_errors() else {
        return Vec::new();
    };
    let mut lines: Vec<Line> = errors
        .field_lines()
        .into_iter()
        .map(|(field, messages)| Line::new(Tone::Detail, format!("  {field}: {messages}")))
        .collect();
    lines.extend(
        errors
            .general_lines()
            .into_iter()
            .map(|message| Line::new(Tone::Detail, format!("  {message}"))),
    );
    lines
}

fn failure_lines(headline: String, error: &fusionsync_core::Error) -> Vec<Line> {
    let details = error_details(error);
    if details.is_empty() {
        return vec![Line::new(Tone::Failure, format!("{headline}: {error}"))];
    }
    let mut lines = vec![Line::new(Tone::Failure, headline)];
    lines.extend(details);
    lines
}

pub fn upload_lines(kind: ResourceKind, report: &ResourceReport) -> Vec<Line> {
    let label = kind.label();
    let id = report.id;
    match &report.outcome {
        UploadOutcome::Created => vec![Line::new(Tone::Success, format!("Created {label} {id}"))],
        UploadOutcome::Replaced => vec![Line::new(Tone::Success, format!("Replaced {label} {id}"))],
        UploadOutcome::Patched => vec![Line::new(Tone::Success, format!("Updated {label} {id}"))],
        UploadOutcome::Skipped(reason) => {
            vec![Line::new(Tone::Warning, format!("Skipped {label} {id}: {reason}"))]
        }
        UploadOutcome::Failed(error) => {
            failure_lines(format!("Failed to upload {label} {id}"), error)
        }
    }
}

pub fn watch_lines(kind: ResourceKind, report: &WatchReport) -> Vec<Line> {
    let label = kind.label();
    match report {
        WatchReport::Rejected { path, rejection } => vec![Line::new(
            Tone::Warning,
            format!("Ignored {}: {rejection}", path.display()),
        )],
        WatchReport::Patched { id, path } => vec![Line::new(
            Tone::Success,
            format!("Uploaded {} to {label} {id}", path.display()),
        )],
        WatchReport::Skipped { id, path, reason } => vec![Line::new(
            Tone::Warning,
            format!("Skipped {} for {label} {id}: {reason}", path.display()),
        )],
        WatchReport::Failed { id, path, error } => failure_lines(
            format!("Failed to upload {} to {label} {id}", path.display()),
            error,
        ),
    }
}
