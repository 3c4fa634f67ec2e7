use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use testenv_runner::{ArtifactStatus, BatchReport, TestEvent};

pub const FINISHED_BANNER: &str = "All tests are finished.";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub fn current() -> Self {
        Self {
            style: current_output_style(),
        }
    }

    pub fn print_event(self, event: &TestEvent) {
        for line in format_event_lines(event, self.style) {
            println!("{line}");
        }
    }
}

fn current_output_style() -> OutputStyle {
    if std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub fn format_event_lines(event: &TestEvent, style: OutputStyle) -> Vec<String> {
    match event {
        TestEvent::PackageStarted { .. } => Vec::new(),
        TestEvent::PackagePassed { name } => {
            vec![render_status_line(style, "ok", &format!("Success recipe {name}"))]
        }
        TestEvent::ArtifactFailed { name, outcome, .. } => {
            let detail = match &outcome.status {
                ArtifactStatus::Passed => "passed".to_string(),
                ArtifactStatus::Failed { code: Some(code) } => format!("exited with code {code}"),
                ArtifactStatus::Failed { code: None } => "was terminated by a signal".to_string(),
                ArtifactStatus::NotLaunched { reason } => format!("could not start ({reason})"),
            };
            vec![render_status_line(
                style,
                "err",
                &format!(
                    "Failure recipe {name}: {} test {detail}",
                    outcome.kind.as_str()
                ),
            )]
        }
        TestEvent::PackageSkipped { source, reason } => vec![render_status_line(
            style,
            "warn",
            &format!("Skipped {}: {reason}", source.display()),
        )],
        TestEvent::CleanupFailed { dir, error } => vec![render_status_line(
            style,
            "warn",
            &format!("Could not remove scratch directory {}: {error}", dir.display()),
        )],
        TestEvent::BatchFinished { report } => vec![
            render_status_line(style, "info", &summary_line(report)),
            FINISHED_BANNER.to_string(),
        ],
    }
}

fn summary_line(report: &BatchReport) -> String {
    format!(
        "Tested {} of {} packages: {} passed, {} failed, {} skipped",
        report.tested.len(),
        report.packages_seen,
        report.passed_count(),
        report.failed_count(),
        report.skipped.len()
    )
}

pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let (badge, badge_style) = match status {
                "ok" => ("[OK]", ok_style()),
                "err" => ("[ERR]", err_style()),
                "warn" => ("[WARN]", warn_style()),
                _ => ("[..]", info_style()),
            };
            format!("{} {message}", colorize(badge_style, badge))
        }
    }
}

fn ok_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn err_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn warn_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightYellow.into()))
}

fn info_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
