//! Terminal display and UI rendering
//!
//! Features:
//! - Live panel redrawn every tick (path, hold, score, safety channels)
//! - Color-coded safety states and grade
//! - Final summary with phase table

use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{stdout, Write};

use therapy_trainer::proxy::ProxyController;
use therapy_trainer::session::{
    format_optional, EvaluationResult, EvaluationSession, SafetyState, ScoreBreakdown,
};

const BAR_WIDTH: usize = 30;
/// Channels shown in the live panel, highest ratio first
const MAX_CHANNELS: usize = 4;

/// Terminal display manager
pub struct Display {
    raw_mode: bool,
}

impl Display {
    /// Plain output, no raw mode
    pub fn simple() -> Self {
        Display { raw_mode: false }
    }

    /// Raw-mode panel for live replay
    pub fn live() -> Result<Self, Box<dyn std::error::Error>> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), cursor::Hide)?;
        Ok(Display { raw_mode: true })
    }

    pub fn clear(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        execute!(
            stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    /// Redraw the whole live panel
    pub fn show_live(
        &self,
        session: &EvaluationSession,
        proxy: &ProxyController,
        last_warning: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        self.clear()?;

        let procedure = session.profile().map_or("-", |p| p.id.as_str());
        execute!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Cyan),
            Print("Therapy Trainer"),
            ResetColor,
            Print(format!(
                "  |  procedure: {}  |  t = {:.1}s",
                procedure,
                session.elapsed()
            )),
        )?;

        let (ratio, frame_label) = match session.path_progress() {
            Some(p) => (p.ratio, format!("{}/{}", p.frame + 1, p.total_frames)),
            None => (0.0, "-".to_string()),
        };
        let (path_color, path_label) = if session.on_path() {
            (Color::Green, "on path")
        } else {
            (Color::Red, "off path")
        };
        execute!(
            stdout,
            cursor::MoveTo(0, 2),
            Print("Path:  "),
            Print(bar(ratio, BAR_WIDTH)),
            Print(format!(" {}  ", frame_label)),
            SetForegroundColor(path_color),
            Print(path_label),
            ResetColor,
        )?;
        if let Some((on_path, evaluated)) = session.path_ticks() {
            execute!(stdout, Print(format!("  ({}/{} ticks)", on_path, evaluated)))?;
        }

        if let Some(hold) = session.hold_progress() {
            execute!(
                stdout,
                cursor::MoveTo(0, 3),
                Print("Hold:  "),
                Print(bar(hold.current / hold.required, BAR_WIDTH)),
                Print(format!(" {:.1}/{:.1}s", hold.current, hold.required)),
            )?;
        }

        if let (Some(score), Some(grade)) = (session.score(), session.grade()) {
            execute!(
                stdout,
                cursor::MoveTo(0, 5),
                SetForegroundColor(Color::Magenta),
                Print("Score: "),
                ResetColor,
                Print(category_line(&score)),
                Print("  |  "),
                SetForegroundColor(grade_color(grade)),
                Print(format!("{:.1}% {}", score.percentage(), grade)),
                ResetColor,
            )?;
        }

        let mut channels = session.channels();
        channels.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        execute!(stdout, cursor::MoveTo(0, 7), Print("Safety:"))?;
        for (row, channel) in channels.iter().take(MAX_CHANNELS).enumerate() {
            execute!(
                stdout,
                cursor::MoveTo(2, 8 + row as u16),
                SetForegroundColor(state_color(channel.state)),
                Print(format!("{:?}", channel.state)),
                ResetColor,
                Print(format!(
                    "  {} {:.0}% of {:.1}",
                    channel.measurement.label(),
                    channel.ratio * 100.0,
                    channel.limit
                )),
            )?;
        }

        let revert_row = 8 + MAX_CHANNELS as u16;
        if let Some(line) = revert_line(session, proxy) {
            execute!(
                stdout,
                cursor::MoveTo(0, revert_row),
                SetForegroundColor(Color::Red),
                Print(line),
                ResetColor,
            )?;
        }

        let footer = revert_row + 2;
        if let Some(warning) = last_warning {
            execute!(
                stdout,
                cursor::MoveTo(0, footer),
                SetForegroundColor(Color::Yellow),
                Print(format!("Last warning: {}", warning)),
                ResetColor,
            )?;
        }
        execute!(
            stdout,
            cursor::MoveTo(0, footer + 2),
            SetForegroundColor(Color::DarkGrey),
            Print("Esc / Ctrl+C to abort  |  r to restart"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print the final result
    pub fn show_summary(&self, result: &EvaluationResult) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        execute!(
            stdout,
            SetForegroundColor(grade_color(result.grade())),
            Print(format!(
                "Grade {}  ({:.1}%)\n",
                result.grade(),
                result.score().percentage()
            )),
            ResetColor,
        )?;
        for line in summary_lines(result) {
            execute!(stdout, Print(line), Print("\n"))?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Restore the terminal
    pub fn shutdown(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.raw_mode {
            execute!(stdout(), cursor::Show, Print("\n"))?;
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}

/// Text progress bar, `fraction` clamped to [0, 1]
pub fn bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn category_line(score: &ScoreBreakdown) -> String {
    let m = &score.maxima;
    format!(
        "path {:.1}/{:.0}  safety {:.1}/{:.0}  accuracy {:.1}/{:.0}  stability {:.1}/{:.0}  total {:.1}/{:.0}",
        score.path_compliance,
        m.path_compliance,
        score.safety,
        m.safety,
        score.accuracy,
        m.accuracy,
        score.stability,
        m.stability,
        score.total(),
        score.max_total()
    )
}

/// Active auto-revert targets with the proxy value steered toward each
fn revert_line(session: &EvaluationSession, proxy: &ProxyController) -> Option<String> {
    let targets = session.revert_targets();
    if targets.is_empty() {
        return None;
    }
    let parts: Vec<String> = targets
        .iter()
        .map(|t| match proxy.proxy_value(t.measurement) {
            Some(value) => format!("{} -> {:.1} (proxy {:.1})", t.measurement.label(), t.axis_value, value),
            None => format!("{} -> {:.1}", t.measurement.label(), t.axis_value),
        })
        .collect();
    Some(format!("Revert: {}", parts.join(", ")))
}

/// Summary body below the grade line
pub fn summary_lines(result: &EvaluationResult) -> Vec<String> {
    let mut lines = vec![
        format!("Procedure: {}", result.procedure_id()),
        format!("Duration:  {:.1}s", result.duration_secs()),
        category_line(result.score()),
        format!(
            "Checkpoints passed: {}/{}  |  completed holds: {}",
            result.checkpoints_passed(),
            result.checkpoints().len(),
            result.completed_holds()
        ),
        {
            let (on_path, evaluated) = result.path_ticks();
            format!("On path: {}/{} ticks", on_path, evaluated)
        },
    ];

    if result.violations().is_empty() {
        lines.push("No safety violations".to_string());
    } else {
        lines.push(format!("Safety violations ({}):", result.violations().len()));
        for violation in result.violations() {
            lines.push(format!("  {:>6.1}s  {}", violation.timestamp, violation.message));
        }
    }

    let phases = result.phases();
    if !phases.is_empty() {
        lines.push(format!("{:<20} {:>10} {:>10}", "Phase", "Time (s)", "Similarity"));
        for phase in phases {
            lines.push(format!(
                "{:<20} {:>10} {:>10}",
                phase.segment_name,
                format_optional(phase.duration_secs, 1),
                format_optional(phase.similarity, 2)
            ));
        }
    }
    lines
}

fn grade_color(grade: &str) -> Color {
    match grade.chars().next() {
        Some('A') => Color::Green,
        Some('B') => Color::Cyan,
        Some('C') => Color::Yellow,
        _ => Color::Red,
    }
}

fn state_color(state: SafetyState) -> Color {
    match state {
        SafetyState::Normal => Color::Green,
        SafetyState::Warning => Color::Yellow,
        SafetyState::Danger => Color::Red,
    }
}
