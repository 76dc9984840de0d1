//! Shared event rendering for terminal output.
//! Used by `signseq replay` and `signseq aggregate`.

use crate::segment::{ClipResult, OutputEvent, Transition};
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Return the ANSI color code for a display confidence.
fn confidence_color(confidence: f32) -> &'static str {
    if confidence >= 0.9 {
        GREEN
    } else if confidence > 0.0 {
        YELLOW
    } else {
        DIM
    }
}

/// Space-separated words, or a placeholder for an empty sequence.
pub fn format_sequence(sequence: &[String]) -> String {
    if sequence.is_empty() {
        "(empty)".to_string()
    } else {
        sequence.join(" ")
    }
}

/// Short marker for a transition, if the frame had one.
fn transition_marker(transition: Option<&Transition>) -> Option<String> {
    match transition? {
        Transition::Committed { word } => Some(format!("+ {}", word)),
        Transition::SequenceReset => Some("reset".to_string()),
        Transition::SequenceComplete => Some("complete".to_string()),
    }
}

/// One line describing a frame's event.
///
/// `offset_ms` prefixes the line when replaying a log.
pub fn format_event(event: &OutputEvent, offset_ms: Option<u64>, color: bool) -> String {
    let mut line = String::new();

    if let Some(ms) = offset_ms {
        line.push_str(&format!("{:>7}ms  ", ms));
    }

    let label = format!("{} ({:.2})", event.display_label, event.confidence);
    if color {
        let c = confidence_color(event.confidence);
        line.push_str(&format!("{c}{:<28}{RESET}", label));
    } else {
        line.push_str(&format!("{:<28}", label));
    }

    line.push_str(&format_sequence(&event.sequence));
    if event.sequence_complete {
        line.push_str(" [done]");
    }

    if let Some(marker) = transition_marker(event.transition.as_ref()) {
        if color {
            line.push_str(&format!("  {BOLD}{}{RESET}", marker));
        } else {
            line.push_str(&format!("  {}", marker));
        }
    }

    line
}

/// Print one event line to stdout.
pub fn render_event(event: &OutputEvent, offset_ms: Option<u64>, color: bool) {
    let mut stdout = io::stdout().lock();
    // Ignore broken pipe
    writeln!(stdout, "{}", format_event(event, offset_ms, color)).ok();
}

/// Print a batch result to stdout.
pub fn render_clip(result: &ClipResult) {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", format_sequence(&result.label_sequence)).ok();
}
