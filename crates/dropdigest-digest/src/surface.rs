//! Plain-text rendering of report events.

use dropdigest_core::ReportEvent;

/// Render one event as a display line, if it has one.
///
/// `Started` renders the header (`"<n> files"`), records and failures render
/// their one-line form. Skips and the final summary have no line.
pub fn render_event(event: &ReportEvent) -> Option<String> {
    match event {
        ReportEvent::Started { file_count, .. } => Some(format!("{file_count} files")),
        ReportEvent::Record { record, .. } => Some(record.to_string()),
        ReportEvent::Failed { failure, .. } => Some(failure.to_string()),
        ReportEvent::Skipped { .. } | ReportEvent::Finished(_) => None,
    }
}

/// The lines currently shown for the most recent drop.
///
/// Each new drop clears what the previous one displayed.
#[derive(Debug, Default, Clone)]
pub struct TextSurface {
    lines: Vec<String>,
}

impl TextSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event.
    pub fn apply(&mut self, event: &ReportEvent) {
        if matches!(event, ReportEvent::Started { .. }) {
            self.lines.clear();
        }
        if let Some(line) = render_event(event) {
            self.lines.push(line);
        }
    }

    /// Current lines, header first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Current display as newline-separated text.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
