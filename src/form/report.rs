//! Inline result reporting
//!
//! One reusable panel per form. Only plain text ever goes in, so content
//! echoed back by a backend can never be rendered as markup.

/// Visual class of the panel; mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Error,
}

/// The single result container of a form, created on first report and
/// reused for every later one.
#[derive(Debug, Clone)]
pub struct ResultPanel {
    text: String,
    kind: ResultKind,
    role: &'static str,
    live_region: &'static str,
}

impl ResultPanel {
    fn new() -> Self {
        ResultPanel {
            text: String::new(),
            kind: ResultKind::Error,
            // Announced by assistive tech without stealing focus.
            role: "status",
            live_region: "polite",
        }
    }

    fn set(&mut self, message: &str, success: bool) {
        self.text = message.trim().to_string();
        self.kind = if success {
            ResultKind::Success
        } else {
            ResultKind::Error
        };
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn live_region(&self) -> &'static str {
        self.live_region
    }
}

/// Render a result message into the form's panel, creating the panel on
/// first use. Idempotent: repeated calls reuse the one container.
pub fn show_result(slot: &mut Option<ResultPanel>, message: &str, success: bool) {
    let panel = slot.get_or_insert_with(ResultPanel::new);
    panel.set(message, success);
}
