//! Form submission orchestration
//!
//! Per-form state machine: `idle → submitting → (success | failure) → idle`.
//! All network-layer errors are converted to a user-facing outcome here;
//! nothing propagates past [`FormContext::submit`]. Operator diagnostics
//! (status codes, raw bodies) go to the log, never to the user.

mod report;

pub use report::{ResultKind, ResultPanel};

use std::time::Duration;

use tracing::{error, info};
use uuid::Uuid;

use crate::mailer::{self, Endpoints, SendError};
use crate::payload::{FormSource, RawFields, SubmissionPayload};
use crate::transport::{AttemptResult, Transport};

/// Budget for a single POST to an explicit third-party relay endpoint.
const RELAY_TIMEOUT: Duration = Duration::from_secs(12);

const PENDING_LABEL: &str = "Sending...";
const DEFAULT_IDLE_LABEL: &str = "Send Message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitState {
    Idle,
    Submitting,
}

/// Submit control affordances for one form.
#[derive(Debug, Clone)]
pub struct SubmitButton {
    pub disabled: bool,
    pub busy: bool,
    pub label: String,
    idle_label: String,
}

impl SubmitButton {
    fn new(idle_label: &str) -> Self {
        SubmitButton {
            disabled: false,
            busy: false,
            label: idle_label.to_string(),
            idle_label: idle_label.to_string(),
        }
    }

    fn begin_pending(&mut self) {
        self.disabled = true;
        self.busy = true;
        self.label = PENDING_LABEL.to_string();
    }

    fn restore(&mut self) {
        self.disabled = false;
        self.busy = false;
        self.label = self.idle_label.clone();
    }
}

/// Final result surfaced to the user: a flag and a plain-text message.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub message: String,
}

impl SubmissionOutcome {
    fn success(message: &str) -> Self {
        SubmissionOutcome {
            success: true,
            message: message.to_string(),
        }
    }

    fn failure(message: &str) -> Self {
        SubmissionOutcome {
            success: false,
            message: message.to_string(),
        }
    }
}

/// One form and its submission state, owned by the orchestrator.
pub struct FormContext {
    source: FormSource,
    /// Explicit third-party form-relay endpoint; when set, submissions go
    /// there instead of through the mail cascade.
    relay_endpoint: Option<String>,
    pub fields: RawFields,
    state: SubmitState,
    button: SubmitButton,
    result: Option<ResultPanel>,
}

impl FormContext {
    pub fn new(source: FormSource, fields: RawFields) -> Self {
        FormContext {
            source,
            relay_endpoint: None,
            fields,
            state: SubmitState::Idle,
            button: SubmitButton::new(DEFAULT_IDLE_LABEL),
            result: None,
        }
    }

    pub fn with_relay(mut self, endpoint: &str) -> Self {
        self.relay_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn source(&self) -> FormSource {
        self.source
    }

    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    pub fn result_panel(&self) -> Option<&ResultPanel> {
        self.result.as_ref()
    }

    /// Run one submission through the pipeline.
    ///
    /// Returns `None` when a submission is already in flight (re-entrant
    /// submits are a no-op). Every other path — success, failure, network
    /// error — restores the submit control and clears the in-flight state
    /// before returning.
    pub async fn submit(
        &mut self,
        transport: &dyn Transport,
        endpoints: &Endpoints,
    ) -> Option<SubmissionOutcome> {
        if self.state == SubmitState::Submitting {
            return None;
        }
        self.state = SubmitState::Submitting;
        self.button.begin_pending();

        // Correlates the log lines of all attempts within this submission.
        let submission_id = Uuid::new_v4().simple().to_string();

        let outcome = self.run(transport, endpoints, &submission_id).await;

        if outcome.success {
            self.fields.reset();
        }
        report::show_result(&mut self.result, &outcome.message, outcome.success);
        self.button.restore();
        self.state = SubmitState::Idle;

        Some(outcome)
    }

    /// The fallible middle of a submission. Always produces an outcome;
    /// the caller handles the unconditional UI restore.
    async fn run(
        &self,
        transport: &dyn Transport,
        endpoints: &Endpoints,
        submission_id: &str,
    ) -> SubmissionOutcome {
        // Honeypot: discard spam silently behind a simulated success, so
        // the sender learns nothing.
        if self.fields.is_spam() {
            info!(submission_id, "honeypot field set, discarding submission");
            return SubmissionOutcome::success("Message sent successfully");
        }

        let payload = SubmissionPayload::from_raw(&self.fields, self.source);

        // Required-field gate applies to the contact form only; the index
        // hero form submits whatever it has.
        if self.source == FormSource::Contact {
            if let Err(missing) = payload.validate_required() {
                info!(submission_id, ?missing, "contact form missing required fields");
                return SubmissionOutcome::failure(
                    "Please fill in your name, email, and message.",
                );
            }
        }

        match &self.relay_endpoint {
            Some(url) => {
                let result = transport
                    .post_json(url, &payload, RELAY_TIMEOUT)
                    .await
                    .map_err(SendError::from);
                classify(
                    result,
                    submission_id,
                    "Enquiry sent successfully",
                    "Failed to send enquiry. Please check your details and try again.",
                )
            }
            None => {
                let result = mailer::send_mail(transport, endpoints, &payload).await;
                classify(
                    result,
                    submission_id,
                    "Message sent successfully",
                    "Failed to send message. Please check your details and try again.",
                )
            }
        }
    }
}

/// Convert a send result into the user-facing outcome. A backend-supplied
/// `error`/`message` string wins; otherwise the status code picks a generic
/// message.
fn classify(
    result: Result<AttemptResult, SendError>,
    submission_id: &str,
    success_text: &str,
    generic_failure: &str,
) -> SubmissionOutcome {
    match result {
        Ok(attempt) if attempt.backend_success() => SubmissionOutcome::success(success_text),
        Ok(attempt) => {
            error!(
                submission_id,
                status = attempt.status,
                body = %attempt.text,
                "mail backend returned non-success"
            );
            if let Some(message) = attempt.backend_message() {
                SubmissionOutcome::failure(message)
            } else if attempt.status == 404 {
                SubmissionOutcome::failure(
                    "Form is temporarily unavailable. Please try again later.",
                )
            } else if attempt.status >= 500 {
                SubmissionOutcome::failure("Server error. Please try again later.")
            } else {
                SubmissionOutcome::failure(generic_failure)
            }
        }
        Err(err) => {
            error!(submission_id, error = %err, "submission network error");
            if err.is_timeout() {
                SubmissionOutcome::failure("Network timeout. Please try again.")
            } else {
                SubmissionOutcome::failure("Network error. Please try again later.")
            }
        }
    }
}
