//! Mail endpoint cascade
//!
//! Ordered candidate endpoints with per-attempt timeout budgets, and the
//! send policy that walks them. The policy distinguishes "got an answer,
//! even an error status" from "got no answer at all": only the latter makes
//! a submission eligible for the fallback list, so an explicit backend error
//! is never masked by silently retrying against another backend.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

use crate::payload::SubmissionPayload;
use crate::transport::{AttemptResult, Transport, TransportError};

/// Production backend (Railway).
pub const DEFAULT_PRIMARY_URL: &str =
    "https://vartiss-backend-production.up.railway.app/send-mail";

/// Local dev servers tried, in order, when the primary never responds.
pub const DEFAULT_FALLBACK_URLS: [&str; 2] = [
    "http://localhost:5000/send-mail",
    "http://localhost:5001/send-mail",
];

const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1200);

/// Ordered endpoint candidates and their timeout budgets.
///
/// The extended retry budget exists for backend cold starts: a managed
/// backend that idled may need well past the moderate budget to answer its
/// first request.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub primary: String,
    pub fallbacks: Vec<String>,
    /// Budget for the first attempt against the primary.
    pub primary_timeout: Duration,
    /// Extended budget for the single primary retry (5xx or timeout).
    pub retry_timeout: Duration,
    /// Budget for each fallback attempt.
    pub fallback_timeout: Duration,
    /// Pause before the server-error retry.
    pub retry_backoff: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            primary: DEFAULT_PRIMARY_URL.to_string(),
            fallbacks: DEFAULT_FALLBACK_URLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            primary_timeout: DEFAULT_PRIMARY_TIMEOUT,
            retry_timeout: DEFAULT_RETRY_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Cascade failures.
#[derive(Error, Debug)]
pub enum SendError {
    /// Every candidate endpoint failed to produce any response.
    #[error("all mail endpoints failed")]
    Exhausted,

    /// A terminal transport failure (the final retry of the primary).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SendError::Transport(err) if err.is_timeout())
    }
}

/// Send one payload through the endpoint cascade.
///
/// Policy, in order:
/// 1. Primary with the moderate budget.
/// 2. Response received: 5xx → fixed backoff, one retry with the extended
///    budget, and that retry's outcome is final either way. Any other status
///    (client errors included) is final immediately.
/// 3. No response: a timeout earns one extended-budget retry of the primary
///    (cold start); if the primary never responds at all, the fallbacks are
///    tried in order, and the first one to answer — success or failure
///    status — wins.
/// 4. Nothing answered: [`SendError::Exhausted`].
pub async fn send_mail(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    payload: &SubmissionPayload,
) -> Result<AttemptResult, SendError> {
    match transport
        .post_json(&endpoints.primary, payload, endpoints.primary_timeout)
        .await
    {
        Ok(attempt) => {
            if attempt.status >= 500 {
                warn!(
                    status = attempt.status,
                    "primary endpoint returned server error, retrying with extended timeout"
                );
                sleep(endpoints.retry_backoff).await;
                // The explicit retry is final: no falling through to the
                // fallback list even if it also fails.
                return transport
                    .post_json(&endpoints.primary, payload, endpoints.retry_timeout)
                    .await
                    .map_err(SendError::from);
            }
            // An explicit answer, even an error status, is final.
            Ok(attempt)
        }
        Err(err) => {
            warn!(error = %err, "primary endpoint attempt failed");

            if err.is_timeout() {
                // Possible cold start: one retry with the extended budget.
                match transport
                    .post_json(&endpoints.primary, payload, endpoints.retry_timeout)
                    .await
                {
                    Ok(attempt) => return Ok(attempt),
                    Err(retry_err) => {
                        warn!(error = %retry_err, "extended timeout retry failed")
                    }
                }
            }

            // The primary never produced a response: walk the fallbacks.
            for url in &endpoints.fallbacks {
                match transport
                    .post_json(url, payload, endpoints.fallback_timeout)
                    .await
                {
                    Ok(attempt) => return Ok(attempt),
                    Err(fallback_err) => {
                        warn!(endpoint = %url, error = %fallback_err, "fallback endpoint failed")
                    }
                }
            }

            Err(SendError::Exhausted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{FormSource, RawFields, SubmissionPayload};
    use crate::transport::scripted::{attempt, ScriptedTransport};

    fn payload() -> SubmissionPayload {
        let raw = RawFields {
            name: Some("Jo".to_string()),
            email: Some("jo@x.com".to_string()),
            phone: None,
            message: Some("Hi".to_string()),
            gotcha: None,
        };
        SubmissionPayload::from_raw(&raw, FormSource::Index)
    }

    fn endpoints() -> Endpoints {
        Endpoints {
            primary: "https://mail.test/send-mail".to_string(),
            fallbacks: vec![
                "http://localhost:5000/send-mail".to_string(),
                "http://localhost:5001/send-mail".to_string(),
            ],
            ..Endpoints::default()
        }
    }

    #[tokio::test]
    async fn first_attempt_success_is_returned_directly() {
        let transport =
            ScriptedTransport::new(vec![Ok(attempt(200, "{\"success\": true}"))]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert!(result.backend_success());

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://mail.test/send-mail");
        assert_eq!(calls[0].1, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_retries_primary_once_with_extended_timeout() {
        let transport = ScriptedTransport::new(vec![
            Ok(attempt(503, "")),
            Ok(attempt(200, "{\"success\": true}")),
        ]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert!(result.backend_success());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        // Both attempts target the primary; no fallback is consulted.
        assert_eq!(calls[0].0, "https://mail.test/send-mail");
        assert_eq!(calls[1].0, "https://mail.test/send-mail");
        assert_eq!(calls[1].1, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_retry_outcome_is_final_even_on_failure() {
        let transport = ScriptedTransport::new(vec![
            Ok(attempt(500, "")),
            Err(TransportError::Timeout),
        ]);

        let err = send_mail(&transport, &endpoints(), &payload()).await.unwrap_err();
        assert!(err.is_timeout());
        // No fallback attempts after the explicit retry.
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_retry_may_return_another_error_response() {
        let transport = ScriptedTransport::new(vec![
            Ok(attempt(503, "")),
            Ok(attempt(502, "<html>Bad Gateway</html>")),
        ]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert_eq!(result.status, 502);
        assert!(result.body.is_none());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn client_error_is_final_with_no_retry_or_fallback() {
        let transport =
            ScriptedTransport::new(vec![Ok(attempt(400, "{\"error\": \"Bad address\"}"))]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert_eq!(result.status, 400);
        assert_eq!(result.backend_message(), Some("Bad address"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn timeout_earns_one_extended_retry_of_the_primary() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Ok(attempt(200, "{\"success\": true}")),
        ]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert!(result.backend_success());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "https://mail.test/send-mail");
        assert_eq!(calls[1].1, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn connect_failure_skips_retry_and_goes_to_fallbacks() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connect("connection refused".to_string())),
            Ok(attempt(200, "{\"success\": true}")),
        ]);

        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert!(result.backend_success());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        // Straight to the first fallback, no extended primary retry.
        assert_eq!(calls[1].0, "http://localhost:5000/send-mail");
        assert_eq!(calls[1].1, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn fallbacks_are_tried_in_declared_order() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Connect("refused".to_string())),
            Ok(attempt(404, "")),
        ]);

        // The first fallback that answers wins, even with a failure status.
        let result = send_mail(&transport, &endpoints(), &payload()).await.unwrap();
        assert_eq!(result.status, 404);

        let urls: Vec<String> = transport.calls().into_iter().map(|(url, _)| url).collect();
        assert_eq!(
            urls,
            vec![
                "https://mail.test/send-mail",
                "https://mail.test/send-mail",
                "http://localhost:5000/send-mail",
                "http://localhost:5001/send-mail",
            ]
        );
    }

    #[tokio::test]
    async fn exhaustion_when_nothing_answers() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Connect("refused".to_string())),
            Err(TransportError::Connect("refused".to_string())),
        ]);

        let err = send_mail(&transport, &endpoints(), &payload()).await.unwrap_err();
        assert!(matches!(err, SendError::Exhausted));
        assert_eq!(err.to_string(), "all mail endpoints failed");
        assert_eq!(transport.call_count(), 4);
    }

    #[test]
    fn default_endpoints_keep_priority_order() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.primary, DEFAULT_PRIMARY_URL);
        assert_eq!(
            endpoints.fallbacks,
            vec![
                "http://localhost:5000/send-mail".to_string(),
                "http://localhost:5001/send-mail".to_string(),
            ]
        );
        assert_eq!(endpoints.primary_timeout, Duration::from_secs(15));
        assert_eq!(endpoints.retry_timeout, Duration::from_secs(30));
        assert_eq!(endpoints.retry_backoff, Duration::from_millis(1200));
    }
}
