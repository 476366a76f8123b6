//! Transport client: one GET, classified and retried.

use std::thread;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::configuration::Configuration;
use crate::error::ApiError;
use crate::retry::{Outcome, RetryPolicy, RetryStep};
use crate::transport::{HttpTransport, Transport};

/// Issues GET requests against the configured server and applies the [`RetryPolicy`].
#[derive(Debug)]
pub struct Client<T: Transport> {
    base_url: String,
    transport: T,
    policy: RetryPolicy,
}

impl Client<HttpTransport> {
    /// Client over a real HTTP connection, with the default retry policy.
    pub fn from_config(config: &Configuration) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.http_timeout)?;
        Ok(Client::new(config, transport))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(config: &Configuration, transport: T) -> Self {
        Client {
            base_url: config.game_server.clone(),
            transport,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `base_url + path` and parse the body of the 200 as JSON.
    ///
    /// 5xx replies and transport failures are retried after a fixed delay, up to
    /// [`RetryPolicy::max_attempts`] attempts in total. Any other status fails at once.
    ///
    /// # Errors
    /// - [`ApiError::Status`] on a non-200, non-5xx reply
    /// - [`ApiError::RetriesExhausted`] when every attempt was transient
    /// - [`ApiError::Decode`] when a 200 body is not JSON (not retried)
    #[instrument(skip(self))]
    pub fn call(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 1..=self.policy.max_attempts {
            info!("{url}");

            let (outcome, body) = match self.transport.get(&url) {
                Ok(reply) => (Outcome::from_status(reply.status), Some(reply.body)),
                Err(e) => {
                    warn!(attempt, "{e}");
                    (Outcome::TransportFailure, None)
                }
            };

            match self.policy.decide(attempt, &outcome) {
                RetryStep::Done => {
                    let body = body.unwrap_or_default();
                    return serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()));
                }
                RetryStep::RetryAfter(delay) => {
                    if let Outcome::ServerError(status) = outcome {
                        warn!(attempt, status, "server error, retrying");
                    }
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                RetryStep::Fail => {
                    return Err(match outcome {
                        Outcome::ClientError(status) => ApiError::Status(status),
                        _ => ApiError::RetriesExhausted { attempts: attempt },
                    });
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: self.policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod client_tests {
    use serde_json::json;

    use super::*;
    use crate::transport::scripted::ScriptedTransport;

    fn client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
        let config = Configuration::new().with_game_server("http://game.test");
        Client::new(&config, transport).with_policy(RetryPolicy::immediate())
    }

    #[test]
    fn first_success_returns_json() {
        let client = client(ScriptedTransport::new().reply(200, r#"{"status":"ok"}"#));
        assert_eq!(client.call("/api/x").unwrap(), json!({"status": "ok"}));
        assert_eq!(
            client.transport().requested.borrow().as_slice(),
            ["http://game.test/api/x"]
        );
    }

    #[test]
    fn fewer_than_five_transient_failures_then_success() {
        for failures in 0..5 {
            let mut transport = ScriptedTransport::new();
            for i in 0..failures {
                transport = if i % 2 == 0 {
                    transport.reply(503, "busy")
                } else {
                    transport.fail("connection reset")
                };
            }
            let client = client(transport.reply(200, "[1, 2]"));
            assert_eq!(client.call("/p").unwrap(), json!([1, 2]));
            assert_eq!(client.transport().attempts(), failures + 1);
        }
    }

    #[test]
    fn five_server_errors_exhaust_retries() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..7 {
            transport = transport.reply(500, "");
        }
        let client = client(transport);
        let err = client.call("/p").unwrap_err();
        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 5 }));
        assert_eq!(client.transport().attempts(), 5);
    }

    #[test]
    fn transport_failures_exhaust_retries() {
        let client = client(ScriptedTransport::new());
        assert!(matches!(
            client.call("/p"),
            Err(ApiError::RetriesExhausted { attempts: 5 })
        ));
        assert_eq!(client.transport().attempts(), 5);
    }

    #[test]
    fn client_error_is_not_retried() {
        let client = client(ScriptedTransport::new().reply(404, "nope").reply(200, "{}"));
        assert!(matches!(client.call("/p"), Err(ApiError::Status(404))));
        assert_eq!(client.transport().attempts(), 1);
    }

    #[test]
    fn malformed_json_on_200_is_not_retried() {
        let client = client(ScriptedTransport::new().reply(200, "{oops").reply(200, "{}"));
        assert!(matches!(client.call("/p"), Err(ApiError::Decode(_))));
        assert_eq!(client.transport().attempts(), 1);
    }
}
