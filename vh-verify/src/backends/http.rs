//! Shared HTTP plumbing for backend clients
//!
//! Each client owns one [`HttpTransport`]: a reqwest client with a bounded
//! timeout, a bearer credential, and a governor rate limiter.

use super::BackendError;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("VeriHealth/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in a `BackendError::Status`
const MAX_ERROR_BODY: usize = 200;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Authenticated JSON-over-HTTP transport for one backend
pub struct HttpTransport {
    client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST a JSON body to `{base_url}{path}` and decode the JSON reply
    ///
    /// Fails with `MissingCredential` before touching the network or the
    /// rate limiter when no key is configured.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BackendError::MissingCredential)?;

        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut error_text = response.text().await.unwrap_or_default();
            if error_text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| error_text.is_char_boundary(i))
                    .unwrap_or(0);
                error_text.truncate(cut);
            }
            return Err(BackendError::Status(status.as_u16(), error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    fn map_send_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// OpenAI-compatible chat completion wire types (used by Perplexity and OpenAI)
pub mod chat {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct ChatRequest<'a> {
        pub model: &'a str,
        pub messages: Vec<ChatMessage<'a>>,
    }

    #[derive(Debug, Serialize)]
    pub struct ChatMessage<'a> {
        pub role: &'a str,
        pub content: &'a str,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChatResponse {
        #[serde(default)]
        pub choices: Vec<ChatChoice>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChatChoice {
        pub message: ChatReply,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChatReply {
        #[serde(default)]
        pub content: Option<String>,
    }

    impl ChatResponse {
        /// Text of the first choice, if any
        pub fn into_first_content(self) -> Option<String> {
            self.choices.into_iter().next()?.message.content
        }
    }
}
