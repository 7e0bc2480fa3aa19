//! Zendesk integration for shift compliance checks.
//!
//! Provides:
//! - Incremental retrieval of the Chat agent timeline (presence events)
//! - Agent identity lookup through the Support Users API

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sc_core::{AgentId, PresenceEvent, PresenceStatus};
use serde::Deserialize;
use thiserror::Error;

mod fetcher;
mod identity;

pub use fetcher::{PageRequest, TimelineFetcher, TimelinePage, TimelineSource};
pub use identity::{IdentityResolver, fallback_label, resolve_labels};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const AGENT_TIMELINE_PATH: &str = "/api/v2/chat/incremental/agent_timeline";
const USERS_PATH: &str = "/api/v2/users";

/// Errors building the Zendesk client.
#[derive(Debug, Error)]
pub enum ZendeskError {
    /// A required credential was missing or blank.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// A failed page or lookup request. Carries the request it belongs to.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read.
    #[error("request for {context} failed: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("request for {context} returned status {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("invalid response for {context}: {message}")]
    InvalidResponse { context: String, message: String },
}

/// Credentials for both Zendesk APIs.
#[derive(Clone, Default)]
pub struct ZendeskCredentials {
    /// Account URL, e.g. `https://example.zendesk.com`.
    pub base_url: String,
    /// OAuth token for the Chat API.
    pub chat_token: String,
    /// Agent email used for Support API token auth.
    pub email: String,
    /// Support API token.
    pub api_token: String,
}

impl fmt::Debug for ZendeskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZendeskCredentials")
            .field("base_url", &self.base_url)
            .field("chat_token", &"[REDACTED]")
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// Zendesk API client.
///
/// # Thread Safety
///
/// The client is safe to share across threads; requests share one
/// connection pool.
pub struct ZendeskClient {
    http: reqwest::Client,
    base_url: String,
    chat_token: String,
    email: String,
    api_token: String,
}

impl fmt::Debug for ZendeskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZendeskClient")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("chat_token", &"[REDACTED]")
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ZendeskClient {
    /// Creates a client after checking that every credential is present.
    pub fn new(credentials: ZendeskCredentials) -> Result<Self, ZendeskError> {
        let ZendeskCredentials {
            base_url,
            chat_token,
            email,
            api_token,
        } = credentials;

        require(&base_url, "base URL cannot be empty")?;
        require(&chat_token, "chat token cannot be empty")?;
        require(&email, "email cannot be empty")?;
        require(&api_token, "API token cannot be empty")?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ZendeskError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            chat_token,
            email,
            api_token,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn page_url(&self, request: &PageRequest) -> String {
        match request {
            PageRequest::Start { start_time } => format!(
                "{}{AGENT_TIMELINE_PATH}?start_time={}",
                self.base_url,
                start_time.timestamp_micros()
            ),
            PageRequest::Cursor { url } => url.clone(),
        }
    }

    async fn get_timeline_page(&self, request: &PageRequest) -> Result<TimelinePage, FetchError> {
        let context = request.to_string();
        let url = self.page_url(request);
        tracing::debug!(%url, "requesting timeline page");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.chat_token)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                context: context.clone(),
                source,
            })?;
        let body = read_success_body(response, &context).await?;
        parse_timeline_page(&body, &context)
    }

    /// Looks up the display label (email) of an agent.
    pub async fn lookup_agent(&self, agent_id: AgentId) -> Result<String, FetchError> {
        let context = format!("user {agent_id}");
        let url = format!("{}{USERS_PATH}/{agent_id}", self.base_url);

        let response = self
            .http
            .get(&url)
            .basic_auth(format!("{}/token", self.email), Some(&self.api_token))
            .send()
            .await
            .map_err(|source| FetchError::Request {
                context: context.clone(),
                source,
            })?;
        let body = read_success_body(response, &context).await?;
        parse_user_label(&body, &context)
    }
}

impl TimelineSource for ZendeskClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<TimelinePage, FetchError> {
        self.get_timeline_page(request).await
    }
}

impl IdentityResolver for ZendeskClient {
    async fn resolve(&self, agent_id: AgentId) -> String {
        match self.lookup_agent(agent_id).await {
            Ok(label) => label,
            Err(err) => {
                tracing::warn!(%agent_id, error = %err, "agent lookup failed, using fallback label");
                fallback_label(agent_id)
            }
        }
    }
}

fn require(value: &str, reason: &'static str) -> Result<(), ZendeskError> {
    if value.trim().is_empty() {
        return Err(ZendeskError::InvalidCredentials { reason });
    }
    Ok(())
}

async fn read_success_body(
    response: reqwest::Response,
    context: &str,
) -> Result<String, FetchError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| FetchError::Request {
            context: context.to_string(),
            source,
        })?;
    if !status.is_success() {
        return Err(FetchError::Status {
            context: context.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Wire shape of an `agent_timeline` page.
#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    agent_timeline: Vec<TimelineRecord>,
    next_page: Option<String>,
    /// Unix microseconds.
    end_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TimelineRecord {
    agent_id: u64,
    start_time: DateTime<Utc>,
    status: String,
    duration: Option<f64>,
}

impl From<TimelineRecord> for PresenceEvent {
    fn from(record: TimelineRecord) -> Self {
        Self {
            agent_id: AgentId(record.agent_id),
            status: PresenceStatus::from(record.status),
            timestamp: record.start_time,
            duration: record.duration,
        }
    }
}

fn parse_timeline_page(body: &str, context: &str) -> Result<TimelinePage, FetchError> {
    let invalid = |message: String| FetchError::InvalidResponse {
        context: context.to_string(),
        message,
    };

    let payload: TimelineResponse =
        serde_json::from_str(body).map_err(|err| invalid(err.to_string()))?;
    let end_time = payload
        .end_time
        .map(|micros| {
            DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| invalid(format!("end_time out of range: {micros}")))
        })
        .transpose()?;

    Ok(TimelinePage {
        events: payload
            .agent_timeline
            .into_iter()
            .map(PresenceEvent::from)
            .collect(),
        next_page: payload.next_page.filter(|url| !url.is_empty()),
        end_time,
    })
}

fn parse_user_label(body: &str, context: &str) -> Result<String, FetchError> {
    #[derive(Deserialize)]
    struct UserPayload {
        user: UserDetails,
    }

    #[derive(Deserialize)]
    struct UserDetails {
        email: Option<String>,
        name: Option<String>,
    }

    let payload: UserPayload =
        serde_json::from_str(body).map_err(|err| FetchError::InvalidResponse {
            context: context.to_string(),
            message: err.to_string(),
        })?;
    payload
        .user
        .email
        .or(payload.user.name)
        .filter(|label| !label.trim().is_empty())
        .ok_or_else(|| FetchError::InvalidResponse {
            context: context.to_string(),
            message: "user has neither email nor name".to_string(),
        })
}
