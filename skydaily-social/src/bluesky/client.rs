use crate::bluesky::types::{
    CreateRecordRequest, CreateRecordResponse, CreateSessionRequest, POST_COLLECTION, PostRecord,
    Session,
};
use crate::{PostReceipt, SocialPoster};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use skydaily_common::{Result, SkydailyError};
use skydaily_http::{HttpClient, RequestOpts};
use std::fmt;
use std::time::Duration;

/// Bluesky counts graphemes; counting chars is never more lenient.
pub const MAX_POST_CHARS: usize = 300;

const CREATE_SESSION: &str = "xrpc/com.atproto.server.createSession";
const CREATE_RECORD: &str = "xrpc/com.atproto.repo.createRecord";

/// Handle + app password, supplied by the environment.
#[derive(Clone)]
pub struct BlueskyCredentials {
    pub handle: String,
    pub app_password: String,
}

impl BlueskyCredentials {
    /// Both parts must be present for credentials to exist at all.
    pub fn from_parts(handle: Option<String>, app_password: Option<String>) -> Option<Self> {
        Some(Self {
            handle: handle?,
            app_password: app_password?,
        })
    }
}

impl fmt::Debug for BlueskyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueskyCredentials")
            .field("handle", &self.handle)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct BlueskyClient {
    http: HttpClient,
    credentials: Option<BlueskyCredentials>,
}

impl BlueskyClient {
    pub fn new(
        service: &str,
        credentials: Option<BlueskyCredentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::new(service)
            .map_err(|e| SkydailyError::Config(format!("bluesky service {service:?}: {e}")))?
            .with_timeout(timeout);
        Ok(Self { http, credentials })
    }

    async fn create_session(&self) -> Result<Session> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            SkydailyError::Auth("missing BSKY_HANDLE or BSKY_APP_PASSWORD".into())
        })?;

        let req = CreateSessionRequest {
            identifier: &creds.handle,
            password: &creds.app_password,
        };
        let session: Session = self
            .http
            .post_json(CREATE_SESSION, &req, RequestOpts::default())
            .await
            .map_err(|e| SkydailyError::Auth(e.to_string()))?;

        tracing::debug!(handle=%session.handle, did=%session.did, "bluesky.session.created");
        Ok(session)
    }

    async fn create_post(&self, session: &Session, text: &str) -> Result<PostReceipt> {
        let req = CreateRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            record: PostRecord {
                kind: POST_COLLECTION,
                text,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        };
        let resp: CreateRecordResponse = self
            .http
            .post_json(
                CREATE_RECORD,
                &req,
                RequestOpts {
                    bearer: Some(&session.access_jwt),
                },
            )
            .await
            .map_err(|e| SkydailyError::Post(e.to_string()))?;

        Ok(PostReceipt {
            uri: resp.uri,
            cid: resp.cid,
        })
    }
}

#[async_trait]
impl SocialPoster for BlueskyClient {
    async fn post(&self, text: &str) -> Result<PostReceipt> {
        let chars = text.chars().count();
        if chars > MAX_POST_CHARS {
            return Err(SkydailyError::Post(format!(
                "post is {chars} characters, limit is {MAX_POST_CHARS}"
            )));
        }

        let session = self.create_session().await?;
        let receipt = self.create_post(&session, text).await?;
        tracing::info!(uri=%receipt.uri, "bluesky.post.created");
        Ok(receipt)
    }

    fn account(&self) -> &str {
        self.credentials
            .as_ref()
            .map(|c| c.handle.as_str())
            .unwrap_or("<unset>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_both_parts() {
        assert!(BlueskyCredentials::from_parts(Some("a".into()), None).is_none());
        assert!(BlueskyCredentials::from_parts(None, Some("b".into())).is_none());
        let creds = BlueskyCredentials::from_parts(Some("a".into()), Some("b".into())).unwrap();
        assert_eq!(creds.handle, "a");
    }

    #[test]
    fn debug_never_shows_the_password() {
        let creds = BlueskyCredentials {
            handle: "stats.example.com".into(),
            app_password: "hunter2-hunter2".into(),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("stats.example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
