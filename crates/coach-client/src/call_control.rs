use crate::Error;

/// Client for the call-control collaborator: start/end notifications for
/// the phone-line side of a session.
#[derive(Clone)]
pub struct CallControlClient {
    http: reqwest::Client,
    api_base: url::Url,
    api_key: String,
}

#[derive(serde::Serialize)]
struct SessionRef<'a> {
    session_id: &'a str,
}

impl CallControlClient {
    pub fn new(api_base: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, Error> {
        let api_base = url::Url::parse(api_base.as_ref())
            .map_err(|_| Error::InvalidUrl(api_base.as_ref().to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_base,
            api_key: api_key.into(),
        })
    }

    pub async fn notify_started(&self, session_id: &str) -> Result<(), Error> {
        self.post("v1/calls/start", session_id).await
    }

    /// Tell call-control the session ended. Retried at most once; the
    /// local lifecycle has already transitioned optimistically, so a
    /// second failure is the caller's non-fatal warning, not a rollback.
    pub async fn notify_ended(&self, session_id: &str) -> Result<(), Error> {
        match self.post("v1/calls/end", session_id).await {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(error = %first, "call_end_notify_failed_retrying_once");
                self.post("v1/calls/end", session_id).await
            }
        }
    }

    async fn post(&self, path: &str, session_id: &str) -> Result<(), Error> {
        let url = self
            .api_base
            .join(path)
            .map_err(|_| Error::InvalidUrl(format!("{}/{}", self.api_base, path)))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&SessionRef { session_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn end_notification_retries_exactly_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/calls/end"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = CallControlClient::new(server.uri(), "key").unwrap();
        assert!(client.notify_ended("s1").await.is_err());
    }

    #[tokio::test]
    async fn end_notification_succeeds_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/calls/end"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CallControlClient::new(server.uri(), "key").unwrap();
        assert!(client.notify_ended("s1").await.is_ok());
    }
}
