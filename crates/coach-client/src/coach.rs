use ringside_coach_interface::SuggestionCandidate;

use crate::Error;

/// HTTP client for the coaching computation's request/response surface:
/// the fallback path when no suggestion arrived in time, and the explicit
/// "more options" request.
#[derive(Clone)]
pub struct CoachClient {
    http: reqwest::Client,
    api_base: url::Url,
    api_key: String,
}

#[derive(serde::Serialize)]
struct FallbackRequest<'a> {
    session_id: &'a str,
    turn_generation: u64,
}

#[derive(serde::Serialize)]
struct AlternativesRequest<'a> {
    session_id: &'a str,
    count: usize,
}

#[derive(serde::Deserialize)]
struct AlternativesResponse {
    candidates: Vec<SuggestionCandidate>,
}

impl CoachClient {
    pub fn new(api_base: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, Error> {
        let api_base = url::Url::parse(api_base.as_ref())
            .map_err(|_| Error::InvalidUrl(api_base.as_ref().to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_base,
            api_key: api_key.into(),
        })
    }

    /// Ask for one candidate for the given generation. The caller stamps
    /// the result with the same generation when it re-enters the event
    /// loop, so a slow response cannot be mistaken for a fresh one.
    pub async fn request_fallback(
        &self,
        session_id: &str,
        turn_generation: u64,
    ) -> Result<SuggestionCandidate, Error> {
        let url = self.endpoint("v1/suggestions/fallback")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&FallbackRequest {
                session_id,
                turn_generation,
            })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    /// Ask for `count` alternative candidates, out-of-band of the normal
    /// delivery flow.
    pub async fn request_alternatives(
        &self,
        session_id: &str,
        count: usize,
    ) -> Result<Vec<SuggestionCandidate>, Error> {
        let url = self.endpoint("v1/suggestions/alternatives")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&AlternativesRequest { session_id, count })
            .send()
            .await?;

        let body: AlternativesResponse = Self::check(response).await?.json().await?;
        Ok(body.candidates)
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, Error> {
        self.api_base
            .join(path)
            .map_err(|_| Error::InvalidUrl(format!("{}/{}", self.api_base, path)))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Status { status, body })
        }
    }
}
