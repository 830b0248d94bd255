use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::{
    dao::models::{PendingSubmission, SubmissionId},
    dto::{
        admin::{LiveFightSummary, RoundAction, RoundStateUpdate},
        score::ScoreSubmissionResult,
        scorecard::CachedScorecard,
    },
    error::{BackendError, RejectReason},
    remote::ScoreBackend,
};

/// HTTP implementation of [`ScoreBackend`].
///
/// Every call shares the client's per-request timeout, so a hanging backend
/// surfaces as [`BackendError::Timeout`] instead of stalling the dispatcher.
#[derive(Clone)]
pub struct HttpScoreBackend {
    client: Client,
    base_url: Arc<str>,
    bearer_token: Option<Arc<str>>,
}

/// Body of the submit-score call.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    submission_id: SubmissionId,
    bout_id: &'a str,
    round_number: u32,
    score_red: u8,
    score_blue: u8,
}

impl HttpScoreBackend {
    /// Build a backend client for the given base URL.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(BackendError::Network)?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            bearer_token: None,
        })
    }

    /// Attach a bearer token sent with every request.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(Arc::from(token));
        self
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token.as_ref()),
            None => builder,
        }
    }
}

impl ScoreBackend for HttpScoreBackend {
    fn submit_score(
        &self,
        entry: &PendingSubmission,
    ) -> BoxFuture<'static, Result<ScoreSubmissionResult, BackendError>> {
        let request = self.request(Method::POST, "scores").json(&SubmitBody {
            submission_id: entry.submission_id,
            bout_id: &entry.bout_id,
            round_number: entry.round_number,
            score_red: entry.score_red,
            score_blue: entry.score_blue,
        });
        let submission_id = entry.submission_id;
        Box::pin(async move {
            debug!(%submission_id, "submitting score");
            let response = request.send().await.map_err(map_transport)?;
            decode_submission(response).await
        })
    }

    fn fetch_scorecard(
        &self,
        bout_id: &str,
    ) -> BoxFuture<'static, Result<CachedScorecard, BackendError>> {
        let request = self.request(Method::GET, &format!("scorecards/{bout_id}"));
        Box::pin(async move {
            let response = request.send().await.map_err(map_transport)?;
            decode_json(expect_ok(response)?).await
        })
    }

    fn update_round_state(
        &self,
        bout_id: &str,
        action: RoundAction,
        round_number: Option<u32>,
    ) -> BoxFuture<'static, Result<RoundStateUpdate, BackendError>> {
        #[derive(Serialize)]
        struct Body {
            action: RoundAction,
            #[serde(skip_serializing_if = "Option::is_none")]
            round_number: Option<u32>,
        }

        let request = self
            .request(Method::POST, &format!("admin/bouts/{bout_id}/round-state"))
            .json(&Body {
                action,
                round_number,
            });
        Box::pin(async move {
            let response = request.send().await.map_err(map_transport)?;
            decode_json(expect_ok(response)?).await
        })
    }

    fn list_live_fights(&self) -> BoxFuture<'static, Result<Vec<LiveFightSummary>, BackendError>> {
        let request = self.request(Method::GET, "admin/fights/live");
        Box::pin(async move {
            let response = request.send().await.map_err(map_transport)?;
            decode_json(expect_ok(response)?).await
        })
    }
}

/// Map a transport-level failure, distinguishing the timeout case.
fn map_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(err)
    }
}

fn expect_ok(response: Response) -> Result<Response, BackendError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(BackendError::Auth),
        status => Err(BackendError::Status(status)),
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let bytes = response.bytes().await.map_err(map_transport)?;
    serde_json::from_slice(&bytes).map_err(BackendError::Decode)
}

/// Decode a submit response. Business rejections come back with a non-2xx
/// status and a structured body carrying the rejection code; both are folded
/// into the error taxonomy here.
async fn decode_submission(response: Response) -> Result<ScoreSubmissionResult, BackendError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Auth);
    }

    let bytes = response.bytes().await.map_err(map_transport)?;
    let result: ScoreSubmissionResult = match serde_json::from_slice(&bytes) {
        Ok(result) => result,
        Err(err) if status.is_success() => return Err(BackendError::Decode(err)),
        // Unstructured failure body (proxy error page and the like).
        Err(_) => return Err(BackendError::Status(status)),
    };

    if result.success {
        return Ok(result);
    }
    match result.error.as_deref() {
        Some(code) => Err(BackendError::Rejected(RejectReason::from_code(code))),
        None => Err(BackendError::Status(status)),
    }
}
