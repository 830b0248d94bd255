use std::sync::Arc;

use async_stream::stream;
use futures::{StreamExt, future::BoxFuture, stream::BoxStream};
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    dto::push::ChangeEvent,
    error::FeedError,
    remote::{ChangeFeed, FeedTopic},
};

/// Change feed decoded from the backend's server-sent-events endpoints.
///
/// The feed client carries no timeout: the connection is expected to stay
/// open and idle between deliveries.
#[derive(Clone)]
pub struct HttpChangeFeed {
    client: Client,
    base_url: Arc<str>,
    bearer_token: Option<Arc<str>>,
}

impl HttpChangeFeed {
    /// Build a feed client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let client = Client::builder().build().map_err(FeedError::Connect)?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            bearer_token: None,
        })
    }

    /// Attach a bearer token sent when opening channels.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(Arc::from(token));
        self
    }
}

fn topic_path(topic: &FeedTopic) -> String {
    match topic {
        FeedTopic::Bout(bout_id) => format!("feeds/bouts/{bout_id}"),
        FeedTopic::Event(event_id) => format!("feeds/events/{event_id}"),
    }
}

impl ChangeFeed for HttpChangeFeed {
    fn open(
        &self,
        topic: FeedTopic,
    ) -> BoxFuture<'static, Result<BoxStream<'static, ChangeEvent>, FeedError>> {
        let url = format!("{}/{}", self.base_url, topic_path(&topic));
        let mut request = self.client.get(url).header("accept", "text/event-stream");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.as_ref());
        }

        Box::pin(async move {
            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(FeedError::Connect)?;
            debug!(?topic, "change feed channel opened");

            let mut body = response.bytes_stream();
            let events = stream! {
                let mut buffer = String::new();
                loop {
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            buffer.push_str(&String::from_utf8_lossy(&chunk));
                            while let Some(boundary) = buffer.find("\n\n") {
                                let frame: String = buffer.drain(..boundary + 2).collect();
                                if let Some(event) = parse_frame(&frame) {
                                    yield event;
                                }
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "change feed transport error; closing channel");
                            break;
                        }
                        None => break,
                    }
                }
            };
            Ok(events.boxed())
        })
    }
}

/// Decode one SSE frame into a change event. Keep-alive comments and frames
/// that fail to decode are skipped rather than tearing the channel down.
fn parse_frame(frame: &str) -> Option<ChangeEvent> {
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        }
    }
    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<ChangeEvent>(&data) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "dropping undecodable change event");
            None
        }
    }
}
