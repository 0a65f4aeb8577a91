use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use super::{BatchSink, TransportError};
use crate::model::TodoItem;
use crate::protocol::BatchEntry;

/// REST client for the list server: snapshot fetch plus batch submission,
/// both against the same resource endpoint.
pub struct HttpApi {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpApi {
    pub fn new(endpoint: Url) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(8))
            .no_proxy()
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Fetch the full list once, reporting how long the request took. The
    /// latency is only ever displayed, never acted on.
    pub async fn fetch_snapshot(&self) -> Result<(Vec<TodoItem>, Duration), TransportError> {
        let started = Instant::now();
        let response = self.client.get(self.endpoint.clone()).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }
        let items = response.json::<Vec<TodoItem>>().await?;
        Ok((items, started.elapsed()))
    }
}

#[async_trait]
impl BatchSink for HttpApi {
    async fn submit(&self, batch: &[BatchEntry]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(batch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
