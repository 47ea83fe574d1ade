use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

use crate::{
    board::Board,
    models::{Created, Envelope, RatingRequest, RatingSummary, School, SchoolInput, SchoolListing},
};

const SCHOOLS_PATH: &str = "/api/schools";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server answered {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response carried no data")]
    MissingData,

    #[error("School {0} is not on the board")]
    UnknownSchool(i32),

    #[error("Failed to submit rating")]
    Resync(#[source] Box<RemoteError>),
}

impl RemoteError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP client for the portal's REST API.
#[derive(Clone, Debug)]
pub struct SchoolsClient {
    http: Client,
    base_url: String,
}

impl SchoolsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, id: Option<i32>) -> String {
        match id {
            Some(id) => format!("{}{SCHOOLS_PATH}/{id}", self.base_url),
            None => format!("{}{SCHOOLS_PATH}", self.base_url),
        }
    }

    pub async fn list(&self) -> Result<Vec<SchoolListing>, RemoteError> {
        let response = self.http.get(self.url(None)).send().await?;

        required(read(response).await?)
    }

    pub async fn search(&self, term: &str) -> Result<Vec<SchoolListing>, RemoteError> {
        let response = self
            .http
            .get(self.url(None))
            .query(&[("search", term)])
            .send()
            .await?;

        required(read(response).await?)
    }

    pub async fn get(&self, id: i32) -> Result<School, RemoteError> {
        let response = self.http.get(self.url(Some(id))).send().await?;

        required(read(response).await?)
    }

    pub async fn create(&self, input: &SchoolInput) -> Result<i32, RemoteError> {
        let created: Created = self.post_json(self.url(None), input).await?;

        Ok(created.id)
    }

    pub async fn update(&self, id: i32, input: &SchoolInput) -> Result<(), RemoteError> {
        let response = self.http.put(self.url(Some(id))).json(input).send().await?;
        read::<serde_json::Value>(response).await?;

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<(), RemoteError> {
        let response = self.http.delete(self.url(Some(id))).send().await?;
        read::<serde_json::Value>(response).await?;

        Ok(())
    }

    pub async fn rate(&self, id: i32, rating: u8) -> Result<RatingSummary, RemoteError> {
        let request = RatingRequest {
            rating: rating.into(),
        };

        self.post_json(self.url(Some(id)), &request).await
    }

    /// Rates a school the way the browse page does: guess first, then settle
    /// on the server's aggregate, or reload the whole board if the post fails.
    pub async fn rate_optimistic(
        &self,
        board: &mut Board,
        id: i32,
        rating: u8,
    ) -> Result<RatingSummary, RemoteError> {
        board
            .apply_optimistic(id, rating)
            .ok_or(RemoteError::UnknownSchool(id))?;

        let error = match self.rate(id, rating).await {
            Ok(summary) => {
                board.reconcile(id, summary);
                return Ok(summary);
            }
            Err(error) => error,
        };

        warn!("Rating school {id} failed, reloading board: {error}");
        board.finish_submission();

        match self.list().await {
            Ok(listings) => {
                board.load(listings);
                Err(error)
            }
            Err(resync) => {
                warn!("Reloading board failed: {resync}");
                Err(RemoteError::Resync(Box::new(error)))
            }
        }
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.post(url).json(body).send().await?;

        required(read(response).await?)
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, RemoteError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or(text);

        return Err(RemoteError::Status { status, message });
    }

    Ok(serde_json::from_str(&text)?)
}

fn required<T>(envelope: Envelope<T>) -> Result<T, RemoteError> {
    envelope.data.ok_or(RemoteError::MissingData)
}
