//! HTTP implementation of [`NoteTransport`] on top of `reqwest`.

use super::{NoteTransport, TransportError, TransportFuture};
use crate::{
    api::{CreateNoteInput, GenericResponse, Note, NoteId, NoteResponse, NotesResponse, UpdateNoteInput},
    ClientError,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;
#[cfg(feature = "tracing")]
use tracing::debug;

const NOTES_PATH: &str = "notes";

/// Talks to the notes service over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport for the given base endpoint, e.g. `http://localhost:8080/api/v1/`.
    ///
    /// Requests that get no response within `timeout` fail with
    /// [`TransportError::Network`].
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Returns the base endpoint all note paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `notes` or `notes/{id}` against the base endpoint.
    pub(crate) fn endpoint(&self, id: Option<&NoteId>) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::Unknown(format!("Invalid base URL: {}", self.base_url)))?;
            segments.pop_if_empty().push(NOTES_PATH);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    fn send<T>(&self, request: Result<RequestBuilder, TransportError>) -> TransportFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Box::pin(async move {
            let response = request?.send().await.map_err(network_error)?;
            decode(response).await
        })
    }
}

fn network_error(err: reqwest::Error) -> TransportError {
    #[cfg(feature = "tracing")]
    debug!("Request failed without a response: {err}");
    TransportError::Network(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(TransportError::from_status(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

impl NoteTransport for HttpTransport {
    fn list_notes(&self, page: u32, limit: u32) -> TransportFuture<NotesResponse> {
        let request = self
            .endpoint(None)
            .map(|url| self.client.get(url).query(&[("page", page), ("limit", limit)]));
        self.send(request)
    }

    fn get_note(&self, id: &NoteId) -> TransportFuture<Note> {
        let request = self.endpoint(Some(id)).map(|url| self.client.get(url));
        let response = self.send::<NoteResponse>(request);
        Box::pin(async move { Ok(response.await?.data.note) })
    }

    fn create_note(&self, input: CreateNoteInput) -> TransportFuture<Note> {
        let request = self.endpoint(None).map(|url| self.client.post(url).json(&input));
        let response = self.send::<NoteResponse>(request);
        Box::pin(async move { Ok(response.await?.data.note) })
    }

    fn update_note(&self, id: &NoteId, input: UpdateNoteInput) -> TransportFuture<Note> {
        let request = self.endpoint(Some(id)).map(|url| self.client.patch(url).json(&input));
        let response = self.send::<NoteResponse>(request);
        Box::pin(async move { Ok(response.await?.data.note) })
    }

    fn delete_note(&self, id: &NoteId) -> TransportFuture<String> {
        let request = self.endpoint(Some(id)).map(|url| self.client.delete(url));
        Box::pin(async move {
            let response = request?.send().await.map_err(network_error)?;
            // Some deployments answer a delete with 204 and no body.
            if response.status() == StatusCode::NO_CONTENT {
                return Ok(String::new());
            }
            let body: GenericResponse = decode(response).await?;
            Ok(body.message)
        })
    }
}
