//! JSON-over-HTTP transport shared by the typed clients.

use common::{ErrorKind, ServiceError, ServiceLocation};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Issues requests against one resolved service instance and classifies
/// every failure into the shared error taxonomy.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    location: ServiceLocation,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, location: ServiceLocation) -> Self {
        let base_url = location.base_url();
        Self {
            client,
            location,
            base_url,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let request = self.client.get(self.url(path));
        self.send(request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(request).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let request = self.client.put(self.url(path)).json(body);
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(&self.location, e))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                ServiceError::internal(format!("invalid response from {}: {e}", self.location))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("{} returned {status}", self.location));
        Err(ServiceError::new(kind_for_status(status), message))
    }
}

/// Maps a remote HTTP status onto the error taxonomy.
pub fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::InvalidArgument,
        StatusCode::SERVICE_UNAVAILABLE => ErrorKind::Unavailable,
        _ => ErrorKind::Internal,
    }
}

fn classify_send_error(location: &ServiceLocation, e: reqwest::Error) -> ServiceError {
    if e.is_connect() {
        ServiceError::unavailable(format!("could not reach {location}: {e}"))
    } else if e.is_timeout() {
        ServiceError::unavailable(format!("deadline exceeded calling {location}"))
    } else {
        ServiceError::internal(format!("request to {location} failed: {e}"))
    }
}
