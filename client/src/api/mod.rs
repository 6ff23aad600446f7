//! HTTP client for the RentX API.
//!
//! The client holds no credentials. Every authenticated call takes the
//! bearer token explicitly, so whoever owns the session decides what each
//! request carries.

mod types;

pub use types::*;

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rentx_engine::{BookingRequest, Car, TableChanges, Version};
use serde::de::DeserializeOwned;
use tracing::debug;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Protocol(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

/// Typed gateway to the remote protocol.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        token: Option<&BearerToken>,
    ) -> Result<Response> {
        let request = match token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        };
        let resp = request.send().await?;
        check_status(resp).await
    }

    // ── Auth ──

    /// Exchange credentials for a session token and profile.
    ///
    /// Rejected credentials surface as [`Error::Authentication`]; an
    /// unreachable or failing server as [`Error::Transport`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let resp = self
            .client
            .post(self.url("sessions"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() && !is_transient(status) {
            let body = resp.text().await.unwrap_or_default();
            debug!(%status, "login rejected");
            return Err(Error::Authentication(describe(status, &body)));
        }

        Ok(check_status(resp).await?.json().await?)
    }

    // ── Direct reads ──

    /// Read a whole collection without going through the local mirror.
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        token: Option<&BearerToken>,
        name: &str,
    ) -> Result<Vec<T>> {
        let resp = self.send(self.client.get(self.url(name)), token).await?;
        Ok(resp.json().await?)
    }

    /// Read one record of a collection by id.
    pub async fn fetch_by_id<T: DeserializeOwned>(
        &self,
        token: Option<&BearerToken>,
        name: &str,
        id: &str,
    ) -> Result<T> {
        let url = self.url(&format!("{name}/{id}"));
        let resp = self.send(self.client.get(url), token).await?;
        Ok(resp.json().await?)
    }

    pub async fn list_cars(&self, token: Option<&BearerToken>) -> Result<Vec<Car>> {
        self.fetch_collection::<CarRecord>(token, "cars")
            .await?
            .into_iter()
            .map(Car::try_from)
            .collect()
    }

    pub async fn get_car(&self, token: Option<&BearerToken>, id: &str) -> Result<Car> {
        self.fetch_by_id::<CarRecord>(token, "cars", id)
            .await?
            .try_into()
    }

    // ── Sync ──

    /// Ask the server what changed in the catalog since `last_pulled_version`.
    pub async fn pull_changes(
        &self,
        token: Option<&BearerToken>,
        last_pulled_version: Version,
    ) -> Result<PullResponse> {
        let request = self
            .client
            .get(self.url("cars/sync/pull"))
            .query(&[("lastPulledVersion", last_pulled_version)]);

        let resp = self.send(request, token).await?;
        Ok(resp.json().await?)
    }

    /// Upload the signed-in user's own profile changes.
    pub async fn push_user_changes(
        &self,
        token: &BearerToken,
        changes: &TableChanges<UserPayload>,
    ) -> Result<()> {
        let request = self.client.post(self.url("users/sync")).json(changes);
        self.send(request, Some(token)).await?;
        Ok(())
    }

    // ── Rentals ──

    pub async fn create_booking(
        &self,
        token: &BearerToken,
        request: &BookingRequest,
    ) -> Result<BookingRecord> {
        let body = BookingBody::from(request);
        let resp = self
            .send(self.client.post(self.url("rentals")).json(&body), Some(token))
            .await?;
        Ok(resp.json().await?)
    }

    /// Booking history of the signed-in user.
    pub async fn list_bookings(&self, token: &BearerToken) -> Result<Vec<Rental>> {
        self.fetch_collection::<RentalRecord>(Some(token), "rentals")
            .await?
            .into_iter()
            .map(Rental::try_from)
            .collect()
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn describe(status: StatusCode, body: &str) -> String {
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    debug!(%status, %url, "request failed");

    let message = describe(status, &body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(message),
        StatusCode::NOT_FOUND => Error::NotFound(format!("{url}: {message}")),
        s if is_transient(s) => Error::Transport(message),
        _ => Error::Protocol(message),
    })
}
