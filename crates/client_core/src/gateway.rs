//! HTTP gateway to the remote expenses API.

use async_trait::async_trait;
use reqwest::{header::CACHE_CONTROL, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Amount, ExpenseId, ExpenseRecord, UserIdentity},
    error::ApiErrorBody,
    protocol::{
        DeleteResponse, NewExpenseRequest, UpdateAmountRequest, UpdateAmountResponse, UserQuery,
    },
};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://servachello.onrender.com/api/expenses";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid expenses api url: {0}")]
    InvalidUrl(String),
    #[error("request to expenses api failed: {0}")]
    Transport(String),
    #[error("expenses api returned status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("failed to decode expenses api response: {0}")]
    Decode(String),
    #[error("expenses api rejected the request")]
    Rejected { message: Option<String> },
}

impl GatewayError {
    /// Error text supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// CRUD round trips against the expenses API. No call retries.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    async fn fetch_all(&self, user: &UserIdentity) -> Result<Vec<ExpenseRecord>, GatewayError>;
    async fn create(&self, expense: &NewExpenseRequest) -> Result<ExpenseRecord, GatewayError>;
    async fn update_amount(
        &self,
        user: &UserIdentity,
        id: &ExpenseId,
        value: Amount,
    ) -> Result<Amount, GatewayError>;
    async fn delete(&self, user: &UserIdentity, id: &ExpenseId) -> Result<(), GatewayError>;
}

pub struct HttpExpenseApi {
    http: Client,
    base_url: Url,
}

impl HttpExpenseApi {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| GatewayError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn item_url(&self, id: &ExpenseId, tail: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(id.as_str())
            .extend(tail);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.text().map(str::to_string));
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &body
    };
    serde_json::from_slice(body).map_err(|err| GatewayError::Decode(err.to_string()))
}

#[async_trait]
impl ExpenseApi for HttpExpenseApi {
    async fn fetch_all(&self, user: &UserIdentity) -> Result<Vec<ExpenseRecord>, GatewayError> {
        let response = self
            .http
            .get(self.base_url.clone())
            .query(&UserQuery { user_id: user })
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let records: Option<Vec<ExpenseRecord>> = read_json(response).await?;
        Ok(records.unwrap_or_default())
    }

    async fn create(&self, expense: &NewExpenseRequest) -> Result<ExpenseRecord, GatewayError> {
        let response = self
            .http
            .post(self.base_url.clone())
            .json(expense)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_amount(
        &self,
        user: &UserIdentity,
        id: &ExpenseId,
        value: Amount,
    ) -> Result<Amount, GatewayError> {
        let response = self
            .http
            .patch(self.item_url(id, &["amount"])?)
            .json(&UpdateAmountRequest {
                user_id: user.clone(),
                value,
            })
            .send()
            .await?;
        let body: UpdateAmountResponse = read_json(response).await?;
        match body.updated_expense {
            Some(updated) if body.success => Ok(updated.amount),
            _ => Err(GatewayError::Rejected {
                message: body.error,
            }),
        }
    }

    async fn delete(&self, user: &UserIdentity, id: &ExpenseId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(self.item_url(id, &[])?)
            .query(&UserQuery { user_id: user })
            .send()
            .await?;
        let body: DeleteResponse = read_json(response).await?;
        if body.success {
            Ok(())
        } else {
            Err(GatewayError::Rejected {
                message: body.error,
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
