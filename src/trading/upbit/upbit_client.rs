use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const UPBIT_BASE_URL: &str = "https://api.upbit.com";

#[derive(Deserialize, Debug)]
struct ErrorBody {
    name: Option<serde_json::Value>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Upbit 公共行情接口客户端（无需签名）
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
}

impl UpbitClient {
    pub fn new() -> Self {
        Self::with_base_url(UPBIT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        UpbitClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) async fn send_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status_code = response.status();
        let response_body = response.text().await?;
        debug!("path:{}, status:{}, body_len:{}", path, status_code, response_body.len());

        if status_code == StatusCode::OK {
            let result: T = serde_json::from_str(&response_body)?;
            Ok(result)
        } else {
            Err(exchange_error(status_code, &response_body))
        }
    }
}

impl Default for UpbitClient {
    fn default() -> Self {
        Self::new()
    }
}

fn exchange_error(status: StatusCode, body: &str) -> AppError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => match (err.error.name, err.error.message) {
            (Some(name), Some(msg)) => {
                let name = match name {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                format!("{}: {}", name, msg)
            }
            (_, Some(msg)) => msg,
            _ => truncate(body, 200),
        },
        Err(_) => truncate(body, 200),
    };
    AppError::Exchange {
        status: status.as_u16(),
        message,
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_envelope() {
        let body = r#"{"error":{"name":404,"message":"Code not found"}}"#;
        match exchange_error(StatusCode::NOT_FOUND, body) {
            AppError::Exchange { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "404: Code not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exchange_error_named() {
        let body = r#"{"error":{"name":"invalid_query_format","message":"Invalid query format"}}"#;
        match exchange_error(StatusCode::BAD_REQUEST, body) {
            AppError::Exchange { message, .. } => {
                assert_eq!(message, "invalid_query_format: Invalid query format");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exchange_error_plain_body() {
        let body = "x".repeat(500);
        match exchange_error(StatusCode::TOO_MANY_REQUESTS, &body) {
            AppError::Exchange { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message.len(), 200);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("비트코인", 2), "비트");
    }
}
