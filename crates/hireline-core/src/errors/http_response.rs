// ABOUTME: axum IntoResponse implementation for AppError
// ABOUTME: Maps error codes to HTTP status codes with a JSON error body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{AppError, ErrorCode, ErrorResponse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.code {
            ErrorCode::OAuthExchangeFailed | ErrorCode::OAuthUserInfoFailed => {
                tracing::warn!(code = %self.code, details = %self.details, "{}", self.message);
            }
            code if status.is_server_error() => {
                tracing::error!(code = %code, "{}", self.message);
            }
            _ => {}
        }

        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_status() {
        let response = AppError::refresh_token_expired().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::invalid_redirect_uri("not registered").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::storage("redis down").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
