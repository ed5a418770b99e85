//! Response builder utilities.

use super::pagination::{PaginationMeta, PaginationParams};
use super::types::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Builder for constructing API responses.
pub struct ResponseBuilder<T> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T: Serialize> ResponseBuilder<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse::success(data),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.body = self.body.with_message(message);
        self
    }

    pub fn pagination(mut self, pagination: PaginationMeta) -> Self {
        self.body = self.body.with_pagination(pagination);
        self
    }

    pub fn build(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ResponseBuilder<T> {
    fn into_response(self) -> Response {
        self.build()
    }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    ResponseBuilder::new(data).build()
}

/// 201 with `data` and a message.
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    ResponseBuilder::new(data)
        .status(StatusCode::CREATED)
        .message(message)
        .build()
}

/// 200 with `data` and a message.
pub fn with_message<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    ResponseBuilder::new(data).message(message).build()
}

/// 200 with one page of items.
pub fn paginated<T: Serialize>(items: Vec<T>, params: &PaginationParams, total: u64) -> Response {
    ResponseBuilder::new(items)
        .pagination(params.meta(total))
        .build()
}
