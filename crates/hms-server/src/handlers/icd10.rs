//! ICD-10 code search.

use crate::error::ApiResult;
use crate::request::ApiQuery;
use crate::response::ok;
use crate::services::icd10;
use axum::response::Response;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// `GET /icd10/search?q=&limit=`
pub async fn search(ApiQuery(query): ApiQuery<SearchQuery>) -> ApiResult<Response> {
    let codes = icd10::search(&query.q, query.limit)?;
    Ok(ok(codes))
}
