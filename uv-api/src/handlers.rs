use axum::{
    Json,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uv_core::{Comparator, UvBand, banner::parse_threshold};

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, PartialEq)]
pub struct BannerQuery {
    pub city: Option<String>,
    pub threshold: Option<String>,
    pub op: Option<String>,
    pub fresh: Option<String>,
}

impl BannerQuery {
    /// Builds the query from raw pairs. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "city" => &mut query.city,
                "threshold" => &mut query.threshold,
                "op" => &mut query.op,
                "fresh" => &mut query.fresh,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub ok: bool,
    pub city: String,
    pub timestamp: String,
    pub uv_index: f64,
    pub uv_desc: UvBand,
    pub trigger: Trigger,
    pub banner_payload: BannerPayload,
}

#[derive(Debug, Serialize)]
pub struct Trigger {
    pub op: Comparator,
    pub threshold: f64,
    pub matched: bool,
}

#[derive(Debug, Serialize)]
pub struct BannerPayload {
    pub uv: f64,
    pub show_uv_creative: bool,
}

const DEFAULT_THRESHOLD: f64 = 6.0;

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True" | "yes")
}

/// `GET /banner/uv?city=&threshold=&op=&fresh=`
pub async fn banner(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<BannerResponse>, ApiError> {
    let query = BannerQuery::from_pairs(pairs);
    let city = query.city.unwrap_or_else(|| state.default_city.clone());
    let threshold = match query.threshold.as_deref() {
        Some(raw) => parse_threshold(raw)?,
        None => DEFAULT_THRESHOLD,
    };
    let comparator: Comparator = query.op.as_deref().unwrap_or("gte").parse()?;
    let fresh = query.fresh.as_deref().is_some_and(is_truthy);

    let result = state.banner.evaluate(&city, threshold, comparator, fresh).await?;
    let reading = result.reading;

    Ok(Json(BannerResponse {
        ok: true,
        city: reading.city,
        timestamp: reading.timestamp.to_rfc3339(),
        uv_index: reading.uv_index,
        uv_desc: reading.uv_band,
        trigger: Trigger { op: result.comparator, threshold: result.threshold, matched: result.matched },
        banner_payload: BannerPayload { uv: reading.uv_index, show_uv_creative: result.matched },
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        ApiError::NotFound.into_response()
    }
}
