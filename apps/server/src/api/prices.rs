use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use quoteflow_core::{
    constants::DEFAULT_READ_WINDOW_DAYS,
    prices::{fetcher::normalize_symbol, PriceBar},
};

#[derive(Deserialize, Default)]
struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchResponse {
    status: &'static str,
    symbol: String,
    /// Rows newly persisted by this call
    rows: usize,
    duplicates: usize,
    skipped: usize,
}

/// On-demand refresh, bypassing the queue.
async fn fetch_prices(
    Path(symbol): Path<String>,
    Query(range): Query<DateRange>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FetchResponse>> {
    let outcome = state
        .fetcher
        .fetch_and_store(&symbol, range.start, range.end)
        .await?;
    Ok(Json(FetchResponse {
        status: "fetched",
        symbol: outcome.symbol,
        rows: outcome.inserted,
        duplicates: outcome.duplicates,
        skipped: outcome.skipped,
    }))
}

async fn get_prices(
    Path(symbol): Path<String>,
    Query(range): Query<DateRange>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PriceBar>>> {
    let symbol = normalize_symbol(&symbol)?;
    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = range.start.unwrap_or_else(|| {
        end.checked_sub_days(Days::new(DEFAULT_READ_WINDOW_DAYS as u64))
            .unwrap_or(NaiveDate::MIN)
    });
    if start > end {
        return Err(ApiError::BadRequest(format!(
            "start {} is after end {}",
            start, end
        )));
    }

    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = end
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| end.and_time(NaiveTime::MIN).and_utc());

    let bars = state.price_store.range(&symbol, from, to)?;
    if bars.is_empty() {
        return Err(ApiError::NotFound(format!("No data found for {}", symbol)));
    }
    Ok(Json(bars))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices/{symbol}", get(get_prices))
        .route("/prices/{symbol}/fetch", post(fetch_prices))
}
