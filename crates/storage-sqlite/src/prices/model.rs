//! Database models for price bars.

use chrono::Utc;
use diesel::prelude::*;
use quoteflow_core::errors::{Error, Result};
use quoteflow_core::prices::{NewPriceBar, PriceBar};

use crate::utils::{decimal_to_text, format_bar_timestamp, parse_timestamp, text_to_decimal};

/// Database model for stored bars
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::price_bars)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceBarDB {
    pub id: i64,
    pub symbol: String,
    pub timestamp: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<i64>,
    pub source: String,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::price_bars)]
pub struct NewPriceBarDB {
    pub symbol: String,
    pub timestamp: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<i64>,
    pub source: String,
    pub created_at: String,
}

impl From<&NewPriceBar> for NewPriceBarDB {
    fn from(bar: &NewPriceBar) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            timestamp: format_bar_timestamp(&bar.timestamp),
            open: decimal_to_text(bar.open),
            high: decimal_to_text(bar.high),
            low: decimal_to_text(bar.low),
            close: decimal_to_text(bar.close),
            volume: bar.volume,
            source: bar.source.clone(),
            created_at: format_bar_timestamp(&Utc::now()),
        }
    }
}

impl TryFrom<PriceBarDB> for PriceBar {
    type Error = Error;

    fn try_from(row: PriceBarDB) -> Result<Self> {
        Ok(PriceBar {
            id: row.id,
            timestamp: parse_timestamp(&row.timestamp)?,
            open: text_to_decimal(row.open.as_deref())?,
            high: text_to_decimal(row.high.as_deref())?,
            low: text_to_decimal(row.low.as_deref())?,
            close: text_to_decimal(row.close.as_deref())?,
            volume: row.volume,
            created_at: parse_timestamp(&row.created_at)?,
            symbol: row.symbol,
            source: row.source,
        })
    }
}
