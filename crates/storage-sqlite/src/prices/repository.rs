use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{NewPriceBarDB, PriceBarDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{is_unique_violation, IntoCore};
use crate::schema::price_bars::dsl as price_bars_dsl;
use crate::utils::format_bar_timestamp;
use quoteflow_core::prices::{InsertOutcome, NewPriceBar, PriceBar, PriceStore};
use quoteflow_core::Result;

pub struct PriceRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceStore for PriceRepository {
    async fn insert_bar(&self, bar: &NewPriceBar) -> Result<InsertOutcome> {
        let row = NewPriceBarDB::from(bar);

        // Plain INSERT: a conflict surfaces as UniqueViolation, which fails
        // the job and rolls its transaction back.
        let result = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(price_bars_dsl::price_bars)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => {
                debug!(
                    "Bar {} at {} already stored",
                    bar.symbol,
                    format_bar_timestamp(&bar.timestamp)
                );
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }

    fn range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>> {
        let mut conn = get_connection(&self.pool)?;

        let start_str = format_bar_timestamp(&start);
        let end_str = format_bar_timestamp(&end);

        let rows = price_bars_dsl::price_bars
            .filter(price_bars_dsl::symbol.eq(symbol))
            .filter(price_bars_dsl::timestamp.ge(start_str))
            .filter(price_bars_dsl::timestamp.le(end_str))
            .order(price_bars_dsl::timestamp.asc())
            .select(PriceBarDB::as_select())
            .load::<PriceBarDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(PriceBar::try_from).collect()
    }

    fn count(&self, symbol: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        let count: i64 = price_bars_dsl::price_bars
            .filter(price_bars_dsl::symbol.eq(symbol))
            .count()
            .get_result(&mut conn)
            .into_core()?;

        Ok(count as usize)
    }

    fn ping(&self) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        conn.batch_execute("SELECT 1").into_core()
    }
}
