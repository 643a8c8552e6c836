use crate::errors::Result;
use crate::models::table::{Series, Table};
use crate::util::DateRange;
use async_trait::async_trait;

/// Base trait for remote end-of-day table sources
#[async_trait]
pub trait EodSource {
    /// Daily OHLCV rows for `symbol` on `exchange`, indexed by date
    async fn fetch_daily_prices(&self, symbol: &str, exchange: &str, range: DateRange) -> Result<Table>;

    /// Dividend amounts for `symbol` on `exchange`, indexed by date
    async fn fetch_dividends(&self, symbol: &str, exchange: &str, range: DateRange) -> Result<Series>;

    /// Symbol list for an exchange, indexed by symbol code
    async fn fetch_exchange_symbols(&self, exchange_code: &str) -> Result<Table>;
}
