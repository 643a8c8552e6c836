use chrono::NaiveDate;
use serde::Serialize;
use crate::errors::{Result, DataHubError};
use crate::models::table::{Series, Table, Value};

/// 日线数据结构
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyData {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: Option<f64>,
    pub volume: i64,
}

/// 分红记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Symbol metadata as listed by `/exchanges/{code}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeSymbol {
    pub code: String,
    pub name: String,
    pub country: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub isin: Option<String>,
}

fn position(table: &Table, name: &str) -> Result<usize> {
    table
        .columns()
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .ok_or_else(|| DataHubError::DataError(format!("missing column '{}'", name)))
}

fn optional_position(table: &Table, name: &str) -> Option<usize> {
    table.columns().iter().position(|c| c.eq_ignore_ascii_case(name))
}

fn number(row: &[Value], pos: usize, key: &Value, column: &str) -> Result<f64> {
    row[pos].as_f64().ok_or_else(|| {
        DataHubError::DataError(format!("{}: '{}' is not a number", key, column))
    })
}

fn text(row: &[Value], pos: Option<usize>) -> Option<String> {
    pos.and_then(|p| match &row[p] {
        Value::Null => None,
        v => Some(v.to_string()),
    })
}

impl TryFrom<&Table> for Vec<DailyData> {
    type Error = DataHubError;

    fn try_from(table: &Table) -> Result<Self> {
        let open = position(table, "Open")?;
        let high = position(table, "High")?;
        let low = position(table, "Low")?;
        let close = position(table, "Close")?;
        let volume = position(table, "Volume")?;
        let adjusted = optional_position(table, "Adjusted_close");

        let mut daily = Vec::with_capacity(table.len());
        for (key, row) in table.rows() {
            let date = key
                .as_date()
                .ok_or_else(|| DataHubError::DataError(format!("'{}' is not a date", key)))?;
            daily.push(DailyData {
                date,
                open: number(row, open, key, "Open")?,
                high: number(row, high, key, "High")?,
                low: number(row, low, key, "Low")?,
                close: number(row, close, key, "Close")?,
                adjusted_close: adjusted.and_then(|p| row[p].as_f64()),
                // 停牌日成交量可能为空，非空则必须是整数
                volume: match &row[volume] {
                    Value::Null => 0,
                    v => v.as_i64().ok_or_else(|| {
                        DataHubError::DataError(format!("{}: 'Volume' is not an integer", key))
                    })?,
                },
            });
        }
        Ok(daily)
    }
}

impl TryFrom<&Series> for Vec<Dividend> {
    type Error = DataHubError;

    fn try_from(series: &Series) -> Result<Self> {
        series
            .iter()
            .map(|(key, value)| {
                let date = key
                    .as_date()
                    .ok_or_else(|| DataHubError::DataError(format!("'{}' is not a date", key)))?;
                let amount = value.as_f64().ok_or_else(|| {
                    DataHubError::DataError(format!("{}: dividend '{}' is not a number", key, value))
                })?;
                Ok(Dividend { date, amount })
            })
            .collect()
    }
}

impl TryFrom<&Table> for Vec<ExchangeSymbol> {
    type Error = DataHubError;

    fn try_from(table: &Table) -> Result<Self> {
        let name = optional_position(table, "Name");
        let country = optional_position(table, "Country");
        let exchange = optional_position(table, "Exchange");
        let currency = optional_position(table, "Currency");
        let kind = optional_position(table, "Type");
        let isin = optional_position(table, "Isin");

        Ok(table
            .rows()
            .map(|(key, row)| ExchangeSymbol {
                code: key.to_string(),
                name: text(row, name).unwrap_or_default(),
                country: text(row, country),
                exchange: text(row, exchange),
                currency: text(row, currency),
                kind: text(row, kind),
                isin: text(row, isin),
            })
            .collect())
    }
}
