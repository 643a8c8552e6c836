//! 内嵌的静态参考数据（交易所、货币、指数），无需网络请求。

use crate::errors::Result;
use crate::models::table::{IndexKind, Table, Value};

const EXCHANGES: &str = include_str!("../../data/exchanges.tsv");
const CURRENCIES: &str = include_str!("../../data/currencies.tsv");
const INDEXES: &str = include_str!("../../data/indexes.tsv");

fn load(data: &str) -> Result<Table> {
    Table::from_csv_with_index(data, b'\t', "ID", IndexKind::Text)
}

/// 支持的交易所列表
pub fn list_exchanges() -> Result<Table> {
    load(EXCHANGES)
}

/// 支持的货币列表
pub fn list_currencies() -> Result<Table> {
    load(CURRENCIES)
}

/// 支持的指数列表
pub fn list_indexes() -> Result<Table> {
    load(INDEXES)
}

/// Returns the exchange row whose `Code` matches `code` (case-insensitive),
/// as `(column, value)` pairs.
pub fn find_exchange(code: &str) -> Result<Option<Vec<(String, Value)>>> {
    let table = list_exchanges()?;
    let code_pos = match table.columns().iter().position(|c| c == "Code") {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let code = code.trim();
    let found = table
        .rows()
        .find(|(_, row)| row[code_pos].as_str().is_some_and(|c| c.eq_ignore_ascii_case(code)))
        .map(|(_, row)| table.columns().iter().cloned().zip(row.iter().cloned()).collect());
    Ok(found)
}
