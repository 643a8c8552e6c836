use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use crate::errors::{Result, DataHubError};

/// 单元格值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            // `as` 会饱和截断，超出i64范围的值视为无法转换
            Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// How the index column is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Date,
    Text,
}

/// Column type picked from all non-empty cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

fn looks_numeric(cell: &str) -> bool {
    cell.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}

/// Finite floats only; `-inf`, `1e999` and friends stay text.
fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn infer_column(cells: &[String]) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        if !looks_numeric(cell) {
            return ColumnKind::Text;
        }
        if kind == ColumnKind::Int && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && parse_finite(cell).is_none() {
            return ColumnKind::Text;
        }
    }
    kind
}

fn convert_cell(cell: String, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Text(cell)),
        ColumnKind::Float => match parse_finite(&cell) {
            Some(f) => Value::Float(f),
            None => Value::Text(cell),
        },
        ColumnKind::Text => Value::Text(cell),
    }
}

/// 按索引列组织的表格，行顺序与CSV原始顺序一致
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    columns: Vec<String>,
    index: Vec<Value>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Decodes delimited text using the first column as the index.
    pub fn from_csv(text: &str, delimiter: u8, index_kind: IndexKind) -> Result<Self> {
        Self::decode(text, delimiter, None, index_kind)
    }

    /// Decodes delimited text using the named column as the index.
    pub fn from_csv_with_index(
        text: &str,
        delimiter: u8,
        index_column: &str,
        index_kind: IndexKind,
    ) -> Result<Self> {
        Self::decode(text, delimiter, Some(index_column), index_kind)
    }

    fn decode(
        text: &str,
        delimiter: u8,
        index_column: Option<&str>,
        index_kind: IndexKind,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DataHubError::MalformedResponse("missing header row".to_string()));
        }

        let index_pos = match index_column {
            Some(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
                DataHubError::MalformedResponse(format!("index column '{}' not found", name))
            })?,
            None => 0,
        };

        let mut index = Vec::new();
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len() - 1];

        for (row_no, record) in reader.records().enumerate() {
            let record = record?;
            let mut value_col = 0;
            for (pos, field) in record.iter().enumerate() {
                if pos == index_pos {
                    let key = match index_kind {
                        IndexKind::Date => Value::Date(
                            NaiveDate::parse_from_str(field, "%Y-%m-%d").map_err(|e| {
                                DataHubError::DataError(format!(
                                    "row {}: invalid date '{}': {}", row_no + 1, field, e
                                ))
                            })?,
                        ),
                        IndexKind::Text => Value::Text(field.to_string()),
                    };
                    index.push(key);
                } else {
                    raw_columns[value_col].push(field.to_string());
                    value_col += 1;
                }
            }
        }

        let kinds: Vec<ColumnKind> = raw_columns.iter().map(|c| infer_column(c)).collect();
        let mut rows: Vec<Vec<Value>> = (0..index.len())
            .map(|_| Vec::with_capacity(kinds.len()))
            .collect();
        for (cells, kind) in raw_columns.into_iter().zip(kinds) {
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.push(convert_cell(cell, kind));
            }
        }

        let mut columns = headers;
        let index_name = columns.remove(index_pos);

        Ok(Self {
            index_name,
            columns,
            index,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Value, &[Value])> {
        self.index.iter().zip(self.rows.iter().map(|r| r.as_slice()))
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn row_position(&self, key: &str) -> Option<usize> {
        self.index.iter().position(|v| v.to_string() == key)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|r| &r[pos]).collect())
    }

    /// Looks up a row by its index key rendered as text (e.g. `2020-01-02`).
    pub fn row(&self, key: &str) -> Option<&[Value]> {
        self.row_position(key).map(|i| self.rows[i].as_slice())
    }

    pub fn get(&self, key: &str, column: &str) -> Option<&Value> {
        let col = self.column_position(column)?;
        let row = self.row_position(key)?;
        Some(&self.rows[row][col])
    }

    /// Extracts one value column as a series keyed by this table's index.
    pub fn into_series(self, column: &str) -> Result<Series> {
        let pos = self.column_position(column).ok_or_else(|| {
            DataHubError::DataError(format!("column '{}' not found", column))
        })?;
        let values = self.rows.into_iter().map(|mut r| r.swap_remove(pos)).collect();
        Ok(Series {
            name: column.to_string(),
            index_name: self.index_name,
            index: self.index,
            values,
        })
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(|c| c.as_str()));
        wtr.write_record(&header)?;

        for (key, row) in self.rows() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(key.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| DataHubError::DataError(e.to_string()))
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

/// 单列数据，索引与原表一致
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    index_name: String,
    index: Vec<Value>,
    values: Vec<Value>,
}

impl Series {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index
            .iter()
            .position(|v| v.to_string() == key)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.index.iter().zip(self.values.iter())
    }
}
