use chrono::{Local, NaiveDate};
use url::Url;
use crate::errors::{Result, DataHubError};

/// 未指定起始日期时使用的默认值
pub const DEFAULT_START_DATE: (i32, u32, u32) = (2010, 1, 1);
/// 错误信息中替换api_token的占位符
pub const HIDDEN_API_KEY: &str = "YOUR_HIDDEN_API";

/// Optional start/end pair for the date-ranged endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    /// Fills in the defaults and checks ordering.
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let (y, m, d) = DEFAULT_START_DATE;
        let start = match self.start {
            Some(date) => date,
            None => NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| DataHubError::DataError("invalid default start date".to_string()))?,
        };
        let end = self.end.unwrap_or(today);

        if start > end {
            return Err(DataHubError::InvalidInput(format!(
                "start date {} is after end date {}", start, end
            )));
        }
        Ok((start, end))
    }

    pub fn resolve_today(&self) -> Result<(NaiveDate, NaiveDate)> {
        self.resolve(Local::now().date_naive())
    }
}

// 日期转换工具
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

/// 校验代码/交易所等标识符：非空，且不含路径分隔符或URL保留字符
///
/// Identifiers end up both in a URL path segment and in a file name, so
/// `/`, `\`, `..`, `?` and `#` are refused.
pub fn require_identifier<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DataHubError::InvalidInput(format!("{} must not be empty", name)));
    }
    if trimmed.contains(|c: char| matches!(c, '/' | '\\' | '?' | '#')) || trimmed.contains("..") {
        return Err(DataHubError::InvalidInput(format!(
            "{} contains a reserved character: {:?}", name, trimmed
        )));
    }
    Ok(trimmed)
}

/// Returns `url` with the `api_token` query value replaced by [`HIDDEN_API_KEY`].
pub fn redact_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == "api_token" {
                (k.into_owned(), HIDDEN_API_KEY.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut redacted = url.clone();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Drops the trailing footer line the API appends to every CSV response.
///
/// Trailing blank lines are ignored when locating the footer. Bodies without
/// at least a header line and a footer line are rejected.
pub fn strip_footer(text: &str) -> Result<&str> {
    let trimmed = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
    match trimmed.rfind('\n') {
        Some(pos) => Ok(&trimmed[..pos + 1]),
        None => Err(DataHubError::MalformedResponse(format!(
            "expected a header and a footer line, got {} line(s)",
            if trimmed.trim().is_empty() { 0 } else { 1 }
        ))),
    }
}
