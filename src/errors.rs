use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// 非200响应，url中的api_token已被替换
    #[error("Remote fetch error: {status} {reason} ({url})")]
    RemoteFetch {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    /// API返回的数据结构与约定不符
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, DataHubError>;

// 用于从字符串创建错误
impl From<String> for DataHubError {
    fn from(s: String) -> Self {
        DataHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for DataHubError {
    fn from(s: &str) -> Self {
        DataHubError::Unknown(s.to_string())
    }
}
