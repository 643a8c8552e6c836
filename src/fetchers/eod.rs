use crate::config::Config;
use crate::errors::{Result, DataHubError};
use crate::fetchers::base::EodSource;
use crate::models::stock::{DailyData, Dividend};
use crate::models::table::{IndexKind, Series, Table};
use crate::util::{self, DateRange};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use url::Url;

/// EOD Historical Data REST API 客户端
///
/// 每个实例持有一个 `reqwest::Client`，连接在多次请求之间复用。
pub struct EodClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl EodClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataHubError::RequestError(e))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))?;
        url.query_pairs_mut()
            .append_pair("api_token", &self.api_key)
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    fn date_params(range: &DateRange) -> Result<Vec<(&'static str, String)>> {
        let (start, end) = range.resolve_today()?;
        Ok(vec![
            ("from", util::format_date(&start)),
            ("to", util::format_date(&end)),
        ])
    }

    /// 发送GET请求并将CSV响应解析为表格（丢弃末尾的footer行）
    async fn get_table(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        index_kind: IndexKind,
    ) -> Result<Table> {
        let url = self.endpoint_url(endpoint, params)?;
        let redacted = util::redact_url(&url);
        debug!("GET {}", redacted);

        // reqwest的错误信息包含完整URL（含api_token），需去掉
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| DataHubError::RequestError(e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            error!("请求失败 {} {}: {}", status.as_u16(), reason, redacted);
            return Err(DataHubError::RemoteFetch {
                status: status.as_u16(),
                reason,
                url: redacted,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataHubError::RequestError(e.without_url()))?;
        let body = util::strip_footer(&text)?;
        let table = Table::from_csv(body, b',', index_kind)?;
        debug!("{} 返回 {} 行", endpoint, table.len());
        Ok(table)
    }

    /// Daily prices decoded into typed rows.
    pub async fn fetch_daily_data(
        &self,
        symbol: &str,
        exchange: &str,
        range: DateRange,
    ) -> Result<Vec<DailyData>> {
        let table = self.fetch_daily_prices(symbol, exchange, range).await?;
        Vec::<DailyData>::try_from(&table)
    }

    /// Dividend history decoded into typed rows.
    pub async fn fetch_dividend_history(
        &self,
        symbol: &str,
        exchange: &str,
        range: DateRange,
    ) -> Result<Vec<Dividend>> {
        let series = self.fetch_dividends(symbol, exchange, range).await?;
        Vec::<Dividend>::try_from(&series)
    }
}

#[async_trait]
impl EodSource for EodClient {
    async fn fetch_daily_prices(&self, symbol: &str, exchange: &str, range: DateRange) -> Result<Table> {
        let symbol = util::require_identifier("symbol", symbol)?;
        let exchange = util::require_identifier("exchange", exchange)?;
        let params = Self::date_params(&range)?;

        info!("获取 {}.{} 日线数据", symbol, exchange);
        self.get_table(&format!("/eod/{}.{}", symbol, exchange), &params, IndexKind::Date)
            .await
    }

    async fn fetch_dividends(&self, symbol: &str, exchange: &str, range: DateRange) -> Result<Series> {
        let symbol = util::require_identifier("symbol", symbol)?;
        let exchange = util::require_identifier("exchange", exchange)?;
        let params = Self::date_params(&range)?;

        info!("获取 {}.{} 分红数据", symbol, exchange);
        let table = self
            .get_table(&format!("/div/{}.{}", symbol, exchange), &params, IndexKind::Date)
            .await?;

        // 分红接口只应返回一列数据，否则说明API格式已变化
        if table.columns().len() != 1 {
            return Err(DataHubError::MalformedResponse(format!(
                "dividend response for {}.{} has {} value columns, expected 1: {:?}",
                symbol,
                exchange,
                table.columns().len(),
                table.columns()
            )));
        }
        let name = table.columns()[0].clone();
        table.into_series(&name)
    }

    async fn fetch_exchange_symbols(&self, exchange_code: &str) -> Result<Table> {
        let exchange_code = util::require_identifier("exchange code", exchange_code)?;

        info!("获取交易所 {} 股票列表", exchange_code);
        let table = self
            .get_table(&format!("/exchanges/{}", exchange_code), &[], IndexKind::Text)
            .await?;
        info!("成功获取 {} 支股票信息", table.len());
        Ok(table)
    }
}
