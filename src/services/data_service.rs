use crate::config::Config;
use crate::errors::{DataHubError, Result};
use crate::fetchers::base::EodSource;
use crate::util::{self, DateRange};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 批量下载结果
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    /// (symbol, error message)
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 数据服务，负责批量获取日线数据并写入CSV文件
pub struct DataService {
    config: Config,
    source: Arc<dyn EodSource + Send + Sync>,
}

impl DataService {
    /// 创建新的数据服务实例
    pub fn new(config: Config, source: Arc<dyn EodSource + Send + Sync>) -> Self {
        Self { config, source }
    }

    /// `{output_dir}/{symbol}.csv`
    ///
    /// Fails with `InvalidInput` if the symbol would resolve to a file outside
    /// `output_dir` or under a different name.
    pub fn symbol_path(output_dir: &Path, symbol: &str) -> Result<PathBuf> {
        let symbol = util::require_identifier("symbol", symbol)?;
        let file_name = format!("{}.csv", symbol);
        let path = output_dir.join(&file_name);
        if path.file_name().and_then(|n| n.to_str()) != Some(file_name.as_str()) {
            return Err(DataHubError::InvalidInput(format!(
                "symbol {:?} is not a valid file name", symbol
            )));
        }
        Ok(path)
    }

    fn ensure_dir(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }
        Ok(())
    }

    async fn write_symbol(
        &self,
        symbol: &str,
        exchange: &str,
        output_dir: &Path,
        range: DateRange,
    ) -> Result<PathBuf> {
        let path = Self::symbol_path(output_dir, symbol)?;
        let table = self.source.fetch_daily_prices(symbol, exchange, range).await?;
        table.save_csv(&path)?;
        info!("Saved {} rows for {}.{} to {}", table.len(), symbol, exchange, path.display());
        Ok(path)
    }

    /// 获取单个股票的日线数据并覆盖写入 `{output_dir}/{symbol}.csv`
    pub async fn update_symbol(
        &self,
        symbol: &str,
        exchange: &str,
        output_dir: &Path,
        range: DateRange,
    ) -> Result<PathBuf> {
        Self::ensure_dir(output_dir)?;
        self.write_symbol(symbol, exchange, output_dir, range).await
    }

    /// 下载交易所内所有股票的日线数据，每个股票一个CSV文件
    ///
    /// Symbols are processed one at a time in listing order. A failing symbol
    /// is logged and recorded in the report unless `stop_on_error` is set, in
    /// which case its error is returned and files already written are kept.
    pub async fn fetch_all_daily_prices(
        &self,
        exchange: &str,
        output_dir: &Path,
        range: DateRange,
    ) -> Result<BatchReport> {
        let listing = self.source.fetch_exchange_symbols(exchange).await?;
        let mut symbols: Vec<String> = listing.index().iter().map(|v| v.to_string()).collect();

        // 调试模式：只处理前N个股票
        if let Some(limit) = self.config.symbol_limit {
            let original_count = symbols.len();
            symbols.truncate(limit);
            info!("Processing only {} out of {} symbols from {}", symbols.len(), original_count, exchange);
        }

        Self::ensure_dir(output_dir)?;
        info!("Fetching daily prices for {} symbols from {} into {}", symbols.len(), exchange, output_dir.display());

        let mut report = BatchReport::default();
        for symbol in &symbols {
            match self.write_symbol(symbol, exchange, output_dir, range).await {
                Ok(path) => report.written.push(path),
                Err(e) if self.config.stop_on_error => return Err(e),
                Err(e) => {
                    warn!("Failed to fetch {}.{}: {}", symbol, exchange, e);
                    report.failed.push((symbol.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Finished {}: {} written, {} failed",
            exchange,
            report.written.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
