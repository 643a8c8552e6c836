// 公开导出的模块，供外部使用
pub mod config;
pub mod errors;
pub mod fetchers;
pub mod models;
pub mod reference_data;
pub mod services;
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{Result, DataHubError};
pub use fetchers::base::EodSource;
pub use fetchers::eod::EodClient;
pub use models::stock::{DailyData, Dividend, ExchangeSymbol};
pub use models::table::{IndexKind, Series, Table, Value};
pub use reference_data::{list_currencies, list_exchanges, list_indexes};
pub use services::data_service::{BatchReport, DataService};
pub use util::DateRange;
