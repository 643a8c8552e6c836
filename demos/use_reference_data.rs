use eod_datahub::reference_data;
use eod_datahub::{Config, DateRange, EodClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 静态参考数据，无需网络
    let exchanges = reference_data::list_exchanges()?;
    println!("支持的交易所数量: {}", exchanges.len());
    println!("支持的货币数量: {}", reference_data::list_currencies()?.len());
    println!("支持的指数数量: {}", reference_data::list_indexes()?.len());

    if let Some(row) = reference_data::find_exchange("SA")? {
        println!("\nSA 交易所:");
        for (column, value) in row {
            println!("  {:<14} {}", column, value);
        }
    }

    // 使用 EOD_HISTORICAL_API_KEY，未设置时使用 demo key
    let client = EodClient::new(&Config::from_env())?;
    let daily = client.fetch_daily_data("AAPL", "US", DateRange::default()).await?;

    println!("\n最近5天数据:");
    println!("{:<12} {:<10} {:<10} {:<10} {:<10} {:<15}",
             "日期", "开盘", "最高", "最低", "收盘", "成交量");
    println!("{:-<70}", "");

    for bar in daily.iter().rev().take(5) {
        println!("{:<12} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {:<15}",
                 bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume);
    }

    Ok(())
}
