use eod_datahub::config::Config;
use eod_datahub::fetchers::base::EodSource;
use eod_datahub::fetchers::eod::EodClient;
use eod_datahub::models::stock::{DailyData, Dividend, ExchangeSymbol};
use eod_datahub::models::table::Table;
use eod_datahub::reference_data;
use eod_datahub::services::data_service::DataService;
use eod_datahub::util::{self, DateRange};

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info};
use serde_json::{Map, Value as JsonValue};
use std::io;
use std::path::Path;
use std::sync::Arc;

fn symbol_args<'a>(cmd: App<'a>) -> App<'a> {
    cmd.arg(
        Arg::with_name("symbol")
            .short('s')
            .long("symbol")
            .value_name("SYMBOL")
            .help("Ticker symbol, e.g. AAPL or PETR4")
            .required(true)
            .takes_value(true),
    )
    .arg(exchange_arg())
}

fn exchange_arg<'a>() -> Arg<'a> {
    Arg::with_name("exchange")
        .short('e')
        .long("exchange")
        .value_name("EXCHANGE")
        .help("Exchange code, e.g. US or SA")
        .required(true)
        .takes_value(true)
}

fn date_args<'a>(cmd: App<'a>) -> App<'a> {
    cmd.arg(
        Arg::with_name("from")
            .long("from")
            .value_name("DATE")
            .help("Start date (YYYY-MM-DD), defaults to 2010-01-01")
            .takes_value(true),
    )
    .arg(
        Arg::with_name("to")
            .long("to")
            .value_name("DATE")
            .help("End date (YYYY-MM-DD), defaults to today")
            .takes_value(true),
    )
}

fn output_arg<'a>() -> Arg<'a> {
    Arg::with_name("output")
        .short('o')
        .long("output")
        .value_name("DIR")
        .help("Directory for the per-symbol CSV files")
        .required(true)
        .takes_value(true)
}

fn date_range(matches: &ArgMatches) -> anyhow::Result<DateRange> {
    let start = matches.value_of("from").map(util::parse_date).transpose()?;
    let end = matches.value_of("to").map(util::parse_date).transpose()?;
    Ok(DateRange::new(start, end))
}

fn table_to_json(table: &Table) -> JsonValue {
    let rows = table
        .rows()
        .map(|(key, row)| {
            let mut obj = Map::new();
            obj.insert(table.index_name().to_string(), serde_json::to_value(key).unwrap_or_default());
            for (name, value) in table.columns().iter().zip(row) {
                obj.insert(name.clone(), serde_json::to_value(value).unwrap_or_default());
            }
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(rows)
}

fn print_table(table: &Table, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&table_to_json(table))?);
    } else {
        table.write_csv(io::stdout())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let app = App::new("EOD DataHub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("End-of-day prices, dividends and reference data from EOD Historical Data")
        .arg(
            Arg::with_name("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key (overrides EOD_HISTORICAL_API_KEY)")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print results as JSON instead of CSV")
                .global(true)
                .takes_value(false),
        )
        .subcommand(date_args(symbol_args(
            SubCommand::with_name("eod").about("Fetch daily prices for one symbol"),
        )))
        .subcommand(date_args(symbol_args(
            SubCommand::with_name("dividends").about("Fetch dividend history for one symbol"),
        )))
        .subcommand(
            SubCommand::with_name("symbols")
                .about("List the symbols traded on an exchange")
                .arg(exchange_arg()),
        )
        .subcommand(SubCommand::with_name("exchanges").about("List supported exchanges"))
        .subcommand(SubCommand::with_name("currencies").about("List supported currencies"))
        .subcommand(SubCommand::with_name("indexes").about("List supported indexes"))
        .subcommand(
            date_args(
                SubCommand::with_name("fetch-all")
                    .about("Download daily prices for every symbol of an exchange")
                    .arg(exchange_arg())
                    .arg(output_arg())
                    .arg(
                        Arg::with_name("stop-on-error")
                            .long("stop-on-error")
                            .help("Abort on the first symbol that fails")
                            .takes_value(false),
                    )
                    .arg(
                        Arg::with_name("limit")
                            .short('l')
                            .long("limit")
                            .value_name("N")
                            .help("Only process the first N symbols")
                            .takes_value(true),
                    ),
            ),
        )
        .subcommand(date_args(symbol_args(
            SubCommand::with_name("update")
                .about("Download daily prices for one symbol into a directory")
                .arg(output_arg()),
        )));

    let matches = app.get_matches();

    let (command, m) = match matches.subcommand() {
        Some(sub) => sub,
        None => {
            info!("No command specified. Use --help for usage information.");
            return Ok(());
        }
    };

    // 全局参数既可以写在子命令前也可以写在子命令后
    let mut config = Config::from_env();
    if let Some(key) = m.value_of("api-key").or_else(|| matches.value_of("api-key")) {
        config = config.with_api_key(key);
    }
    let json = m.is_present("json") || matches.is_present("json");

    match command {
        "eod" => {
            let client = EodClient::new(&config)?;
            let symbol = m.value_of("symbol").unwrap_or_default();
            let exchange = m.value_of("exchange").unwrap_or_default();
            let table = client.fetch_daily_prices(symbol, exchange, date_range(m)?).await?;
            if json {
                let daily = Vec::<DailyData>::try_from(&table)?;
                println!("{}", serde_json::to_string_pretty(&daily)?);
            } else {
                print_table(&table, false)?;
            }
        }
        "dividends" => {
            let client = EodClient::new(&config)?;
            let symbol = m.value_of("symbol").unwrap_or_default();
            let exchange = m.value_of("exchange").unwrap_or_default();
            let series = client.fetch_dividends(symbol, exchange, date_range(m)?).await?;
            if json {
                let dividends = Vec::<Dividend>::try_from(&series)?;
                println!("{}", serde_json::to_string_pretty(&dividends)?);
            } else {
                println!("{},{}", series.index_name(), series.name());
                for (date, amount) in series.iter() {
                    println!("{},{}", date, amount);
                }
            }
        }
        "symbols" => {
            let client = EodClient::new(&config)?;
            let exchange = m.value_of("exchange").unwrap_or_default();
            let table = client.fetch_exchange_symbols(exchange).await?;
            if json {
                let symbols = Vec::<ExchangeSymbol>::try_from(&table)?;
                println!("{}", serde_json::to_string_pretty(&symbols)?);
            } else {
                print_table(&table, false)?;
            }
        }
        "exchanges" => print_table(&reference_data::list_exchanges()?, json)?,
        "currencies" => print_table(&reference_data::list_currencies()?, json)?,
        "indexes" => print_table(&reference_data::list_indexes()?, json)?,
        "fetch-all" => {
            let exchange = m.value_of("exchange").unwrap_or_default();
            let output = Path::new(m.value_of("output").unwrap_or("data"));
            config = config.with_stop_on_error(m.is_present("stop-on-error"));
            if let Some(limit) = m.value_of("limit") {
                let limit = limit
                    .parse::<usize>()
                    .with_context(|| format!("invalid --limit value: {}", limit))?;
                config = config.with_symbol_limit(limit);
            }

            let client = EodClient::new(&config)?;
            let service = DataService::new(config, Arc::new(client));
            let report = service.fetch_all_daily_prices(exchange, output, date_range(m)?).await?;

            info!("Wrote {} files to {}", report.written.len(), output.display());
            if !report.is_complete() {
                for (symbol, reason) in &report.failed {
                    error!("{}: {}", symbol, reason);
                }
                bail!("{} of {} symbols failed", report.failed.len(), report.failed.len() + report.written.len());
            }
        }
        "update" => {
            let symbol = m.value_of("symbol").unwrap_or_default();
            let exchange = m.value_of("exchange").unwrap_or_default();
            let output = Path::new(m.value_of("output").unwrap_or("data"));

            let client = EodClient::new(&config)?;
            let service = DataService::new(config, Arc::new(client));
            let path = service.update_symbol(symbol, exchange, output, date_range(m)?).await?;
            info!("Updated {}", path.display());
        }
        other => bail!("Unknown command: {}", other),
    }

    Ok(())
}
