use chrono::{Local, NaiveDate};
use eod_datahub::{
    Config, DataHubError, DataService, DateRange, EodClient, EodSource, IndexKind, Table, Value,
};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const AAPL_BODY: &str = "Date,Open,High,Low,Close,Volume\n\
    2020-01-02,100,105,99,104,1000\n\
    2020-01-03,104,106,103,105,1200\n\
    FOOTER_TEXT\n";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client_for(server: &MockServer, api_key: &str) -> EodClient {
    let config = Config::new()
        .with_api_key(api_key)
        .with_base_url(&server.uri())
        .with_timeout_secs(5);
    EodClient::new(&config).unwrap()
}

fn sorted_query(request: &Request) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    pairs
}

#[tokio::test]
async fn daily_prices_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eod/AAPL.US"))
        .and(query_param("api_token", "X"))
        .and(query_param("from", "2020-01-01"))
        .and(query_param("to", "2020-01-03"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "X");
    let table = client
        .fetch_daily_prices("AAPL", "US", DateRange::between(ymd(2020, 1, 1), ymd(2020, 1, 3)))
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.index_name(), "Date");
    assert_eq!(
        table.index(),
        &[Value::Date(ymd(2020, 1, 2)), Value::Date(ymd(2020, 1, 3))]
    );
    assert_eq!(table.get("2020-01-02", "Open"), Some(&Value::Int(100)));
    assert_eq!(table.get("2020-01-02", "Close"), Some(&Value::Int(104)));
    assert_eq!(table.get("2020-01-03", "High"), Some(&Value::Int(106)));
    assert_eq!(table.get("2020-01-03", "Volume"), Some(&Value::Int(1200)));
    assert!(table.row("FOOTER_TEXT").is_none());
}

#[tokio::test]
async fn daily_prices_sends_exactly_token_and_dates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eod/PETR4.SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .mount(&server)
        .await;

    let client = client_for(&server, "key-123");
    client
        .fetch_daily_prices("PETR4", "SA", DateRange::between(ymd(2019, 6, 1), ymd(2019, 6, 30)))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        sorted_query(&requests[0]),
        vec![
            ("api_token".to_string(), "key-123".to_string()),
            ("from".to_string(), "2019-06-01".to_string()),
            ("to".to_string(), "2019-06-30".to_string()),
        ]
    );
}

#[tokio::test]
async fn footer_is_dropped_for_any_row_count() {
    let server = MockServer::start().await;

    let mut body = String::from("Date,Open,High,Low,Close,Volume\n");
    for day in 1..=20 {
        body.push_str(&format!("2021-03-{:02},1,2,0.5,1.5,10\n", day));
    }
    body.push_str("Data provided by EOD Historical Data\n");

    Mock::given(method("GET"))
        .and(path("/eod/VALE3.SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let table = client_for(&server, "k")
        .fetch_daily_prices("VALE3", "SA", DateRange::default())
        .await
        .unwrap();
    assert_eq!(table.len(), 20);
}

#[tokio::test]
async fn default_dates_are_still_sent() {
    let server = MockServer::start().await;
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path("/eod/AAPL.US"))
        .and(query_param("from", "2010-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .mount(&server)
        .await;

    client_for(&server, "k")
        .fetch_daily_prices("AAPL", "US", DateRange::default())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let query = sorted_query(&requests[0]);
    let to = query.iter().find(|(k, _)| k == "to").map(|(_, v)| v.clone());
    // 跨越午夜时允许相差一天
    let tomorrow = (Local::now().date_naive() + chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    assert!(to == Some(today) || to == Some(tomorrow));
    assert!(query.iter().any(|(k, v)| k == "from" && v == "2010-01-01"));
}

#[tokio::test]
async fn not_found_is_remote_fetch_error_with_redacted_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eod/NOPE.US"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Ticker Not Found."))
        .mount(&server)
        .await;

    let err = client_for(&server, "real-secret-key")
        .fetch_daily_prices("NOPE", "US", DateRange::between(ymd(2020, 1, 1), ymd(2020, 1, 3)))
        .await
        .unwrap_err();

    match err {
        DataHubError::RemoteFetch { status, reason, url } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
            assert!(!url.contains("real-secret-key"));
            assert!(url.contains("api_token=YOUR_HIDDEN_API"));
            assert!(url.contains("/eod/NOPE.US"));
            assert!(url.contains("from=2020-01-01"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/div/AAPL.US"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, "k")
        .fetch_dividends("AAPL", "US", DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DataHubError::RemoteFetch { status: 500, .. }));
}

#[tokio::test]
async fn dividends_return_single_named_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/div/AAPL.US"))
        .and(query_param("from", "2019-01-01"))
        .and(query_param("to", "2019-12-31"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Date,Dividends\n2019-02-08,0.73\n2019-05-10,0.77\n2019-08-09,0.77\nFOOTER\n",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server, "k");
    let range = DateRange::between(ymd(2019, 1, 1), ymd(2019, 12, 31));
    let series = client.fetch_dividends("AAPL", "US", range).await.unwrap();

    assert_eq!(series.name(), "Dividends");
    assert_eq!(series.len(), 3);
    assert_eq!(series.get("2019-05-10"), Some(&Value::Float(0.77)));

    let history = client.fetch_dividend_history("AAPL", "US", range).await.unwrap();
    assert_eq!(history[0].date, ymd(2019, 2, 8));
    assert_eq!(history[0].amount, 0.73);
}

#[tokio::test]
async fn dividends_with_two_columns_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/div/AAPL.US"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Date,Dividends,Currency\n2019-02-08,0.73,USD\nFOOTER\n",
        ))
        .mount(&server)
        .await;

    let err = client_for(&server, "k")
        .fetch_dividends("AAPL", "US", DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DataHubError::MalformedResponse(_)));
}

#[tokio::test]
async fn exchange_symbols_indexed_by_code_without_dates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exchanges/SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Code,Name,Country,Exchange,Currency,Type\n\
             PETR4,Petrobras PN,Brazil,SA,BRL,Preferred Stock\n\
             VALE3,Vale ON,Brazil,SA,BRL,Common Stock\n\
             FOOTER\n",
        ))
        .mount(&server)
        .await;

    let table = client_for(&server, "k").fetch_exchange_symbols("SA").await.unwrap();
    assert_eq!(table.index_name(), "Code");
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.get("VALE3", "Type"),
        Some(&Value::Text("Common Stock".to_string()))
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        sorted_query(&requests[0]),
        vec![("api_token".to_string(), "k".to_string())]
    );
}

#[tokio::test]
async fn typed_daily_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eod/AAPL.US"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .mount(&server)
        .await;

    let daily = client_for(&server, "k")
        .fetch_daily_data("AAPL", "US", DateRange::default())
        .await
        .unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[1].date, ymd(2020, 1, 3));
    assert_eq!(daily[1].close, 105.0);
    assert_eq!(daily[1].volume, 1200);
}

#[tokio::test]
async fn connection_failure_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let config = Config::new().with_base_url(&uri).with_timeout_secs(2);
    let err = EodClient::new(&config)
        .unwrap()
        .fetch_exchange_symbols("US")
        .await
        .unwrap_err();
    assert!(matches!(err, DataHubError::RequestError(_)));
}

#[tokio::test]
async fn transport_error_does_not_expose_api_key() {
    let config = Config::new()
        .with_api_key("real-secret-key")
        .with_base_url("http://127.0.0.1:1")
        .with_timeout_secs(2);
    let err = EodClient::new(&config)
        .unwrap()
        .fetch_daily_prices("AAPL", "US", DateRange::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DataHubError::RequestError(_)));
    assert!(!err.to_string().contains("real-secret-key"));
    assert!(!format!("{:?}", err).contains("real-secret-key"));
}

#[tokio::test]
async fn fetch_all_writes_one_csv_per_symbol() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exchanges/SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Code,Name\nPETR4,Petrobras\nMISSING,Gone\nVALE3,Vale\nFOOTER\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eod/PETR4.SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eod/VALE3.SA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eod/MISSING.SA"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("sa");
    let config = Config::new().with_api_key("k").with_base_url(&server.uri());
    let client = EodClient::new(&config).unwrap();
    let service = DataService::new(config, Arc::new(client));

    let report = service
        .fetch_all_daily_prices("SA", &out, DateRange::between(ymd(2020, 1, 1), ymd(2020, 1, 3)))
        .await
        .unwrap();

    assert_eq!(report.written, vec![out.join("PETR4.csv"), out.join("VALE3.csv")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "MISSING");

    let saved = std::fs::read_to_string(out.join("VALE3.csv")).unwrap();
    let reloaded = Table::from_csv(&saved, b',', IndexKind::Date).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.columns(), &["Open", "High", "Low", "Close", "Volume"]);
    assert!(saved.starts_with("Date,Open,High,Low,Close,Volume\n2020-01-02,100,105,99,104,1000\n"));
}
