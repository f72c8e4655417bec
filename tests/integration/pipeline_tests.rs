//! Integration tests for the pipeline
//!
//! These tests use wiremock to stand in for the geolocation service and run
//! the full pipeline against log files in a temporary directory.

use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use weblog_star::config::{load_config, SchemaVariant};
use weblog_star::geo::{GeoLookup, IpApiClient, LookupError};
use weblog_star::pipeline::run_pipeline;
use weblog_star::{Geolocation, PipelineError};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "#Software: Microsoft Internet Information Services 10.0\n\
#Version: 1.0\n\
#Date: 2024-03-01 00:00:00\n\
#Fields: date time s-ip cs-method cs-uri-stem cs-uri-query s-port cs-username c-ip cs(User-Agent) sc-status sc-bytes cs-bytes time-taken\n";

fn log_line(ip: &str, stem: &str, agent: &str) -> String {
    format!(
        "2024-03-01 08:15:00 10.0.0.5 GET {} - 443 - {} {} 200 2048 410 12\n",
        stem, ip, agent
    )
}

/// Writes a config file pointing at `root/logs`, `root/out` and the mock server
fn write_config(root: &Path, endpoint: &str, schema: SchemaVariant) -> std::path::PathBuf {
    let config_path = root.join("weblog-star.toml");
    let content = format!(
        r#"
[input]
log-dir = "{logs}"

[output]
output-dir = "{out}"
schema = "{schema}"

[geolocation]
endpoint = "{endpoint}"
timeout-secs = 5
max-attempts = 3
retry-delay-ms = 0
"#,
        logs = root.join("logs").display(),
        out = root.join("out").display(),
        schema = schema.as_str(),
        endpoint = endpoint,
    );
    std::fs::write(&config_path, content).unwrap();
    config_path
}

fn sydney() -> serde_json::Value {
    json!({
        "status": "success",
        "country": "Australia",
        "regionName": "New South Wales",
        "city": "Sydney",
        "zip": "2000"
    })
}

/// Reads a CSV file into its header and rows
fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn column(header: &[String], name: &str) -> usize {
    header
        .iter()
        .position(|h| h == name)
        .unwrap_or_else(|| panic!("missing column {}", name))
}

#[tokio::test]
async fn test_robots_requester_flagged_in_combined_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/json/[0-9.]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sydney()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("logs")).unwrap();
    let firefox = "Mozilla/5.0+(Windows+NT+10.0;+Win64;+x64;+rv:120.0)+Gecko/20100101+Firefox/120.0";
    let content = format!(
        "{}{}{}{}",
        HEADER,
        log_line("198.51.100.7", "/robots.txt", "Googlebot/2.1"),
        log_line("198.51.100.7", "/index.html", firefox),
        log_line("203.0.113.9", "/index.html", firefox),
    );
    std::fs::write(temp.path().join("logs").join("u_ex240301.log"), content).unwrap();

    let endpoint = format!("{}/json", mock_server.uri());
    let config = load_config(&write_config(temp.path(), &endpoint, SchemaVariant::Combined))
        .unwrap();

    let stats = run_pipeline(config).await.unwrap();

    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.lines_read, 7);
    assert_eq!(stats.directives, 4);
    assert_eq!(stats.robots_hits, 1);
    assert_eq!(stats.facts, 2);
    assert_eq!(stats.crawler_facts, 1);
    assert_eq!(stats.crawler_ips, 1);
    assert_eq!(stats.dimension_rows, vec![("dimensions", 1)]);

    let out = temp.path().join("out");
    let (header, dimensions) = read_csv(&out.join("dimensions.csv"));
    assert_eq!(header, vec!["id", "browser", "operating_system", "file_type"]);
    assert_eq!(dimensions, vec![vec!["1", "Firefox", "Windows", "html"]]);

    let (header, facts) = read_csv(&out.join("facts.csv"));
    assert_eq!(header.len(), 20);
    assert_eq!(facts.len(), 2);

    let ip = column(&header, "c-ip");
    let crawler = column(&header, "is_crawler");
    let city = column(&header, "city");
    assert_eq!(facts[0][ip], "198.51.100.7");
    assert_eq!(facts[0][crawler], "1");
    assert_eq!(facts[1][ip], "203.0.113.9");
    assert_eq!(facts[1][crawler], "0");
    assert!(facts.iter().all(|row| row[city] == "Sydney"));
    assert!(facts.iter().all(|row| row[column(&header, "dimension_id")] == "1"));
}

#[tokio::test]
async fn test_staged_output_layout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sydney()))
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("logs")).unwrap();
    let chrome = "Mozilla/5.0+(X11;+Linux+x86_64)+AppleWebKit/537.36+Chrome/120.0+Safari/537.36";
    let content = format!(
        "{}{}{}",
        log_line("192.0.2.1", "/styles/site.css", chrome),
        log_line("192.0.2.2", "/", chrome),
        log_line("192.0.2.1", "/img/logo.png", chrome),
    );
    std::fs::write(temp.path().join("logs").join("a.log"), content).unwrap();

    let endpoint = format!("{}/json", mock_server.uri());
    let config =
        load_config(&write_config(temp.path(), &endpoint, SchemaVariant::Staged)).unwrap();

    let stats = run_pipeline(config).await.unwrap();
    assert_eq!(stats.facts, 3);
    assert_eq!(stats.geolocation.cache_hits, 1);

    let staging = temp.path().join("out").join("staging");
    for table in [
        "browsers",
        "operating_systems",
        "file_types",
        "dates",
        "ips",
        "geolocations",
        "crawler_data",
        "facts",
    ] {
        assert!(
            staging.join(format!("{}.csv", table)).is_file(),
            "missing {}.csv",
            table
        );
    }
    assert!(!temp.path().join("out").join("facts.csv").exists());

    let (_, file_types) = read_csv(&staging.join("file_types.csv"));
    assert_eq!(
        file_types,
        vec![vec!["1", "css"], vec!["2", "None"], vec!["3", "png"]]
    );

    let (_, ips) = read_csv(&staging.join("ips.csv"));
    assert_eq!(ips, vec![vec!["1", "192.0.2.1"], vec!["2", "192.0.2.2"]]);

    let (header, facts) = read_csv(&staging.join("facts.csv"));
    let ip_id = column(&header, "ip_id");
    let date_id = column(&header, "date_id");
    let ids: Vec<_> = facts.iter().map(|row| row[ip_id].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "1"]);
    assert!(facts.iter().all(|row| row[date_id] == "1"));
}

#[tokio::test]
async fn test_missing_input_dir_is_fatal_without_output() {
    let temp = TempDir::new().unwrap();
    let config = load_config(&write_config(
        temp.path(),
        "http://127.0.0.1:9/json",
        SchemaVariant::Combined,
    ))
    .unwrap();

    let result = run_pipeline(config).await;

    assert!(matches!(result, Err(PipelineError::InputDir { .. })));
    assert!(!temp.path().join("out").exists());
}

#[tokio::test]
async fn test_empty_input_creates_output_dir_with_empty_tables() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("logs")).unwrap();
    let config = load_config(&write_config(
        temp.path(),
        "http://127.0.0.1:9/json",
        SchemaVariant::Combined,
    ))
    .unwrap();

    let stats = run_pipeline(config).await.unwrap();

    assert_eq!(stats.files_processed, 0);
    let (header, rows) = read_csv(&temp.path().join("out").join("facts.csv"));
    assert_eq!(header.len(), 20);
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_unreachable_service_yields_unknown_location() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("logs")).unwrap();
    std::fs::write(
        temp.path().join("logs").join("a.log"),
        log_line("192.0.2.50", "/index.html", "curl/8.0"),
    )
    .unwrap();
    let config = load_config(&write_config(
        temp.path(),
        "http://127.0.0.1:9/json",
        SchemaVariant::Combined,
    ))
    .unwrap();

    let stats = run_pipeline(config).await.unwrap();

    assert_eq!(stats.facts, 1);
    assert_eq!(stats.geolocation.attempts, 3);
    assert_eq!(stats.geolocation.exhausted, 1);

    let (header, facts) = read_csv(&temp.path().join("out").join("facts.csv"));
    for name in ["postcode", "city", "state", "country"] {
        assert_eq!(facts[0][column(&header, name)], "Unknown");
    }
}

#[tokio::test]
async fn test_client_maps_response_fields() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "country": "United States",
            "regionName": "Virginia",
            "city": "Ashburn",
            "zip": "20149",
            "query": "8.8.8.8"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = IpApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/json/", mock_server.uri()),
    );
    let geolocation = client.lookup("8.8.8.8").await.unwrap();

    assert_eq!(
        geolocation,
        Geolocation {
            postcode: "20149".to_string(),
            city: "Ashburn".to_string(),
            state: "Virginia".to_string(),
            country: "United States".to_string(),
        }
    );
}

#[tokio::test]
async fn test_client_fills_missing_fields_with_unknown() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/10.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "private range",
            "query": "10.0.0.1"
        })))
        .mount(&mock_server)
        .await;

    let client = IpApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/json", mock_server.uri()),
    );
    let geolocation = client.lookup("10.0.0.1").await.unwrap();

    assert!(geolocation.is_unknown());
}

#[tokio::test]
async fn test_client_reports_rate_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = IpApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/json", mock_server.uri()),
    );

    assert!(matches!(
        client.lookup("1.2.3.4").await,
        Err(LookupError::RateLimited)
    ));
}

#[tokio::test]
async fn test_rate_limited_lookup_is_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/203.0.113.77"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json/203.0.113.77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sydney()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("logs")).unwrap();
    std::fs::write(
        temp.path().join("logs").join("a.log"),
        log_line("203.0.113.77", "/index.html", "curl/8.0"),
    )
    .unwrap();
    let endpoint = format!("{}/json", mock_server.uri());
    let config =
        load_config(&write_config(temp.path(), &endpoint, SchemaVariant::Combined)).unwrap();

    let stats = run_pipeline(config).await.unwrap();

    assert_eq!(stats.geolocation.attempts, 2);
    assert_eq!(stats.geolocation.resolved, 1);

    let (header, facts) = read_csv(&temp.path().join("out").join("facts.csv"));
    assert_eq!(facts[0][column(&header, "country")], "Australia");
}
