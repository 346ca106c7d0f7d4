//! End-to-end tests of the streamstats commands.

use clap::Parser;
use std::path::{Path, PathBuf};
use streamstats_cli::{App, Cli, CliError};
use streamstats_common::test_utils::{history_fixtures, init_test_logging};
use streamstats_config::Config;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn app(config: Config, args: &[&str]) -> (App, Cli) {
    let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
    let app = App::new(config, &cli, CancellationToken::new()).unwrap();
    (app, cli)
}

async fn run(config: Config, args: &[&str]) -> Result<String, CliError> {
    init_test_logging();
    let (app, cli) = app(config, args);
    let mut out = Vec::new();
    app.run(&cli.command, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_import_prints_statuses_and_summary() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "history.csv", &history_fixtures::two_play_csv());
    let empty = write_file(dir.path(), "empty.json", &history_fixtures::empty_history_json());

    let text = run(
        Config::default(),
        &["streamstats", "import", csv.to_str().unwrap(), empty.to_str().unwrap()],
    )
    .await
    .unwrap();

    assert!(text.contains("history.csv: 2 records"));
    assert!(text.contains("empty.json: Error: No valid listening records found"));
    assert!(text.contains("Total streams: 2"));
    assert!(text.contains("Minutes listened: 5"));
    assert!(!text.contains("plays match the filters"));
}

#[tokio::test]
async fn test_import_json_output_with_filter() {
    let dir = TempDir::new().unwrap();
    let json = write_file(
        dir.path(),
        "endsong_0.json",
        &history_fixtures::two_play_extended_json(),
    );

    let output = run(
        Config::default(),
        &[
            "streamstats",
            "import",
            json.to_str().unwrap(),
            "--track",
            "trackb",
            "--format",
            "json",
        ],
    )
    .await
    .unwrap();

    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["files"][0]["name"], "endsong_0.json");
    assert_eq!(report["files"][0]["status"], "success");
    assert_eq!(report["files"][0]["recordCount"], 2);
    assert_eq!(report["filter"]["matching"], 1);
    assert_eq!(report["filter"]["total"], 2);
    assert_eq!(report["summary"]["totalStreams"], 1);
    assert_eq!(report["summary"]["topTracks"][0]["name"], "TrackB");
}

#[tokio::test]
async fn test_import_commits_to_session_store() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "history.csv", &history_fixtures::two_play_csv());
    let (app, cli) = app(
        Config::default(),
        &["streamstats", "import", csv.to_str().unwrap(), "--parallelism", "2"],
    );
    assert_eq!(app.config().import.parallelism, 2);

    let mut out = Vec::new();
    app.run(&cli.command, &mut out).await.unwrap();

    let store = app.store();
    assert_eq!(store.revision(), 1);
    assert_eq!(store.working_dataset().len(), 2);
    assert_eq!(store.summary().unwrap().total_streams, 2);
}

#[tokio::test]
async fn test_import_without_valid_data_fails() {
    let dir = TempDir::new().unwrap();
    let empty = write_file(dir.path(), "empty.json", &history_fixtures::empty_history_json());
    let missing = dir.path().join("missing.json");

    let (app, cli) = app(
        Config::default(),
        &[
            "streamstats",
            "import",
            empty.to_str().unwrap(),
            missing.to_str().unwrap(),
        ],
    );
    let mut out = Vec::new();
    let result = app.run(&cli.command, &mut out).await;

    assert!(matches!(result, Err(CliError::NoData)));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("empty.json: Error: No valid listening records found"));
    assert!(text.contains("missing.json: Error:"));
    assert_eq!(app.store().revision(), 0);
    assert!(app.store().summary().is_none());
}

#[tokio::test]
async fn test_import_rejects_unsupported_selection() {
    let dir = TempDir::new().unwrap();
    let notes = write_file(dir.path(), "notes.txt", "hello");

    let result = run(
        Config::default(),
        &["streamstats", "import", notes.to_str().unwrap()],
    )
    .await;
    assert!(matches!(result, Err(CliError::Import(_))));
}

#[tokio::test]
async fn test_locale_override() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "history.csv", &history_fixtures::two_play_csv());

    let text = run(
        Config::default(),
        &["streamstats", "--locale", "fr-FR", "import", csv.to_str().unwrap()],
    )
    .await
    .unwrap();
    assert!(text.contains("history.csv: 2 écoutes"));
}

#[tokio::test]
async fn test_artwork_resolves_through_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("type", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "artists": {"items": [{
                "name": "Air",
                "images": [{"url": "https://i.scdn.co/air-300", "height": 300, "width": 300}]
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.spotify.api_base_url = format!("{}/v1", server.uri());
    config.spotify.access_token = Some("secret".to_string());

    let text = run(config, &["streamstats", "artwork", "--artist", "Air"])
        .await
        .unwrap();
    assert_eq!(text.trim(), "Image: https://i.scdn.co/air-300");
}

#[tokio::test]
async fn test_artwork_remote_failure_prints_no_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.spotify.api_base_url = format!("{}/v1", server.uri());
    config.spotify.access_token = Some("secret".to_string());

    let text = run(
        config,
        &["streamstats", "artwork", "--artist", "Air", "--track", "Sexy Boy"],
    )
    .await
    .unwrap();
    assert_eq!(text.trim(), "No image found");
}

#[tokio::test]
async fn test_artwork_requires_token() {
    let result = run(Config::default(), &["streamstats", "artwork", "--artist", "Air"]).await;
    assert!(matches!(result, Err(CliError::Stats(_))));
}

#[tokio::test]
async fn test_config_show_redacts_token() {
    let mut config = Config::default();
    config.spotify.access_token = Some("very-secret".to_string());

    let yaml = run(config, &["streamstats", "--timezone", "Europe/Paris", "config"])
        .await
        .unwrap();
    assert!(!yaml.contains("very-secret"));
    assert!(yaml.contains("***"));
    assert!(yaml.contains("Europe/Paris"));
}

#[test]
fn test_invalid_timezone_override_is_rejected() {
    let cli = Cli::try_parse_from(["streamstats", "--timezone", "Mars/Olympus", "config"]).unwrap();
    assert!(App::new(Config::default(), &cli, CancellationToken::new()).is_err());
}
