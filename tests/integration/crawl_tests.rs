//! Integration tests for the crawler
//!
//! These tests load a real configuration file, replay saved page snapshots
//! and use wiremock to stand in for the image CDN and captioning service.

use feed_sweep::config::load_config;
use feed_sweep::crawler::run_crawl;
use feed_sweep::{SweepError, Termination};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = r#"<div data-testid="UserName">
    <div><span><span>Ada Example</span></span></div>
    <div><span><span>@ada</span></span></div>
  </div>
  <div data-testid="UserDescription"><span>Engines &amp; notes.</span></div>"#;

fn post(text: &str, images: &[String]) -> String {
    let imgs: String = images
        .iter()
        .map(|src| format!(r#"<div data-testid="tweetPhoto"><img src="{}"></div>"#, src))
        .collect();
    format!(
        r#"<article data-testid="tweet"><div data-testid="tweetText">{}</div>{}</article>"#,
        text, imgs
    )
}

fn snapshot(header: bool, posts: &[String]) -> String {
    format!(
        "<html><body>{}<main>{}</main></body></html>",
        if header { HEADER } else { "" },
        posts.concat()
    )
}

/// Writes snapshots as 000.html, 001.html, ... into `dir`
fn write_snapshots(dir: &Path, snapshots: &[String]) {
    std::fs::create_dir_all(dir).unwrap();
    for (i, html) in snapshots.iter().enumerate() {
        std::fs::write(dir.join(format!("{:03}.html", i)), html).unwrap();
    }
}

/// Writes a replay-mode configuration and returns its path
fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let content = format!(
        r#"
[target]
username = "@ada"

[crawler]
scroll-delay-ms = 100
max-idle-scrolls = 3
page-load-timeout-ms = 1000
profile-settle-ms = 0

[session]
mode = "replay"
replay-dir = '{snapshots}'

[output]
document-path = '{document}'
{extra}
"#,
        snapshots = dir.join("snapshots").display(),
        document = dir.join("ada_data.json").display(),
        extra = extra,
    );

    let path = dir.join("sweep.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn read_document(dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("ada_data.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_full_crawl_from_config() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshots(
        &dir.path().join("snapshots"),
        &[
            snapshot(true, &[post("pinned", &[])]),
            snapshot(true, &[post("pinned", &[]), post("second", &[])]),
            snapshot(false, &[post("second", &[]), post("third", &[])]),
            snapshot(false, &[post("third", &[]), post("  ", &[])]),
        ],
    );
    let config_path = write_config(dir.path(), "");

    let config = load_config(&config_path).unwrap();
    let report = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.posts_collected, 3);
    // two productive cycles, then three idle ones
    assert_eq!(report.cycles, 5);
    assert_eq!(report.idle_cycles, 3);

    let document = read_document(dir.path());
    assert_eq!(document["profile"]["name"], "Ada Example");
    assert_eq!(document["profile"]["handle"], "@ada");
    assert_eq!(document["profile"]["bio"], "Engines & notes.");
    assert_eq!(document["profile"]["profileUrl"], "https://x.com/ada");

    let texts: Vec<_> = document["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["pinned", "second", "third"]);
}

#[tokio::test]
async fn test_crawl_with_image_enrichment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/sunset.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/caption"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "caption": "a sunset over the sea" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let images = vec![
        format!("{}/media/sunset.png", server.uri()),
        format!("{}/media/gone.jpg", server.uri()),
    ];
    write_snapshots(
        &dir.path().join("snapshots"),
        &[
            snapshot(true, &[]),
            snapshot(true, &[post("look at this", &images)]),
        ],
    );

    let image_dir = dir.path().join("images");
    let enrichment = format!(
        r#"
[enrichment]
image-dir = '{}'
caption-endpoint = "{}/caption"
max-concurrent-downloads = 2
"#,
        image_dir.display(),
        server.uri()
    );
    let config_path = write_config(dir.path(), &enrichment);

    let config = load_config(&config_path).unwrap();
    let report = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.images_found, 2);
    assert_eq!(report.images_downloaded, 1);
    assert_eq!(report.images_captioned, 1);

    let document = read_document(dir.path());
    let post = &document["posts"][0];
    assert_eq!(post["imageCount"], 2);

    let saved = image_dir.join("ada_post0_img0.png");
    assert_eq!(post["images"][0]["localPath"], saved.to_string_lossy().as_ref());
    assert_eq!(post["images"][0]["caption"], "a sunset over the sea");
    assert_eq!(std::fs::read(&saved).unwrap(), b"PNGDATA");

    // the failed download keeps only its URL
    assert_eq!(post["images"][1]["url"], images[1].as_str());
    assert!(post["images"][1].get("localPath").is_none());
    assert!(post["images"][1].get("caption").is_none());
}

#[tokio::test]
async fn test_page_load_timeout_writes_partial_document() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshots(
        &dir.path().join("snapshots"),
        &["<html><body><p>Log in to see more</p></body></html>".to_string()],
    );
    let config_path = write_config(dir.path(), "source-key = \"twitter\"");

    let config = load_config(&config_path).unwrap();
    let result = run_crawl(config, CancellationToken::new()).await;

    match result {
        Err(SweepError::PageLoadTimeout { url }) => assert_eq!(url, "https://x.com/ada"),
        other => panic!("expected a page load timeout, got {:?}", other.map(|r| r.termination)),
    }

    let document = read_document(dir.path());
    assert_eq!(
        document,
        serde_json::json!({
            "twitter": {
                "profile": {
                    "name": "",
                    "handle": "@ada",
                    "bio": "",
                    "profileUrl": "https://x.com/ada"
                },
                "posts": []
            }
        })
    );
}

#[tokio::test]
async fn test_missing_replay_dir_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), "");

    let config = load_config(&config_path).unwrap();
    let result = run_crawl(config, CancellationToken::new()).await;

    assert!(matches!(result, Err(SweepError::Session(_))));
    assert!(!dir.path().join("ada_data.json").exists());
}
