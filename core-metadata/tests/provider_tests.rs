//! Integration tests for the MusicBrainz, iTunes and YouTube providers against
//! a mocked HTTP client.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use core_library::{PreviewState, SongDescriptor};
use core_metadata::{
    CatalogFetcher, FetchProgress, ITunesClient, MetadataError, MusicBrainzClient,
    PreviewResolver, ProgressCallback, VideoResolver, YouTubeClient,
};
use core_runtime::config::MetadataApiConfig;
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn execute_with_retry(
            &self,
            request: HttpRequest,
            policy: RetryPolicy,
        ) -> BridgeResult<HttpResponse>;
    }
}

const ARTIST_JSON: &str = r#"{"count": 1, "artists": [{"id": "gen-1", "name": "Genesis", "score": 100}]}"#;

const PAGE_ONE: &str = r#"{
    "release-count": 3,
    "release-offset": 0,
    "releases": [
        {
            "id": "rel-duke",
            "title": "Duke",
            "status": "Official",
            "date": "1980-03-28",
            "cover-art-archive": {"front": true},
            "release-group": {"primary-type": "Album", "secondary-types": [], "first-release-date": "1980-03-24"},
            "media": [{"tracks": [
                {"title": "Behind the Lines", "recording": {"title": "Behind the Lines"}},
                {"title": "Duchess", "recording": {"title": "Duchess"}},
                {"title": "Turn It On Again", "recording": {"title": "Turn It On Again"}}
            ]}]
        },
        {
            "id": "rel-live",
            "title": "Three Sides Live",
            "status": "Official",
            "date": "1982-06-01",
            "release-group": {"primary-type": "Album", "secondary-types": ["Live"]},
            "media": [{"tracks": [{"recording": {"title": "Abacab (Live)"}}]}]
        }
    ]
}"#;

const PAGE_TWO: &str = r#"{
    "release-count": 3,
    "release-offset": 2,
    "releases": [
        {
            "id": "rel-duke-remaster",
            "title": "Duke",
            "status": "Official",
            "date": "2007-04-02",
            "cover-art-archive": {"front": false},
            "release-group": {"primary-type": "Album", "first-release-date": "1980-03-24"},
            "media": [{"tracks": [
                {"recording": {"title": "Turn It On Again (2007 Remaster)"}},
                {"recording": {"title": "Duchess - 2007 Remastered Version"}},
                {"recording": {"title": "Misunderstanding"}}
            ]}]
        }
    ]
}"#;

const EMPTY_PAGE: &str = r#"{"release-count": 3, "release-offset": 3, "releases": []}"#;

fn config() -> MetadataApiConfig {
    MetadataApiConfig::default()
        .with_rate_limit_delay_ms(0)
        .with_retries(1, 0)
        .with_musicbrainz_base_url("https://mb.test/ws/2")
        .with_itunes_base_url("https://itunes.test")
        .with_youtube_base_url("https://yt.test/")
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string().into(),
    }
}

/// Mock that serves the artist search and the release pages by offset.
fn musicbrainz_mock(pages: HashMap<&'static str, HttpResponse>) -> MockHttpClient {
    let pages = Mutex::new(pages);
    let mut mock = MockHttpClient::new();
    mock.expect_execute_with_retry()
        .returning(move |request: HttpRequest, _policy| {
            assert_eq!(request.query_value("fmt"), Some("json"));
            assert!(request.headers.contains_key("User-Agent"));

            if request.url.ends_with("/artist") {
                assert_eq!(request.query_value("query"), Some("artist:\"Genesis\""));
                assert_eq!(request.query_value("limit"), Some("1"));
                return Ok(response(200, ARTIST_JSON));
            }

            assert!(request.url.ends_with("/release"));
            assert_eq!(request.query_value("artist"), Some("gen-1"));
            assert_eq!(request.query_value("type"), Some("album"));
            assert_eq!(request.query_value("inc"), Some("recordings release-groups"));
            let offset = request.query_value("offset").unwrap_or("0").to_string();
            let mut pages = pages.lock().unwrap();
            Ok(pages
                .remove(offset.as_str())
                .unwrap_or_else(|| response(200, EMPTY_PAGE)))
        });
    mock
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<FetchProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |p: FetchProgress| sink.lock().unwrap().push(p));
    (callback, seen)
}

fn rejects() -> Vec<String> {
    vec!["Live".to_string(), "Compilation".to_string()]
}

#[tokio::test]
async fn test_fetch_builds_deduplicated_catalog() {
    let mock = musicbrainz_mock(HashMap::from([
        ("0", response(200, PAGE_ONE)),
        ("2", response(200, PAGE_TWO)),
    ]));
    let client = MusicBrainzClient::new(Arc::new(mock), config());
    let (callback, seen) = recorder();

    let songs = client
        .fetch("Genesis", &rejects(), &CancellationToken::new(), Some(callback))
        .await
        .unwrap();

    assert_eq!(
        songs.titles().collect::<Vec<_>>(),
        vec!["Behind the Lines", "Duchess", "Turn It On Again", "Misunderstanding"]
    );
    let turn = songs.get("Turn It On Again").unwrap();
    assert_eq!(turn.album, "Duke (1980)");
    assert_eq!(turn.artist, "Genesis");
    assert_eq!(turn.score, 1200.0);
    assert_eq!(turn.matches, 0);
    assert_eq!(
        turn.cover_url.as_deref(),
        Some("http://coverartarchive.org/release/rel-duke/front-250")
    );
    assert!(songs.get("Misunderstanding").unwrap().cover_url.is_none());
    assert_eq!(songs.get("Duchess").unwrap().preview_url, PreviewState::Unknown);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().unwrap().message, "Searching Genesis...");
    let last = seen.last().unwrap();
    assert_eq!(
        last.message,
        "Processed 3 releases... (found 4 unique songs so far)"
    );
    assert_eq!(last.percent, Some(100));
}

#[tokio::test]
async fn test_fetch_keeps_partial_results_when_a_page_fails() {
    let mock = musicbrainz_mock(HashMap::from([
        ("0", response(200, PAGE_ONE)),
        ("2", response(500, "boom")),
    ]));
    let client = MusicBrainzClient::new(Arc::new(mock), config());

    let songs = client
        .fetch("Genesis", &rejects(), &CancellationToken::new(), None)
        .await
        .unwrap();
    assert_eq!(songs.len(), 3);
}

#[tokio::test]
async fn test_fetch_without_rejects_accepts_live_albums() {
    let mock = musicbrainz_mock(HashMap::from([("0", response(200, PAGE_ONE))]));
    let client = MusicBrainzClient::new(Arc::new(mock), config());

    let songs = client
        .fetch("Genesis", &[], &CancellationToken::new(), None)
        .await
        .unwrap();
    let abacab = songs.get("Abacab (Live)").unwrap();
    assert_eq!(abacab.album, "Three Sides Live (1982)");
}

#[tokio::test]
async fn test_fetch_unknown_artist_is_empty() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(200, r#"{"count": 0, "artists": []}"#)));
    let client = MusicBrainzClient::new(Arc::new(mock), config());

    let songs = client
        .fetch("Nobody", &[], &CancellationToken::new(), None)
        .await
        .unwrap();
    assert!(songs.is_empty());
}

#[tokio::test]
async fn test_fetch_network_failure_is_empty() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute_with_retry()
        .times(1)
        .returning(|_, _| Err(BridgeError::Timeout("artist search".to_string())));
    let client = MusicBrainzClient::new(Arc::new(mock), config());

    let songs = client
        .fetch("Genesis", &[], &CancellationToken::new(), None)
        .await
        .unwrap();
    assert!(songs.is_empty());
}

#[tokio::test]
async fn test_cancelled_fetch_returns_nothing() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute_with_retry().times(0);
    let client = MusicBrainzClient::new(Arc::new(mock), config());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = client.fetch("Genesis", &[], &cancel, None).await;
    assert!(matches!(result, Err(MetadataError::Cancelled)));
}

#[tokio::test]
async fn test_fetch_passes_retry_settings_to_the_client() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute_with_retry()
        .times(1)
        .returning(|_, policy: RetryPolicy| {
            assert_eq!(policy.max_attempts, 8);
            assert_eq!(policy.base_delay.as_millis(), 2000);
            assert!(policy.use_exponential_backoff);
            Ok(response(200, r#"{"artists": []}"#))
        });
    let config = MetadataApiConfig::default()
        .with_rate_limit_delay_ms(0)
        .with_musicbrainz_base_url("https://mb.test/ws/2");
    let client = MusicBrainzClient::new(Arc::new(mock), config);

    client
        .fetch("Genesis", &[], &CancellationToken::new(), None)
        .await
        .unwrap();
}

const ITUNES_JSON: &str = r#"{
    "resultCount": 2,
    "results": [
        {"artistName": "Genesis", "trackName": "Mama (Live)", "collectionName": "The Way We Walk",
         "previewUrl": "https://audio.test/live.m4a"},
        {"artistName": "Genesis", "trackName": "Mama", "collectionName": "Genesis",
         "previewUrl": "https://audio.test/mama.m4a"}
    ]
}"#;

fn mama() -> SongDescriptor {
    SongDescriptor {
        artist: "Genesis".to_string(),
        title: "Mama".to_string(),
        album: "Genesis (1983)".to_string(),
    }
}

#[tokio::test]
async fn test_itunes_resolves_album_match() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute().times(1).returning(|request: HttpRequest| {
        assert_eq!(request.url, "https://itunes.test/search");
        assert_eq!(request.query_value("term"), Some("Genesis Mama"));
        assert_eq!(request.query_value("media"), Some("music"));
        assert_eq!(request.query_value("entity"), Some("song"));
        assert_eq!(request.query_value("limit"), Some("5"));
        Ok(response(200, ITUNES_JSON))
    });
    let client = ITunesClient::new(Arc::new(mock), &config());

    assert_eq!(
        client.resolve(&mama()).await.as_deref(),
        Some("https://audio.test/mama.m4a")
    );
}

#[tokio::test]
async fn test_itunes_failures_resolve_to_none() {
    let mut mock = MockHttpClient::new();
    let mut calls = 0;
    mock.expect_execute().times(3).returning(move |_| {
        calls += 1;
        match calls {
            1 => Ok(response(503, "unavailable")),
            2 => Ok(response(200, "<html>")),
            _ => Err(BridgeError::OperationFailed("Connection failed".to_string())),
        }
    });
    let client = ITunesClient::new(Arc::new(mock), &config());

    assert!(client.resolve(&mama()).await.is_none());
    assert!(matches!(
        client.lookup(&mama()).await,
        Err(MetadataError::JsonParse(_))
    ));
    assert!(client.resolve(&mama()).await.is_none());
}

#[tokio::test]
async fn test_itunes_empty_preview_is_not_found() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute().times(1).returning(|_| {
        Ok(response(
            200,
            r#"{"resultCount": 1, "results": [{"artistName": "Genesis", "trackName": "Mama", "previewUrl": ""}]}"#,
        ))
    });
    let client = ITunesClient::new(Arc::new(mock), &config());

    let url = client.resolve(&mama()).await;
    assert_eq!(PreviewState::from_lookup(url), PreviewState::NotFound);
}

const RESULTS_PAGE: &str = r#"<html><script>var ytInitialData = {"contents":{"sectionListRenderer":{"contents":[
    {"itemSectionRenderer":{"contents":[
        {"shelfRenderer":{"title":"People also watched"}},
        {"videoRenderer":{"videoId":"Jx9sH7dJ0xA","title":{"runs":[{"text":"Genesis - Mama (Official Video)"}]}}},
        {"videoRenderer":{"videoId":"Q9d1u2v3w4x"}}
    ]}}
]}}};</script></html>"#;

#[tokio::test]
async fn test_youtube_returns_first_video_link() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute().times(1).returning(|request: HttpRequest| {
        assert_eq!(request.url, "https://yt.test/results");
        assert_eq!(request.query_value("search_query"), Some("Genesis Mama"));
        assert_eq!(request.timeout, Some(std::time::Duration::from_secs(20)));
        Ok(response(200, RESULTS_PAGE))
    });
    let client = YouTubeClient::new(Arc::new(mock), &config());

    assert_eq!(
        client.find_video(&mama()).await.as_deref(),
        Some("https://yt.test/watch?v=Jx9sH7dJ0xA")
    );
}

#[tokio::test]
async fn test_youtube_empty_results_is_none() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .times(1)
        .returning(|_| Ok(response(200, r#"<script>var ytInitialData = {"contents":{}};</script>"#)));
    let client = YouTubeClient::new(Arc::new(mock), &config());

    assert_eq!(client.lookup(&mama()).await.unwrap(), None);
}

#[tokio::test]
async fn test_youtube_failures_resolve_to_none() {
    let mut mock = MockHttpClient::new();
    let mut calls = 0;
    mock.expect_execute().times(3).returning(move |_| {
        calls += 1;
        match calls {
            1 => Ok(response(429, "Too Many Requests")),
            2 => Err(BridgeError::Timeout("youtube".to_string())),
            _ => Ok(HttpResponse::ok(vec![0xffu8, 0xfe, 0xfd])),
        }
    });
    let client = YouTubeClient::new(Arc::new(mock), &config());

    assert!(matches!(
        client.lookup(&mama()).await,
        Err(MetadataError::HttpError { status: 429, .. })
    ));
    assert!(client.find_video(&mama()).await.is_none());
    assert!(matches!(
        client.lookup(&mama()).await,
        Err(MetadataError::Bridge(_))
    ));
}
