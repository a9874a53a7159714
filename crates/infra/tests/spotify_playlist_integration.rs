//! End-to-end flow: log in, handle the redirect, search, and save a track to
//! the playlist, against mocked Spotify endpoints and a file-backed store.

use std::sync::Arc;

use minihome_common::auth::AuthState;
use minihome_common::storage::{FileStore, KeyValueStore};
use minihome_common::testing::RecordingRedirector;
use minihome_domain::{MiniHomeError, NewSong, SpotifyConfig};
use minihome_infra::{PlaylistStore, SpotifyService};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("minihome_infra=debug,minihome_common=debug")
        .with_test_writer()
        .try_init();
}

fn spotify_config(server: &MockServer) -> SpotifyConfig {
    SpotifyConfig {
        client_id: "blog-client".to_string(),
        authorize_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/api/token", server.uri()),
        search_url: format!("{}/v1/search", server.uri()),
        ..SpotifyConfig::default()
    }
}

fn search_body() -> serde_json::Value {
    json!({
        "tracks": {
            "items": [{
                "id": "3r8RuvgbX9s7ammBn07D3W",
                "name": "Ditto",
                "artists": [{ "name": "NewJeans" }],
                "album": {
                    "name": "OMG",
                    "images": [{ "url": "https://i.scdn.co/image/ditto", "width": 640, "height": 640 }]
                },
                "duration_ms": 185_506,
                "preview_url": null
            }]
        }
    })
}

#[tokio::test]
async fn login_search_and_save_track() {
    init_tracing();
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(FileStore::open(dir.path().join("store.json")).expect("file store"));
    let redirector = Arc::new(RecordingRedirector::new());

    let service =
        SpotifyService::from_config(&spotify_config(&server), Arc::clone(&store), redirector.clone());

    // Login redirects to the authorize endpoint and stores the verifier
    service.login().expect("login");
    let authorize = redirector.last_url().expect("redirected");
    assert!(authorize.starts_with(&format!("{}/authorize?", server.uri())));
    assert!(authorize.contains("client_id=blog-client"));
    assert_eq!(service.status().unwrap(), AuthState::PendingExchange);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "live-access",
            "refresh_token": "live-refresh",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let redirect =
        Url::parse("https://localhost:5173/callback?code=auth-code-1&state=xyz").unwrap();
    let outcome = service.handle_callback(&redirect).await.expect("callback");
    assert_eq!(outcome.cleaned_url.as_str(), "https://localhost:5173/callback");
    assert_eq!(service.status().unwrap(), AuthState::Authenticated);

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "ditto newjeans"))
        .and(query_param("type", "track"))
        .and(query_param("limit", "20"))
        .and(header("authorization", "Bearer live-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = service.search("ditto newjeans").await.expect("search");
    assert_eq!(tracks.len(), 1);

    let playlist = PlaylistStore::new(Arc::clone(&store));
    let saved = playlist.add(NewSong::from(&tracks[0])).expect("add");

    assert_eq!(saved.title, "Ditto");
    assert_eq!(saved.artist, "NewJeans");
    assert_eq!(saved.duration.as_deref(), Some("3:05"));
    assert_eq!(saved.cover_image.as_deref(), Some("https://i.scdn.co/image/ditto"));
    assert_eq!(saved.spotify_id.as_deref(), Some("3r8RuvgbX9s7ammBn07D3W"));

    // Reopening the file sees both the session and the playlist
    let reopened = Arc::new(FileStore::open(store.path()).expect("reopen"));
    assert_eq!(reopened.get("spotify_access_token").unwrap().as_deref(), Some("live-access"));
    assert_eq!(PlaylistStore::new(Arc::clone(&reopened)).songs().unwrap(), vec![saved]);

    // Logout leaves the playlist alone
    service.logout().expect("logout");
    assert_eq!(service.status().unwrap(), AuthState::Unauthenticated);
    assert_eq!(PlaylistStore::new(store).songs().unwrap().len(), 1);
}

#[tokio::test]
async fn search_without_session_is_not_authenticated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(FileStore::open(dir.path().join("store.json")).expect("file store"));

    let service = SpotifyService::from_config(
        &spotify_config(&server),
        store,
        Arc::new(RecordingRedirector::new()),
    );

    let err = service.search("anything").await.unwrap_err();
    assert!(matches!(err, MiniHomeError::NotAuthenticated(_)));
}

#[tokio::test]
async fn denied_callback_keeps_session_pending() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(FileStore::open(dir.path().join("store.json")).expect("file store"));

    let service = SpotifyService::from_config(
        &spotify_config(&server),
        store,
        Arc::new(RecordingRedirector::new()),
    );
    service.login().expect("login");

    let redirect =
        Url::parse("https://localhost:5173/callback?error=access_denied").unwrap();
    let err = service.handle_callback(&redirect).await.unwrap_err();

    assert!(matches!(err, MiniHomeError::Auth(_)));
    assert_eq!(service.status().unwrap(), AuthState::PendingExchange);
}
