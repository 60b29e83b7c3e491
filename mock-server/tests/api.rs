use std::sync::Arc;

use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Db, Library, Page, IMAGE_BYTES, USER_ID};
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

const CLIENT_AUTH: &str =
    r#"MediaBrowser Client="test", Device="host", DeviceId="abc", Version="1""#;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn login_request(username: &str, password: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/Users/authenticatebyname")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-Emby-Authorization", CLIENT_AUTH)
        .body(format!(r#"{{"Username":"{username}","PW":"{password}"}}"#))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<String> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Emby-Token", token);
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .unwrap(),
        None => builder.body(String::new()).unwrap(),
    }
}

async fn login(app: &Router) -> String {
    let resp = app.clone().oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    body["AccessToken"].as_str().unwrap().to_string()
}

fn shared() -> (Db, Router) {
    let db: Db = Arc::new(RwLock::new(Library::seeded()));
    (db.clone(), app_with(db))
}

// --- login ---

#[tokio::test]
async fn login_issues_token() {
    let resp = app().oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["User"]["Id"], USER_ID);
    assert_eq!(body["AccessToken"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn login_with_bad_password_returns_400() {
    let resp = app().oneshot(login_request("alice", "nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, "bad credentials");
}

#[tokio::test]
async fn login_without_client_header_returns_400() {
    let req = Request::builder()
        .method("POST")
        .uri("/Users/authenticatebyname")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(r#"{"Username":"alice","PW":"secret"}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_info_needs_no_token() {
    let req = Request::builder()
        .uri("/System/Info/Public")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["ProductName"], "Jellyfin Server");
}

// --- auth ---

#[tokio::test]
async fn missing_or_stale_token_returns_401() {
    let app = app();
    let req = Request::builder()
        .uri("/Users/u-alice/Views")
        .body(String::new())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(authed("GET", "/Users/u-alice/Views", "stale", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- items ---

#[tokio::test]
async fn user_items_filter_by_type_and_term() {
    let app = app();
    let token = login(&app).await;
    let uri = "/Users/u-alice/Items?IncludeItemTypes=Audio&SearchTerm=so%20what&UserId=u-alice";
    let resp = app.oneshot(authed("GET", uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page = body_json(resp).await;
    assert_eq!(page.total_record_count, 1);
    assert_eq!(page.items[0].id, "s1");
}

#[tokio::test]
async fn user_id_mismatch_returns_400() {
    let app = app();
    let token = login(&app).await;
    let uri = "/Users/u-alice/Items?UserId=someone-else";
    let resp = app.oneshot(authed("GET", uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_item_returns_404() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(authed("GET", "/Users/u-alice/Items/nope", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn genres_under_album() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(authed("GET", "/MusicGenres?ParentId=al2", &token, None))
        .await
        .unwrap();
    let page: Page = body_json(resp).await;
    let names: Vec<&str> = page.items.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["Jazz"]);
}

#[tokio::test]
async fn image_is_png() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(authed("GET", "/Items/al1/Images/Primary?width=300", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(resp).await, IMAGE_BYTES);
}

#[tokio::test]
async fn stream_authorizes_by_api_key() {
    let app = app();
    let token = login(&app).await;
    let req = Request::builder()
        .uri(format!("/audio/s1/stream?static=true&api_key={token}"))
        .body(String::new())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/audio/s1/stream?static=true&api_key=wrong")
        .body(String::new())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- playlists ---

#[tokio::test]
async fn playlist_lifecycle() {
    let app = app();
    let token = login(&app).await;

    let body = r#"{"Name":"Road trip","Ids":["s2"],"UserId":"u-alice","MediaType":"Audio"}"#;
    let resp = app
        .clone()
        .oneshot(authed("POST", "/Playlists", &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = body_json(resp).await;
    let id = created["Id"].as_str().unwrap().to_string();

    let uri = format!("/Playlists/{id}/Items?Ids=s3");
    let resp = app.clone().oneshot(authed("POST", &uri, &token, Some("{}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let uri = format!("/Playlists/{id}/Items");
    let resp = app.clone().oneshot(authed("GET", &uri, &token, None)).await.unwrap();
    let page: Page = body_json(resp).await;
    let songs: Vec<&str> = page.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(songs, ["s2", "s3"]);
    let first_entry = page.items[0].playlist_item_id.clone().unwrap();

    let uri = format!("/Playlists/{id}/Items?EntryIds={first_entry}");
    let resp = app.clone().oneshot(authed("DELETE", &uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let uri = format!("/Users/u-alice/Items/{id}");
    let resp = app.clone().oneshot(authed("GET", &uri, &token, None)).await.unwrap();
    let playlist: Value = body_json(resp).await;
    assert_eq!(playlist["ChildCount"], 1);

    let uri = format!("/Items/{id}");
    let resp = app.clone().oneshot(authed("DELETE", &uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let uri = format!("/Playlists/{id}/Items");
    let resp = app.oneshot(authed("GET", &uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_song_is_forbidden() {
    let app = app();
    let token = login(&app).await;
    let resp = app.oneshot(authed("DELETE", "/Items/s1", &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_playlist_with_unknown_song_returns_400() {
    let app = app();
    let token = login(&app).await;
    let body = r#"{"Name":"Bad","Ids":["nope"],"UserId":"u-alice"}"#;
    let resp = app.oneshot(authed("POST", "/Playlists", &token, Some(body))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- user data and playback ---

#[tokio::test]
async fn favorite_toggles() {
    let (db, app) = shared();
    let token = login(&app).await;
    let uri = "/Users/u-alice/FavoriteItems/al1";

    let resp = app.clone().oneshot(authed("POST", uri, &token, Some("{}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(db.read().await.item("al1").unwrap().user_data.is_favorite);

    let resp = app.oneshot(authed("DELETE", uri, &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!db.read().await.item("al1").unwrap().user_data.is_favorite);
}

#[tokio::test]
async fn playback_reports_are_recorded() {
    let (db, app) = shared();
    let token = login(&app).await;

    let start = r#"{"ItemId":"s1","PositionTicks":0}"#;
    let resp = app
        .clone()
        .oneshot(authed("POST", "/Sessions/Playing", &token, Some(start)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let stop = r#"{"ItemId":"s1","PositionTicks":10,"IsPaused":true}"#;
    let resp = app
        .oneshot(authed("POST", "/Sessions/Playing/Stopped", &token, Some(stop)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let lib = db.read().await;
    let paths: Vec<&str> = lib.playback_reports().iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, ["/Sessions/Playing", "/Sessions/Playing/Stopped"]);
    assert_eq!(lib.item("s1").unwrap().user_data.play_count, 1);
}

#[tokio::test]
async fn library_refresh_returns_204() {
    let (db, app) = shared();
    let token = login(&app).await;
    let resp = app
        .oneshot(authed("POST", "/Library/Refresh", &token, Some("{}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(db.read().await.refreshes(), 1);
}
