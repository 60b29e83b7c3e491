//! In-memory stand-in for a Jellyfin server, seeded with a small jazz library.
//!
//! Only the routes the client core calls are served. One account exists
//! (`alice` / `secret`); every route except login, public info and the
//! stream URL wants the `X-Emby-Token` issued at login.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const USER_ID: &str = "u-alice";
pub const SERVER_ID: &str = "srv-mock";

const TOKEN_HEADER: &str = "X-Emby-Token";
const AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";

/// First bytes of a PNG file; enough for clients that sniff the format.
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nmock-image";
pub const AUDIO_BYTES: &[u8] = b"ID3mock-audio";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NameId {
    pub name: String,
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserData {
    pub play_count: u32,
    pub is_favorite: bool,
    pub played: bool,
}

/// One catalog entry. Songs, albums, artists, genres and playlists share the
/// shape; fields that do not apply stay empty and are left out of the JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artist_items: Vec<NameId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub album_artists: Vec<NameId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub production_year: i32,
    pub index_number: u32,
    pub run_time_ticks: i64,
    pub child_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_item_id: Option<String>,
    pub user_data: UserData,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Page {
    pub items: Vec<Item>,
    pub total_record_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackReport {
    pub item_id: String,
    pub position_ticks: i64,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub is_paused: Option<bool>,
}

#[derive(Clone, Debug)]
struct PlaylistEntry {
    entry_id: String,
    song_id: String,
}

/// Server state shared by every handler.
#[derive(Debug, Default)]
pub struct Library {
    tokens: HashSet<String>,
    views: Vec<Item>,
    items: Vec<Item>,
    playlists: HashMap<String, Vec<PlaylistEntry>>,
    reports: Vec<(String, PlaybackReport)>,
    refreshes: u32,
}

pub type Db = Arc<RwLock<Library>>;
type Params = HashMap<String, String>;

/// Plain-text error response, the way the real server words them.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }

    fn not_found() -> Self {
        Self(StatusCode::NOT_FOUND, String::new())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn artist(id: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        item_type: "MusicArtist".to_string(),
        ..Item::default()
    }
}

fn album(id: &str, name: &str, by: &Item, year: i32, genres: &[&str], tracks: u32) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        item_type: "MusicAlbum".to_string(),
        album_artists: vec![NameId { name: by.name.clone(), id: by.id.clone() }],
        genres: genres.iter().map(|g| g.to_string()).collect(),
        production_year: year,
        child_count: tracks,
        ..Item::default()
    }
}

fn song(id: &str, name: &str, on: &Item, index: u32, seconds: i64) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        item_type: "Audio".to_string(),
        media_type: Some("Audio".to_string()),
        album_id: Some(on.id.clone()),
        album: Some(on.name.clone()),
        artist_items: on.album_artists.clone(),
        production_year: on.production_year,
        index_number: index,
        run_time_ticks: seconds * 10_000_000,
        ..Item::default()
    }
}

fn named(id: &str, name: &str, item_type: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        item_type: item_type.to_string(),
        ..Item::default()
    }
}

fn playlist(id: &str, name: &str, media_type: &str, songs: u32) -> Item {
    Item {
        media_type: Some(media_type.to_string()),
        child_count: songs,
        ..named(id, name, "Playlist")
    }
}

impl Library {
    /// Two artists, two albums, three songs, two genres and three playlists,
    /// one of which holds video and is hidden from music listings.
    pub fn seeded() -> Self {
        let miles = artist("ar1", "Miles Davis");
        let trane = artist("ar2", "John Coltrane");
        let kind_of_blue = album("al1", "Kind of Blue", &miles, 1959, &["Jazz", "Modal"], 2);
        let blue_train = album("al2", "Blue Train", &trane, 1957, &["Jazz"], 1);

        let items = vec![
            song("s1", "So What", &kind_of_blue, 1, 562),
            song("s2", "Freddie Freeloader", &kind_of_blue, 2, 586),
            song("s3", "Blue Train", &blue_train, 1, 643),
            kind_of_blue,
            blue_train,
            miles,
            trane,
            named("g1", "Jazz", "MusicGenre"),
            named("g2", "Modal", "MusicGenre"),
            playlist("pl1", "Late night", "Audio", 1),
            playlist("pl2", "imported.m3u", "Unknown", 0),
            playlist("pl3", "Concert films", "Video", 0),
        ];

        let mut playlists = HashMap::new();
        playlists.insert(
            "pl1".to_string(),
            vec![PlaylistEntry { entry_id: "e1".to_string(), song_id: "s1".to_string() }],
        );
        playlists.insert("pl2".to_string(), Vec::new());
        playlists.insert("pl3".to_string(), Vec::new());

        Self {
            views: vec![Item {
                collection_type: Some("music".to_string()),
                ..named("v1", "Music", "CollectionFolder")
            }],
            items,
            playlists,
            ..Self::default()
        }
    }

    pub fn playback_reports(&self) -> &[(String, PlaybackReport)] {
        &self.reports
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    fn authorize(&self, headers: &HeaderMap) -> ApiResult<()> {
        let token = headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if self.tokens.contains(token) {
            Ok(())
        } else {
            warn!("rejected token {token:?}");
            Err(ApiError(StatusCode::UNAUTHORIZED, String::new()))
        }
    }

    fn check_user(&self, user_id: &str, params: &Params) -> ApiResult<()> {
        if user_id != USER_ID {
            return Err(ApiError::not_found());
        }
        match params.get("UserId") {
            Some(query_user) if query_user != user_id => {
                Err(ApiError::bad_request("user id mismatch"))
            }
            _ => Ok(()),
        }
    }

    fn find(&self, id: &str) -> ApiResult<&Item> {
        self.item(id).ok_or_else(ApiError::not_found)
    }

    fn find_mut(&mut self, id: &str) -> ApiResult<&mut Item> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(ApiError::not_found)
    }

    fn of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |item| item.item_type == item_type)
    }

    fn playlist_songs(&self, playlist_id: &str) -> ApiResult<Vec<Item>> {
        let entries = self.playlists.get(playlist_id).ok_or_else(ApiError::not_found)?;
        Ok(entries
            .iter()
            .filter_map(|entry| {
                self.item(&entry.song_id).map(|song| Item {
                    playlist_item_id: Some(entry.entry_id.clone()),
                    ..song.clone()
                })
            })
            .collect())
    }

    fn sync_child_count(&mut self, playlist_id: &str) {
        let count = self.playlists.get(playlist_id).map_or(0, Vec::len);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == playlist_id) {
            item.child_count = u32::try_from(count).unwrap_or(u32::MAX);
        }
    }
}

fn list(params: &Params, key: &str, sep: char) -> Option<Vec<String>> {
    params
        .get(key)
        .filter(|v| !v.is_empty())
        .map(|v| v.split(sep).map(str::to_string).collect())
}

/// Whether `item` passes the listing filters in `params`.
fn matches(item: &Item, params: &Params) -> bool {
    if let Some(types) = list(params, "IncludeItemTypes", ',') {
        if !types.contains(&item.item_type) {
            return false;
        }
    }
    if let Some(term) = params.get("SearchTerm") {
        if !item.name.to_lowercase().contains(&term.to_lowercase()) {
            return false;
        }
    }
    if let Some(parent) = params.get("ParentId") {
        if item.album_id.as_ref() != Some(parent) {
            return false;
        }
    }
    if let Some(artists) = list(params, "ArtistIds", ',') {
        let mut credited = item.artist_items.iter().chain(&item.album_artists);
        if !credited.any(|a| artists.contains(&a.id)) {
            return false;
        }
    }
    if let Some(genres) = list(params, "Genres", '|') {
        if !item.genres.iter().any(|g| genres.contains(g)) {
            return false;
        }
    }
    if let Some(years) = list(params, "Years", ',') {
        if !years.contains(&item.production_year.to_string()) {
            return false;
        }
    }
    for filter in list(params, "Filters", ',').unwrap_or_default() {
        let keep = match filter.as_str() {
            "IsFavorite" => item.user_data.is_favorite,
            "IsPlayed" => item.user_data.played,
            "IsUnPlayed" => !item.user_data.played,
            _ => true,
        };
        if !keep {
            return false;
        }
    }
    true
}

/// Apply `SortBy`/`SortOrder` and `StartIndex`/`Limit`.
fn page(mut items: Vec<Item>, params: &Params) -> Page {
    let sort_by = params.get("SortBy").map(String::as_str).unwrap_or_default();
    if sort_by.starts_with("SortName") {
        items.sort_by(|a, b| a.name.cmp(&b.name));
    } else if sort_by.starts_with("ProductionYear") {
        items.sort_by_key(|item| item.production_year);
    }
    if params.get("SortOrder").map(String::as_str) == Some("Descending") {
        items.reverse();
    }

    let total_record_count = items.len();
    let start = params.get("StartIndex").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit = params
        .get("Limit")
        .and_then(|v| v.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(usize::MAX);
    Page {
        items: items.into_iter().skip(start).take(limit).collect(),
        total_record_count,
    }
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Library::seeded())))
}

/// The router over caller-owned state, for tests that inspect it.
pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/Users/authenticatebyname", post(login))
        .route("/System/Info/Public", get(public_info))
        .route("/Users/{user_id}/Views", get(user_views))
        .route("/Users/{user_id}/Items", get(user_items))
        .route("/Users/{user_id}/Items/{item_id}", get(user_item))
        .route(
            "/Users/{user_id}/FavoriteItems/{item_id}",
            post(mark_favorite).delete(unmark_favorite),
        )
        .route("/Artists", get(artists))
        .route("/Artists/AlbumArtists", get(artists))
        .route("/MusicGenres", get(genres))
        .route("/Items/{id}", delete(delete_item))
        .route("/Items/{id}/Similar", get(similar))
        .route("/Items/{id}/Images/{image_type}", get(image))
        .route("/Artists/{id}/InstantMix", get(instant_mix))
        .route("/Albums/{id}/InstantMix", get(instant_mix))
        .route("/Songs/{id}/InstantMix", get(instant_mix))
        .route("/Items/{id}/InstantMix", get(instant_mix))
        .route("/Playlists", post(create_playlist))
        .route(
            "/Playlists/{id}/Items",
            get(playlist_items).post(add_to_playlist).delete(remove_from_playlist),
        )
        .route("/Sessions/Playing", post(report_start))
        .route("/Sessions/Playing/Progress", post(report_progress))
        .route("/Sessions/Playing/Stopped", post(report_stop))
        .route("/Library/Refresh", post(refresh))
        .route("/Audio/{id}/Lyrics", get(lyrics))
        .route("/audio/{id}/stream", get(stream))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "PW")]
    password: String,
}

async fn login(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let client = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !client.starts_with("MediaBrowser ") {
        return Err(ApiError::bad_request("missing client authorization"));
    }
    if body.username != USERNAME || body.password != PASSWORD {
        warn!(username = %body.username, "bad credentials");
        return Err(ApiError::bad_request("bad credentials"));
    }

    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    info!(username = %body.username, "issued token");
    Ok(Json(json!({
        "AccessToken": token,
        "ServerId": SERVER_ID,
        "User": { "Id": USER_ID, "Name": USERNAME },
    })))
}

async fn public_info() -> Json<serde_json::Value> {
    Json(json!({
        "LocalAddress": "http://127.0.0.1",
        "ServerName": "mock",
        "Version": "10.10.0",
        "ProductName": "Jellyfin Server",
        "OperatingSystem": "Linux",
        "Id": SERVER_ID,
    }))
}

async fn user_views(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    lib.check_user(&user_id, &params)?;
    Ok(Json(page(lib.views.clone(), &params)))
}

async fn user_items(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    lib.check_user(&user_id, &params)?;
    let found = lib.items.iter().filter(|item| matches(item, &params)).cloned().collect();
    debug!(?params, "user items");
    Ok(Json(page(found, &params)))
}

async fn user_item(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user_id, item_id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Item>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    lib.check_user(&user_id, &params)?;
    Ok(Json(lib.find(&item_id)?.clone()))
}

async fn set_favorite(
    db: Db,
    headers: HeaderMap,
    (user_id, item_id): (String, String),
    params: Params,
    favorite: bool,
) -> ApiResult<Json<UserData>> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    lib.check_user(&user_id, &params)?;
    let item = lib.find_mut(&item_id)?;
    item.user_data.is_favorite = favorite;
    Ok(Json(item.user_data.clone()))
}

async fn mark_favorite(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(ids): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<UserData>> {
    set_favorite(db, headers, ids, params, true).await
}

async fn unmark_favorite(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(ids): Path<(String, String)>,
    Query(params): Query<Params>,
) -> ApiResult<Json<UserData>> {
    set_favorite(db, headers, ids, params, false).await
}

async fn artists(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(mut params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    // Artist listings ignore the album type filter the client sends along.
    params.remove("IncludeItemTypes");
    let found = lib
        .of_type("MusicArtist")
        .filter(|item| matches(item, &params))
        .cloned()
        .collect();
    Ok(Json(page(found, &params)))
}

async fn genres(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(mut params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    let under: Option<Vec<String>> = match params.remove("ParentId") {
        Some(parent) => Some(lib.find(&parent)?.genres.clone()),
        None => None,
    };
    let found = lib
        .of_type("MusicGenre")
        .filter(|g| under.as_ref().map_or(true, |names| names.contains(&g.name)))
        .cloned()
        .collect();
    Ok(Json(page(found, &params)))
}

async fn similar(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    let seed = lib.find(&id)?;
    let found = lib
        .of_type(&seed.item_type)
        .filter(|item| item.id != id)
        .cloned()
        .collect();
    Ok(Json(page(found, &params)))
}

async fn instant_mix(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    let seed = lib.find(&id)?;
    let songs: Vec<Item> = match seed.item_type.as_str() {
        "Playlist" => lib.playlist_songs(&id)?,
        "MusicAlbum" => lib
            .of_type("Audio")
            .filter(|s| s.album_id.as_ref() == Some(&id))
            .cloned()
            .collect(),
        "Audio" => lib
            .of_type("Audio")
            .filter(|s| s.album_id == seed.album_id)
            .cloned()
            .collect(),
        "MusicArtist" => lib
            .of_type("Audio")
            .filter(|s| s.artist_items.iter().any(|a| a.id == id))
            .cloned()
            .collect(),
        _ => lib.of_type("Audio").cloned().collect(),
    };
    Ok(Json(page(songs, &params)))
}

async fn image(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, image_type)): Path<(String, String)>,
) -> ApiResult<Response> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    lib.find(&id)?;
    if image_type != "Primary" {
        return Err(ApiError::not_found());
    }
    Ok(([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES).into_response())
}

async fn lyrics(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    let song = lib.find(&id)?;
    if song.id != "s1" {
        return Err(ApiError::not_found());
    }
    Ok(Json(json!({
        "Metadata": { "Title": song.name, "Artist": "Miles Davis", "IsSynced": true },
        "Lyrics": [
            { "Text": "(trumpet)", "Start": 0 },
            { "Text": "(piano)", "Start": 900_000_000 },
        ],
    })))
}

/// Streams authorize through the `api_key` query parameter so external
/// players can use the URL as is.
async fn stream(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let lib = db.read().await;
    let key = params.get("api_key").map(String::as_str).unwrap_or_default();
    if !lib.tokens.contains(key) {
        return Err(ApiError(StatusCode::UNAUTHORIZED, String::new()));
    }
    lib.find(&id)?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], AUDIO_BYTES).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePlaylist {
    name: String,
    #[serde(default)]
    ids: Vec<String>,
    user_id: String,
    #[serde(default)]
    media_type: Option<String>,
}

async fn create_playlist(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<CreatePlaylist>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    if body.user_id != USER_ID {
        return Err(ApiError::bad_request("unknown user"));
    }
    if let Some(missing) = body.ids.iter().find(|id| lib.item(id).is_none()) {
        return Err(ApiError::bad_request(format!("unknown item {missing}")));
    }

    let id = Uuid::new_v4().simple().to_string();
    let entries = body
        .ids
        .into_iter()
        .map(|song_id| PlaylistEntry { entry_id: Uuid::new_v4().simple().to_string(), song_id })
        .collect();
    let media_type = body.media_type.unwrap_or_else(|| "Audio".to_string());
    lib.items.push(playlist(&id, &body.name, &media_type, 0));
    lib.playlists.insert(id.clone(), entries);
    lib.sync_child_count(&id);
    info!(playlist = %id, name = %body.name, "created playlist");
    Ok(Json(json!({ "Id": id })))
}

async fn playlist_items(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Page>> {
    let lib = db.read().await;
    lib.authorize(&headers)?;
    Ok(Json(page(lib.playlist_songs(&id)?, &params)))
}

async fn add_to_playlist(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<StatusCode> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    let ids = list(&params, "Ids", ',').unwrap_or_default();
    if let Some(missing) = ids.iter().find(|song| lib.item(song).is_none()) {
        return Err(ApiError::bad_request(format!("unknown item {missing}")));
    }
    let entries = lib.playlists.get_mut(&id).ok_or_else(ApiError::not_found)?;
    entries.extend(ids.into_iter().map(|song_id| PlaylistEntry {
        entry_id: Uuid::new_v4().simple().to_string(),
        song_id,
    }));
    lib.sync_child_count(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_from_playlist(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<StatusCode> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    let gone = list(&params, "EntryIds", ',').unwrap_or_default();
    let entries = lib.playlists.get_mut(&id).ok_or_else(ApiError::not_found)?;
    entries.retain(|entry| !gone.contains(&entry.entry_id));
    lib.sync_child_count(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Only playlists can be deleted; library items are read-only.
async fn delete_item(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    if lib.find(&id)?.item_type != "Playlist" {
        return Err(ApiError(StatusCode::FORBIDDEN, "item cannot be deleted".to_string()));
    }
    lib.items.retain(|item| item.id != id);
    lib.playlists.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn record(
    db: Db,
    headers: HeaderMap,
    path: &str,
    report: PlaybackReport,
) -> ApiResult<StatusCode> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    lib.find(&report.item_id)?;
    debug!(path, item = %report.item_id, "playback report");
    lib.reports.push((path.to_string(), report));
    Ok(StatusCode::NO_CONTENT)
}

async fn report_start(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(report): Json<PlaybackReport>,
) -> ApiResult<StatusCode> {
    record(db, headers, "/Sessions/Playing", report).await
}

async fn report_progress(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(report): Json<PlaybackReport>,
) -> ApiResult<StatusCode> {
    record(db, headers, "/Sessions/Playing/Progress", report).await
}

/// A stop counts as one play.
async fn report_stop(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(report): Json<PlaybackReport>,
) -> ApiResult<StatusCode> {
    let item_id = report.item_id.clone();
    let status = record(db.clone(), headers, "/Sessions/Playing/Stopped", report).await?;
    let mut lib = db.write().await;
    let item = lib.find_mut(&item_id)?;
    item.user_data.play_count += 1;
    item.user_data.played = true;
    Ok(status)
}

async fn refresh(State(db): State<Db>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let mut lib = db.write().await;
    lib.authorize(&headers)?;
    lib.refreshes += 1;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn item_omits_empty_fields() {
        let lib = Library::seeded();
        let json = serde_json::to_value(lib.item("ar1").unwrap()).unwrap();
        assert_eq!(json["Type"], "MusicArtist");
        assert!(json.get("AlbumId").is_none());
        assert!(json.get("ArtistItems").is_none());
        assert_eq!(json["UserData"]["IsFavorite"], false);
    }

    #[test]
    fn song_carries_album_credits() {
        let lib = Library::seeded();
        let json = serde_json::to_value(lib.item("s3").unwrap()).unwrap();
        assert_eq!(json["AlbumId"], "al2");
        assert_eq!(json["ArtistItems"][0]["Name"], "John Coltrane");
        assert_eq!(json["ProductionYear"], 1957);
    }

    #[test]
    fn filters_combine() {
        let lib = Library::seeded();
        let hits: Vec<&str> = lib
            .items
            .iter()
            .filter(|i| matches(i, &params(&[("IncludeItemTypes", "Audio"), ("ParentId", "al1")])))
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(hits, ["s1", "s2"]);

        let years = params(&[("IncludeItemTypes", "MusicAlbum"), ("Years", "1957,1958")]);
        let hits: Vec<&str> = lib.items.iter().filter(|i| matches(i, &years)).map(|i| i.id.as_str()).collect();
        assert_eq!(hits, ["al2"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let lib = Library::seeded();
        let p = params(&[("SearchTerm", "BLUE"), ("IncludeItemTypes", "MusicAlbum")]);
        let hits: Vec<&str> = lib.items.iter().filter(|i| matches(i, &p)).map(|i| i.id.as_str()).collect();
        assert_eq!(hits, ["al2"]);
    }

    #[test]
    fn page_sorts_then_slices() {
        let lib = Library::seeded();
        let songs: Vec<Item> = lib.of_type("Audio").cloned().collect();
        let p = params(&[("SortBy", "SortName"), ("SortOrder", "Descending"), ("StartIndex", "1"), ("Limit", "1")]);
        let result = page(songs, &p);
        assert_eq!(result.total_record_count, 3);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Freddie Freeloader");
    }

    #[test]
    fn user_mismatch_is_rejected() {
        let lib = Library::seeded();
        assert!(lib.check_user(USER_ID, &params(&[("UserId", USER_ID)])).is_ok());
        let err = lib.check_user(USER_ID, &params(&[("UserId", "someone")])).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        let err = lib.check_user("someone", &Params::new()).unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn playlist_songs_carry_entry_ids() {
        let lib = Library::seeded();
        let songs = lib.playlist_songs("pl1").unwrap();
        assert_eq!(songs[0].id, "s1");
        assert_eq!(songs[0].playlist_item_id.as_deref(), Some("e1"));
        assert!(lib.playlist_songs("nope").is_err());
    }
}
