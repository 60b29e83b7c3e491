//! Playlist management.

use serde::{Deserialize, Serialize};

use crate::browsing::SONG_FIELDS;
use crate::client::{segment, Client};
use crate::error::{Error, Result};
use crate::params::keys;
use crate::types::{MediaItemType, Song};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    ids: &'a [String],
    user_id: &'a str,
    media_type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePlaylistResponse {
    #[serde(default)]
    id: Option<String>,
}

impl Client {
    /// Create a music playlist, optionally seeded with `track_ids`.
    ///
    /// Returns the new playlist's id when the server reports one.
    pub fn create_playlist(&self, name: &str, track_ids: &[String]) -> Result<Option<String>> {
        let body = CreatePlaylistBody {
            name,
            ids: track_ids,
            user_id: self.user_id()?,
            media_type: MediaItemType::Audio.as_str(),
        };
        let response = self
            .post("/Playlists", &self.default_params(), &body)
            .map_err(|e| e.context("create playlist"))?;

        // Older servers answer 204 with nothing to decode.
        let raw = response.body.into_bytes()?;
        if raw.is_empty() {
            return Ok(None);
        }
        let created: CreatePlaylistResponse = serde_json::from_slice(&raw)
            .map_err(|e| Error::Decode(e).context("create playlist"))?;
        Ok(created.id)
    }

    pub fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<Song>> {
        let mut params = self.default_params();
        params.set_include_fields(SONG_FIELDS);
        let path = format!("/Playlists/{}/Items", segment(playlist_id)?);
        self.fetch_page(&path, &params, "get playlist songs")
    }

    pub fn add_playlist_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let mut params = self.default_params();
        params.set_ids(keys::IDS, track_ids);
        let path = format!("/Playlists/{}/Items", segment(playlist_id)?);
        self.post(&path, &params, &serde_json::Map::new())
            .map_err(|e| e.context("add playlist tracks"))?;
        Ok(())
    }

    /// Remove entries by their playlist entry id (`Song::playlist_item_id`),
    /// not by song id.
    pub fn remove_playlist_tracks(&self, playlist_id: &str, entry_ids: &[String]) -> Result<()> {
        let mut params = self.default_params();
        params.set_ids(keys::ENTRY_IDS, entry_ids);
        let path = format!("/Playlists/{}/Items", segment(playlist_id)?);
        self.delete(&path, &params)
            .map_err(|e| e.context("remove playlist tracks"))?;
        Ok(())
    }

    pub fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let path = format!("/Items/{}", segment(playlist_id)?);
        self.delete(&path, &self.default_params())
            .map_err(|e| e.context("delete playlist"))?;
        Ok(())
    }
}
