//! Catalog models decoded from the media server.
//!
//! # Design
//! Models are flat structs mirroring the server's PascalCase JSON. Every
//! struct defaults missing fields, because the server omits anything that was
//! not requested through `Fields`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Catalog item kinds a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Artist,
    Album,
    Playlist,
    Song,
    Genre,
}

/// Item type names as the server spells them in `IncludeItemTypes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaItemType {
    Album,
    Artist,
    Audio,
    Unknown,
    Playlist,
    Genre,
}

impl MediaItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Album => "MusicAlbum",
            Self::Artist => "MusicArtist",
            Self::Audio => "Audio",
            Self::Unknown => "Unknown",
            Self::Playlist => "Playlist",
            Self::Genre => "Genre",
        }
    }
}

/// One page of an item listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage<T> {
    // A plain `default` would require `T: Default`.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_record_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BaseItem {
    pub name: String,
    pub id: String,
    pub collection_type: String,
    pub date_created: String,
    pub can_delete: bool,
    pub child_count: u32,
    pub user_data: Option<UserData>,
    #[serde(rename = "Type")]
    pub item_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserData {
    pub play_count: u32,
    pub is_favorite: bool,
    pub rating: Option<f64>,
    pub played: bool,
    pub last_played_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NameId {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Images {
    pub primary: String,
    pub disc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaSource {
    pub bitrate: u64,
    pub container: String,
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Song {
    pub name: String,
    pub id: String,
    pub playlist_item_id: String,
    pub run_time_ticks: i64,
    pub production_year: i32,
    pub date_created: String,
    pub index_number: u32,
    #[serde(rename = "Type")]
    pub item_type: String,
    pub album_id: String,
    pub album: String,
    #[serde(rename = "ParentIndexNumber")]
    pub disc_number: u32,
    #[serde(rename = "ArtistItems")]
    pub artists: Vec<NameId>,
    pub image_tags: Images,
    pub media_sources: Vec<MediaSource>,
    pub user_data: UserData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Artist {
    pub name: String,
    pub overview: String,
    pub id: String,
    pub run_time_ticks: i64,
    #[serde(rename = "Type")]
    pub item_type: String,
    pub album_count: u32,
    pub user_data: UserData,
    pub image_tags: Images,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Album {
    pub name: String,
    pub id: String,
    pub run_time_ticks: i64,
    #[serde(rename = "ProductionYear")]
    pub year: i32,
    pub date_created: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "AlbumArtists")]
    pub artists: Vec<NameId>,
    pub overview: String,
    pub genres: Vec<String>,
    pub child_count: u32,
    pub image_tags: Images,
    pub user_data: UserData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Playlist {
    pub name: String,
    pub id: String,
    pub overview: String,
    pub date_created: String,
    pub premiere_date: String,
    pub date_last_media_added: String,
    pub genres: Vec<String>,
    pub run_time_ticks: i64,
    #[serde(rename = "Type")]
    pub item_type: String,
    pub media_type: String,
    pub image_tags: Images,
    pub tags: Vec<String>,
    pub provider_ids: HashMap<String, String>,
    #[serde(rename = "ChildCount")]
    pub song_count: u32,
}

/// Search hits for a single item type.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    Songs(Vec<Song>),
    Albums(Vec<Album>),
    Artists(Vec<Artist>),
    Playlists(Vec<Playlist>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            Self::Songs(v) => v.len(),
            Self::Albums(v) => v.len(),
            Self::Artists(v) => v.len(),
            Self::Playlists(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Lyrics {
    pub metadata: LyricMetadata,
    pub lyrics: Vec<LyricLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LyricMetadata {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub author: String,
    pub length: i64,
    pub by: String,
    pub offset: i64,
    pub creator: String,
    pub version: String,
    pub is_synced: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LyricLine {
    pub text: String,
    pub start: i64,
}

/// Unauthenticated server identification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PublicSystemInfo {
    pub local_address: String,
    pub server_name: String,
    pub version: String,
    pub product_name: String,
    pub operating_system: String,
    pub id: String,
}
