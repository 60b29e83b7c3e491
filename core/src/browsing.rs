//! Library browsing: views, albums, artists, songs, genres, playlists.

use serde::de::DeserializeOwned;

use crate::client::{segment, Client};
use crate::error::Result;
use crate::params::ParameterBag;
use crate::query::{FilterSpec, PagingSpec, QueryOpts, SortSpec};
use crate::types::{
    Album, Artist, BaseItem, ItemType, ItemsPage, MediaItemType, NameId, Playlist, Song,
};

pub(crate) const SONG_FIELDS: &[&str] = &["Genres", "DateCreated", "MediaSources", "UserData", "ParentId"];
const ALBUM_FIELDS: &[&str] = &["Genres", "DateCreated", "ChildCount", "UserData", "ParentId"];
const PLAYLIST_FIELDS: &[&str] = &["Genres", "DateCreated", "MediaSources", "ChildCount", "Parent", "Overview"];
const ARTIST_FIELDS: &[&str] = &["ChildCount", "UserData"];

const SIMILAR_ARTISTS_LIMIT: u32 = 15;

impl Client {
    /// Top-level collections the logged-in user can access.
    pub fn user_views(&self) -> Result<Vec<BaseItem>> {
        let path = format!("/Users/{}/Views", segment(self.user_id()?)?);
        self.fetch_page(&path, &self.default_params(), "get user views")
    }

    /// Albums matching `opts`. Filter on `artist_id` for a discography.
    pub fn albums(&self, opts: &QueryOpts) -> Result<Vec<Album>> {
        let mut params = self.default_params();
        params.enable_recursive();
        params.set_paging(opts.paging);
        params.set_sorting(opts.sort);
        params.set_filter(MediaItemType::Album, &opts.filter);
        params.set_include_types(MediaItemType::Album);
        params.set_include_fields(ALBUM_FIELDS);

        let path = format!("/Users/{}/Items", segment(self.user_id()?)?);
        self.fetch_page(&path, &params, "get albums")
    }

    pub fn album_artists(&self, opts: &QueryOpts) -> Result<Vec<Artist>> {
        let mut params = self.default_params();
        params.enable_recursive();
        params.set_filter(MediaItemType::Artist, &opts.filter);
        params.set_paging(opts.paging);
        params.set_sorting(opts.sort);
        params.set_include_types(MediaItemType::Album);
        params.set_include_fields(ARTIST_FIELDS);

        self.fetch_page("/Artists/AlbumArtists", &params, "get album artists")
    }

    pub fn artist(&self, artist_id: &str) -> Result<Artist> {
        let fields = with_extra(ARTIST_FIELDS, &["Overview"]);
        self.item_by_id(artist_id, &fields)
    }

    pub fn album(&self, album_id: &str) -> Result<Album> {
        let fields = with_extra(ALBUM_FIELDS, &["Overview"]);
        self.item_by_id(album_id, &fields)
    }

    pub fn song(&self, song_id: &str) -> Result<Song> {
        self.item_by_id(song_id, SONG_FIELDS)
    }

    pub fn playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let fields = with_extra(PLAYLIST_FIELDS, &["PremiereDate", "Tags", "ProviderIds"]);
        self.item_by_id(playlist_id, &fields)
    }

    pub fn similar_artists(&self, artist_id: &str) -> Result<Vec<Artist>> {
        let mut params = self.default_params();
        params.enable_recursive();
        params.set_include_types(MediaItemType::Artist);
        params.set_limit(SIMILAR_ARTISTS_LIMIT);

        let path = format!("/Items/{}/Similar", segment(artist_id)?);
        self.fetch_page(&path, &params, "get similar artists")
    }

    /// Music genres, optionally only those under `parent_id`.
    pub fn genres(&self, paging: PagingSpec, parent_id: Option<&str>) -> Result<Vec<NameId>> {
        let mut params = self.default_params();
        params.enable_recursive();
        params.set_sorting(SortSpec::default());
        params.set_paging(paging);
        if let Some(parent_id) = parent_id {
            let filter = FilterSpec {
                parent_id: Some(parent_id.to_string()),
                ..FilterSpec::default()
            };
            params.set_filter(MediaItemType::Genre, &filter);
        }

        self.fetch_page("/MusicGenres", &params, "get genres")
    }

    /// Songs matching `opts`.
    ///
    /// Filter on `parent_id` for an album's track list, or on `artist_id`
    /// sorted by community rating for an artist's top songs.
    pub fn songs(&self, opts: &QueryOpts) -> Result<Vec<Song>> {
        let mut params = self.default_params();
        params.set_include_types(MediaItemType::Audio);
        params.set_paging(opts.paging);
        params.set_sorting(opts.sort);
        params.set_filter(MediaItemType::Audio, &opts.filter);
        params.enable_recursive();
        params.set_include_fields(SONG_FIELDS);

        let path = format!("/Users/{}/Items", segment(self.user_id()?)?);
        self.fetch_page(&path, &params, "get songs")
    }

    /// Music playlists. Song counts are included; the songs themselves come
    /// from `playlist_songs`.
    pub fn playlists(&self) -> Result<Vec<Playlist>> {
        let mut params = self.default_params();
        params.set_include_types(MediaItemType::Playlist);
        params.enable_recursive();
        params.set_include_fields(PLAYLIST_FIELDS);

        let path = format!("/Users/{}/Items", segment(self.user_id()?)?);
        let playlists: Vec<Playlist> = self.fetch_page(&path, &params, "get playlists")?;

        // "Audio" for playlists made in the server UI, "Unknown" for
        // discovered .m3u files.
        Ok(playlists
            .into_iter()
            .filter(|pl| {
                pl.media_type == MediaItemType::Audio.as_str()
                    || pl.media_type == MediaItemType::Unknown.as_str()
            })
            .collect())
    }

    /// Songs related to the seed item `id`.
    pub fn instant_mix(&self, id: &str, id_type: ItemType, limit: u32) -> Result<Vec<Song>> {
        let id = segment(id)?;
        let path = match id_type {
            ItemType::Artist => format!("/Artists/{id}/InstantMix"),
            ItemType::Album => format!("/Albums/{id}/InstantMix"),
            ItemType::Song => format!("/Songs/{id}/InstantMix"),
            ItemType::Playlist | ItemType::Genre => format!("/Items/{id}/InstantMix"),
        };

        let mut params = self.default_params();
        params.set_include_fields(SONG_FIELDS);
        params.set_limit(limit);
        self.fetch_page(&path, &params, "get instant mix")
    }

    fn item_by_id<T: DeserializeOwned>(&self, item_id: &str, fields: &[&str]) -> Result<T> {
        let mut params = self.default_params();
        if !fields.is_empty() {
            params.set_include_fields(fields);
        }
        let path = format!(
            "/Users/{}/Items/{}",
            segment(self.user_id()?)?,
            segment(item_id)?
        );
        let response = self.get(&path, &params).map_err(|e| e.context("get item"))?;
        response.body.json().map_err(|e| e.context("parse item"))
    }

    /// GET `path` and decode the `Items` of the returned page.
    pub(crate) fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ParameterBag,
        operation: &'static str,
    ) -> Result<Vec<T>> {
        let response = self.get(path, params).map_err(|e| e.context(operation))?;
        let page: ItemsPage<T> = response.body.json().map_err(|e| e.context(operation))?;
        Ok(page.items)
    }
}

fn with_extra<'a>(fields: &[&'a str], extra: &[&'a str]) -> Vec<&'a str> {
    fields.iter().chain(extra).copied().collect()
}
