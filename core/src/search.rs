use crate::client::{segment, Client};
use crate::error::{Error, Result};
use crate::http::Body;
use crate::params::keys;
use crate::types::{
    Album, Artist, ItemType, ItemsPage, MediaItemType, Playlist, SearchResults, Song,
};

const DEFAULT_SEARCH_LIMIT: u32 = 40;

impl Client {
    /// Search one item type by name. A `limit` of 0 means 40.
    pub fn search(&self, query: &str, item_type: ItemType, limit: u32) -> Result<SearchResults> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };

        let mut params = self.default_params();
        params.enable_recursive();
        params.set_search_term(query);
        params.set_limit(limit);
        params.set(keys::INCLUDE_PEOPLE, "false");
        params.set(keys::INCLUDE_MEDIA, "true");

        let (path, media_type) = match item_type {
            ItemType::Artist => {
                params.set(keys::INCLUDE_ARTISTS, "true");
                params.set(keys::INCLUDE_MEDIA, "false");
                ("/Artists".to_string(), MediaItemType::Artist)
            }
            ItemType::Album => (self.user_items_path()?, MediaItemType::Album),
            ItemType::Song => (self.user_items_path()?, MediaItemType::Audio),
            ItemType::Playlist => (self.user_items_path()?, MediaItemType::Playlist),
            ItemType::Genre => return Err(Error::UnsupportedItemType(item_type)),
        };
        if media_type != MediaItemType::Artist {
            params.set_include_types(media_type);
        }

        let response = self
            .get(&path, &params)
            .map_err(|e| e.context("query failed"))?;
        decode_results(item_type, response.body).map_err(|e| e.context("decode search results"))
    }

    fn user_items_path(&self) -> Result<String> {
        Ok(format!("/Users/{}/Items", segment(self.user_id()?)?))
    }
}

fn decode_results(item_type: ItemType, body: Body) -> Result<SearchResults> {
    Ok(match item_type {
        ItemType::Artist => SearchResults::Artists(body.json::<ItemsPage<Artist>>()?.items),
        ItemType::Album => SearchResults::Albums(body.json::<ItemsPage<Album>>()?.items),
        ItemType::Song => SearchResults::Songs(body.json::<ItemsPage<Song>>()?.items),
        ItemType::Playlist => SearchResults::Playlists(body.json::<ItemsPage<Playlist>>()?.items),
        ItemType::Genre => return Err(Error::UnsupportedItemType(item_type)),
    })
}
