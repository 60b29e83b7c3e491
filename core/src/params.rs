//! Query-string parameter builder.
//!
//! # Design
//! `ParameterBag` is a key/value map built fresh for every call. Call sites
//! go through typed setters so the server's key spellings live in one place;
//! later writes to the same key overwrite earlier ones. Keys are kept sorted,
//! which makes the encoded query deterministic for identical inputs.

use std::collections::BTreeMap;

use crate::query::{FilterSpec, PagingSpec, PlayedState, SortSpec};
use crate::types::MediaItemType;

/// Query-string keys understood by the server.
pub mod keys {
    pub const SORT_BY: &str = "SortBy";
    pub const SORT_ORDER: &str = "SortOrder";
    pub const LIMIT: &str = "Limit";
    pub const START_INDEX: &str = "StartIndex";
    pub const RECURSIVE: &str = "Recursive";
    pub const FIELDS: &str = "Fields";
    pub const INCLUDE_ITEM_TYPES: &str = "IncludeItemTypes";
    pub const FILTERS: &str = "Filters";
    pub const GENRES: &str = "Genres";
    pub const YEARS: &str = "Years";
    pub const ARTIST_IDS: &str = "ArtistIds";
    pub const PARENT_ID: &str = "ParentId";
    pub const USER_ID: &str = "UserId";
    pub const DEVICE_ID: &str = "DeviceId";
    pub const SEARCH_TERM: &str = "SearchTerm";
    pub const INCLUDE_PEOPLE: &str = "IncludePeople";
    pub const INCLUDE_MEDIA: &str = "IncludeMedia";
    pub const INCLUDE_ARTISTS: &str = "IncludeArtists";
    pub const IDS: &str = "Ids";
    pub const ENTRY_IDS: &str = "EntryIds";
    pub const WIDTH: &str = "width";
    pub const QUALITY: &str = "quality";
    pub const PLAY_SESSION_ID: &str = "playSessionId";
    pub const STATIC: &str = "static";
    pub const API_KEY: &str = "api_key";
}

const FILTER_FAVORITE: &str = "IsFavorite";
const FILTER_PLAYED: &str = "IsPlayed";
const FILTER_UNPLAYED: &str = "IsUnPlayed";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    entries: BTreeMap<&'static str, String>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub(crate) fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.insert(key, value.into());
    }

    pub fn set_sorting(&mut self, sort: SortSpec) {
        self.set(keys::SORT_BY, sort.field.as_str());
        self.set(keys::SORT_ORDER, sort.direction.as_str());
    }

    /// Always writes the start index; the limit only when non-zero.
    pub fn set_paging(&mut self, paging: PagingSpec) {
        if paging.limit > 0 {
            self.set(keys::LIMIT, paging.limit.to_string());
        }
        self.set(keys::START_INDEX, paging.start_index.to_string());
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.set(keys::LIMIT, limit.to_string());
    }

    pub fn set_include_types(&mut self, item_type: MediaItemType) {
        self.set(keys::INCLUDE_ITEM_TYPES, item_type.as_str());
    }

    pub fn set_include_fields(&mut self, fields: &[&str]) {
        self.set(keys::FIELDS, fields.join(","));
    }

    pub fn enable_recursive(&mut self) {
        self.set(keys::RECURSIVE, "true");
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.set(keys::SEARCH_TERM, term);
    }

    pub fn set_ids(&mut self, key: &'static str, ids: &[String]) {
        self.set(key, ids.join(","));
    }

    /// Write the filter keys for a listing of `item_type`.
    ///
    /// Invalid or zero year ranges are dropped silently.
    pub fn set_filter(&mut self, item_type: MediaItemType, filter: &FilterSpec) {
        let mut tokens = Vec::new();
        if filter.favorite_only {
            tokens.push(FILTER_FAVORITE);
        }

        // The server rejects play-state filters on artist listings, and
        // artists carry no production year.
        if item_type != MediaItemType::Artist {
            match filter.played {
                PlayedState::Any => {}
                PlayedState::Played => tokens.push(FILTER_PLAYED),
                PlayedState::Unplayed => tokens.push(FILTER_UNPLAYED),
            }

            let range = filter.year_range;
            if range.is_valid() && range.min > 0 {
                let years: Vec<String> = range.years().map(|y| y.to_string()).collect();
                self.set(keys::YEARS, years.join(","));
            }
        }

        if !filter.genres.is_empty() {
            let names: Vec<&str> = filter.genres.iter().map(|g| g.name.as_str()).collect();
            self.set(keys::GENRES, names.join("|"));
        }

        if !tokens.is_empty() {
            self.set(keys::FILTERS, tokens.join(","));
        }

        if let Some(artist_id) = filter.artist_id.as_deref().filter(|id| !id.is_empty()) {
            self.set(keys::ARTIST_IDS, artist_id);
        }

        if let Some(parent_id) = filter.parent_id.as_deref().filter(|id| !id.is_empty()) {
            self.set(keys::PARENT_ID, parent_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortDirection, SortField, YearRange};
    use crate::types::NameId;

    fn years(min: i32, max: i32) -> FilterSpec {
        FilterSpec {
            year_range: YearRange::new(min, max),
            ..FilterSpec::default()
        }
    }

    #[test]
    fn sorting_writes_both_keys() {
        let mut p = ParameterBag::new();
        p.set_sorting(SortSpec::new(SortField::CommunityRating, SortDirection::Descending));
        assert_eq!(p.get(keys::SORT_BY), Some("CommunityRating"));
        assert_eq!(p.get(keys::SORT_ORDER), Some("Descending"));

        let mut p = ParameterBag::new();
        p.set_sorting(SortSpec::default());
        assert_eq!(p.get(keys::SORT_BY), Some("SortName"));
        assert_eq!(p.get(keys::SORT_ORDER), Some("Ascending"));
    }

    #[test]
    fn zero_limit_omits_limit_key() {
        let mut p = ParameterBag::new();
        p.set_paging(PagingSpec::new(5, 0));
        assert_eq!(p.get(keys::START_INDEX), Some("5"));
        assert!(!p.contains(keys::LIMIT));

        p.set_paging(PagingSpec::new(0, 50));
        assert_eq!(p.get(keys::START_INDEX), Some("0"));
        assert_eq!(p.get(keys::LIMIT), Some("50"));
    }

    #[test]
    fn set_limit_is_unconditional() {
        let mut p = ParameterBag::new();
        p.set_limit(0);
        assert_eq!(p.get(keys::LIMIT), Some("0"));
    }

    #[test]
    fn fields_and_types() {
        let mut p = ParameterBag::new();
        p.set_include_fields(&["Genres", "DateCreated", "UserData"]);
        p.set_include_types(MediaItemType::Album);
        p.enable_recursive();
        assert_eq!(p.get(keys::FIELDS), Some("Genres,DateCreated,UserData"));
        assert_eq!(p.get(keys::INCLUDE_ITEM_TYPES), Some("MusicAlbum"));
        assert_eq!(p.get(keys::RECURSIVE), Some("true"));
    }

    #[test]
    fn single_year() {
        let mut p = ParameterBag::new();
        p.set_filter(MediaItemType::Album, &years(2000, 2000));
        assert_eq!(p.get(keys::YEARS), Some("2000"));
    }

    #[test]
    fn year_range_expands_ascending() {
        let mut p = ParameterBag::new();
        p.set_filter(MediaItemType::Album, &years(2000, 2002));
        assert_eq!(p.get(keys::YEARS), Some("2000,2001,2002"));
    }

    #[test]
    fn invalid_year_ranges_are_ignored() {
        for (min, max) in [(2002, 2000), (-5, 2000), (2000, 9999), (0, 0)] {
            let mut p = ParameterBag::new();
            p.set_filter(MediaItemType::Audio, &years(min, max));
            assert!(!p.contains(keys::YEARS), "({min}, {max})");
            assert!(p.is_empty(), "({min}, {max})");
        }
    }

    #[test]
    fn favorite_then_played_state() {
        let filter = FilterSpec {
            played: PlayedState::Unplayed,
            favorite_only: true,
            ..FilterSpec::default()
        };
        let mut p = ParameterBag::new();
        p.set_filter(MediaItemType::Audio, &filter);
        assert_eq!(p.get(keys::FILTERS), Some("IsFavorite,IsUnPlayed"));

        let filter = FilterSpec {
            played: PlayedState::Played,
            ..FilterSpec::default()
        };
        let mut p = ParameterBag::new();
        p.set_filter(MediaItemType::Album, &filter);
        assert_eq!(p.get(keys::FILTERS), Some("IsPlayed"));
    }

    #[test]
    fn artists_never_get_played_tokens() {
        for played in [PlayedState::Played, PlayedState::Unplayed] {
            let filter = FilterSpec {
                played,
                ..FilterSpec::default()
            };
            let mut p = ParameterBag::new();
            p.set_filter(MediaItemType::Artist, &filter);
            assert!(!p.contains(keys::FILTERS));

            let filter = FilterSpec {
                played,
                favorite_only: true,
                ..FilterSpec::default()
            };
            let mut p = ParameterBag::new();
            p.set_filter(MediaItemType::Artist, &filter);
            assert_eq!(p.get(keys::FILTERS), Some("IsFavorite"));
        }
    }

    #[test]
    fn genres_artist_and_parent() {
        let filter = FilterSpec {
            genres: vec![
                NameId {
                    name: "Jazz".to_string(),
                    id: "g1".to_string(),
                },
                NameId {
                    name: "Hard Bop".to_string(),
                    id: "g2".to_string(),
                },
            ],
            artist_id: Some("ar1".to_string()),
            parent_id: Some("al1".to_string()),
            ..FilterSpec::default()
        };
        let mut p = ParameterBag::new();
        p.set_filter(MediaItemType::Audio, &filter);
        assert_eq!(p.get(keys::GENRES), Some("Jazz|Hard Bop"));
        assert_eq!(p.get(keys::ARTIST_IDS), Some("ar1"));
        assert_eq!(p.get(keys::PARENT_ID), Some("al1"));
        assert!(!p.contains(keys::FILTERS));
    }

    #[test]
    fn later_writes_overwrite() {
        let mut p = ParameterBag::new();
        p.set_limit(10);
        p.set_limit(15);
        assert_eq!(p.get(keys::LIMIT), Some("15"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn building_is_deterministic() {
        let build = || {
            let mut p = ParameterBag::new();
            p.set_sorting(SortSpec::new(SortField::Year, SortDirection::Descending));
            p.set_paging(PagingSpec::new(20, 10));
            p.set_filter(
                MediaItemType::Album,
                &FilterSpec {
                    played: PlayedState::Played,
                    favorite_only: true,
                    year_range: YearRange::new(1990, 1995),
                    ..FilterSpec::default()
                },
            );
            p
        };
        let first = build();
        let second = build();
        assert_eq!(first, second);
        let a: Vec<_> = first.iter().collect();
        let b: Vec<_> = second.iter().collect();
        assert_eq!(a, b);
    }
}
