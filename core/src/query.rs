//! Structured query options for item listings.
//!
//! These are the caller-facing knobs; `ParameterBag` turns them into the
//! server's query-string keys.

use chrono::Datelike;

use crate::types::NameId;

/// Field to sort a listing by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Name,
    Year,
    Artist,
    PlayCount,
    Random,
    DateCreated,
    DatePlayed,
    CommunityRating,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "SortName",
            Self::Year => "ProductionYear,PremiereDate",
            Self::Artist => "AlbumArtist",
            Self::PlayCount => "PlayCount",
            Self::Random => "Random",
            Self::DateCreated => "DateCreated",
            Self::DatePlayed => "DatePlayed",
            Self::CommunityRating => "CommunityRating",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// `limit == 0` leaves the page size to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PagingSpec {
    pub start_index: u32,
    pub limit: u32,
}

impl PagingSpec {
    pub fn new(start_index: u32, limit: u32) -> Self {
        Self { start_index, limit }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlayedState {
    #[default]
    Any,
    Played,
    Unplayed,
}

/// Inclusive range of production years. `(0, 0)` means "no restriction".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// How far past the current year a range may reach.
    const FUTURE_SLACK: i32 = 10;

    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == 0
    }

    /// Valid when zero, or ordered, non-negative and no later than ten years
    /// from now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now().year())
    }

    pub fn is_valid_at(&self, current_year: i32) -> bool {
        if self.is_zero() {
            return true;
        }
        self.min <= self.max && self.min >= 0 && self.max <= current_year + Self::FUTURE_SLACK
    }

    /// Every year in the range, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.min..=self.max
    }
}

/// Narrows a listing. Every field left at its default adds nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub played: PlayedState,
    /// Only items the user starred.
    pub favorite_only: bool,
    pub artist_id: Option<String>,
    pub parent_id: Option<String>,
    pub genres: Vec<NameId>,
    pub year_range: YearRange,
}

/// Paging, filtering and sorting for one listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOpts {
    pub paging: PagingSpec,
    pub filter: FilterSpec,
    pub sort: SortSpec,
}
