//! Blocking API client core for Jellyfin-compatible media servers.
//!
//! # Overview
//! Turns typed library queries into HTTP requests, sends them through a
//! pluggable `Transport`, and classifies and decodes the responses. One
//! `Client` holds the connection settings and the authenticated session.
//!
//! # Design
//! - `ParameterBag` is the only place query strings are composed. Accessors
//!   start from `Client::default_params` and layer typed setters on top.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`),
//!   so everything above the `Transport` is testable without a network.
//! - Only 200 and 204 count as success. Everything else becomes an
//!   `Error::Http` carrying the status and the server's message.
//! - The device id is a fingerprint of the host's hardware address and the
//!   username, derived once per login.

pub mod browsing;
pub mod client;
pub mod error;
pub mod http;
pub mod identity;
pub mod media;
pub mod params;
pub mod playback;
pub mod playlist;
pub mod query;
pub mod search;
pub mod session;
pub mod types;
pub mod userdata;

pub use client::{Client, ClientConfig};
pub use error::{classify, Error, ErrorKind, Result, NO_BODY};
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use params::ParameterBag;
pub use playback::PlayEvent;
pub use query::{
    FilterSpec, PagingSpec, PlayedState, QueryOpts, SortDirection, SortField, SortSpec, YearRange,
};
pub use session::{AuthState, Credentials, Session};
pub use types::{
    Album, Artist, BaseItem, Images, ItemType, ItemsPage, LyricLine, LyricMetadata, Lyrics,
    MediaItemType, MediaSource, NameId, Playlist, PublicSystemInfo, SearchResults, Song, UserData,
};
