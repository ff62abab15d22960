//! Album value type and the wire shape of the chart feed.
//!
//! The origin returns
//! `{ "feed": { "results": [ { id, name, artistName, artworkUrl100, genres: [{name}], url } ] } }`.
//! Records are decoded into [`FeedRecord`] and mapped into [`Album`], which is
//! what the rest of the crate works with.

use serde::{Deserialize, Serialize};

/// Size token embedded in artwork URLs served by the feed.
pub const ARTWORK_SIZE_TOKEN: &str = "100x100";

/// One chart entry. Identity is `id`; everything else is display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    /// Templated URL containing [`ARTWORK_SIZE_TOKEN`].
    pub artwork_url: String,
    /// Source order, duplicates tolerated.
    pub genres: Vec<String>,
    pub url: String,
}

impl Album {
    /// Returns the artwork URL rewritten to request a `size`x`size` variant.
    /// URLs without the size token come back unchanged.
    pub fn artwork_url_at(&self, size: u32) -> String {
        self.artwork_url
            .replace(ARTWORK_SIZE_TOKEN, &format!("{size}x{size}"))
    }

    pub fn genre_line(&self) -> String {
        self.genres.join(", ")
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    pub feed: FeedBody,
}

#[derive(Debug, Deserialize)]
pub struct FeedBody {
    pub results: Vec<FeedRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub artwork_url100: String,
    #[serde(default)]
    pub genres: Vec<GenreTag>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreTag {
    pub name: String,
}

impl From<FeedRecord> for Album {
    fn from(r: FeedRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            artist_name: r.artist_name,
            artwork_url: r.artwork_url100,
            genres: r.genres.into_iter().map(|g| g.name).collect(),
            url: r.url,
        }
    }
}

impl FeedDocument {
    pub fn into_albums(self) -> Vec<Album> {
        self.feed.results.into_iter().map(Album::from).collect()
    }
}
