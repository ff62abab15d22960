//! Derived views over the catalog: the genre index and genre filtering.
//! Pure functions; nothing here holds state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::album::Album;

/// Sentinel accepted by [`Selection::parse`] for "no filter".
pub const ALL_SENTINEL: &str = "all";

/// What the filter control currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Selection {
    #[default]
    All,
    Genre(String),
}

impl Selection {
    /// `"all"`, an empty string, or no value at all means [`Selection::All`].
    /// Anything else is taken verbatim as a genre name.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some(ALL_SENTINEL) => Self::All,
            Some(genre) => Self::Genre(genre.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_SENTINEL,
            Self::Genre(g) => g,
        }
    }
}

impl From<String> for Selection {
    fn from(s: String) -> Self {
        Self::parse(Some(&s))
    }
}

impl From<Selection> for String {
    fn from(s: Selection) -> Self {
        s.as_str().to_string()
    }
}

/// Unique genre names across `albums`, sorted.
pub fn derive_genres(albums: &[Album]) -> Vec<String> {
    albums
        .iter()
        .flat_map(|a| a.genres.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Albums matching `selection`, in their original order. Genre matching is
/// exact and case-sensitive.
pub fn filter_albums(albums: &[Album], selection: &Selection) -> Vec<Album> {
    match selection {
        Selection::All => albums.to_vec(),
        Selection::Genre(genre) => albums
            .iter()
            .filter(|a| a.has_genre(genre))
            .cloned()
            .collect(),
    }
}
