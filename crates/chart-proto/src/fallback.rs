//! Substitute catalog served when every intermediary fails.

use crate::album::Album;

const PLACEHOLDER_ARTWORK: &str = "https://via.placeholder.com/100x100";

// (id, name, artist, genres)
const ENTRIES: &[(&str, &str, &str, &[&str])] = &[
    ("fallback-1", "GNX", "Kendrick Lamar", &["Hip-Hop/Rap", "Music"]),
    ("fallback-2", "Short n' Sweet", "Sabrina Carpenter", &["Pop", "Music"]),
    ("fallback-3", "HIT ME HARD AND SOFT", "Billie Eilish", &["Alternative", "Pop", "Music"]),
    ("fallback-4", "DeBÍ TiRAR MáS FOToS", "Bad Bunny", &["Latin", "Urbano latino", "Music"]),
    ("fallback-5", "The Tortured Poets Department", "Taylor Swift", &["Pop", "Music"]),
    ("fallback-6", "F-1 Trillion", "Post Malone", &["Country", "Music"]),
    ("fallback-7", "SOS", "SZA", &["R&B/Soul", "Music"]),
    ("fallback-8", "Rumours", "Fleetwood Mac", &["Rock", "Music"]),
];

/// The fixed, non-empty degraded-mode catalog. Same shape as live data.
pub fn substitute_catalog() -> Vec<Album> {
    ENTRIES
        .iter()
        .map(|(id, name, artist, genres)| Album {
            id: id.to_string(),
            name: name.to_string(),
            artist_name: artist.to_string(),
            artwork_url: PLACEHOLDER_ARTWORK.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            url: format!(
                "https://music.apple.com/us/search?term={}",
                urlencoding::encode(&format!("{artist} {name}"))
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_substitute_catalog_is_non_empty_and_well_formed() {
        let albums = substitute_catalog();
        assert!(!albums.is_empty());
        for a in &albums {
            assert!(!a.id.is_empty());
            assert!(!a.name.is_empty());
            assert!(!a.artist_name.is_empty());
            assert!(!a.genres.is_empty());
            assert!(a.artwork_url.contains(crate::album::ARTWORK_SIZE_TOKEN));
        }
    }

    #[test]
    fn test_substitute_ids_are_unique() {
        let albums = substitute_catalog();
        let ids: HashSet<_> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), albums.len());
    }

    #[test]
    fn test_substitute_catalog_is_stable() {
        assert_eq!(substitute_catalog(), substitute_catalog());
    }
}
