//! Derived URLs for cover art and outbound navigation.

/// Deterministic placeholder cover-art URL seeded by the song title.
pub fn cover_art_url(title: &str) -> String {
    format!(
        "https://picsum.photos/seed/{}/400/400",
        urlencoding::encode(title)
    )
}

/// Search URL for listening to the song externally. Never fetched here.
pub fn listen_search_url(title: &str, artist: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(&format!("{title} {artist}"))
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cover_art_url_encodes_the_title() {
        assert_eq!(
            cover_art_url("Bohemian Rhapsody"),
            "https://picsum.photos/seed/Bohemian%20Rhapsody/400/400"
        );
    }

    #[test]
    fn listen_search_url_combines_title_and_artist() {
        assert_eq!(
            listen_search_url("Imagine", "John Lennon"),
            "https://www.youtube.com/results?search_query=Imagine%20John%20Lennon"
        );
    }
}
