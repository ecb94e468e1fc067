use scraper::{Html, Selector};

use crate::track::NormalizedTrack;

const TRACK_LINK_SELECTOR: &str = r#"a[href^="/track/"]"#;
const ARTIST_TITLE_DELIMITER: &str = " - ";

/// Takes the most recent play (first track link) from a scraped playlist page.
/// Cover art is never present in the markup.
pub fn extract_scraped_playlist(html: &str) -> Option<NormalizedTrack> {
    let selector = Selector::parse(TRACK_LINK_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    let text = document
        .select(&selector)
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())?;

    let (artist, title) = split_artist_title(&text);
    Some(NormalizedTrack::new(title, artist, None))
}

/// Splits `Artist - Title` on the first delimiter; the title keeps any further
/// dashes. Without a delimiter the whole string is the title.
pub fn split_artist_title(text: &str) -> (&str, &str) {
    match text.split_once(ARTIST_TITLE_DELIMITER) {
        Some((artist, title)) => (artist, title),
        None => ("", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_track_link_wins() {
        let html = r#"
            <html><body>
              <a href="/station/skyrock">Skyrock</a>
              <table>
                <tr><td><a href="/track/1">DJ Snake - Titan</a></td></tr>
                <tr><td><a href="/track/2">Ninho - Jefe</a></td></tr>
              </table>
            </body></html>
        "#;
        let track = extract_scraped_playlist(html).unwrap();
        assert_eq!(track.artist, "DJ Snake");
        assert_eq!(track.title, "Titan");
        assert_eq!(track.cover_url, None);
    }

    #[test]
    fn title_keeps_extra_dashes() {
        let html = r#"<a class="ajax" href="/track/9">SCH - A7 - Remix - Live</a>"#;
        let track = extract_scraped_playlist(html).unwrap();
        assert_eq!(track.artist, "SCH");
        assert_eq!(track.title, "A7 - Remix - Live");
        assert_eq!(format!("{} - {}", track.artist, track.title), "SCH - A7 - Remix - Live");
    }

    #[test]
    fn missing_delimiter_makes_whole_text_the_title() {
        let html = r#"<a href="/track/3">  Jingle Skyrock  </a>"#;
        let track = extract_scraped_playlist(html).unwrap();
        assert_eq!(track.artist, "");
        assert_eq!(track.title, "Jingle Skyrock");
    }

    #[test]
    fn entities_are_decoded() {
        let html = r#"<a href="/track/4">Simon &amp; Garfunkel - Mrs. Robinson</a>"#;
        let track = extract_scraped_playlist(html).unwrap();
        assert_eq!(track.artist, "Simon & Garfunkel");
    }

    #[test]
    fn page_without_track_links_yields_nothing() {
        assert_eq!(extract_scraped_playlist("<p>Maintenance</p>"), None);
        assert_eq!(extract_scraped_playlist(""), None);
        assert_eq!(extract_scraped_playlist(r#"<a href="/track/5">   </a>"#), None);
    }

    #[test]
    fn hyphen_without_spaces_is_not_a_delimiter() {
        assert_eq!(split_artist_title("Jean-Jacques Goldman"), ("", "Jean-Jacques Goldman"));
        assert_eq!(split_artist_title("A - B"), ("A", "B"));
    }
}
