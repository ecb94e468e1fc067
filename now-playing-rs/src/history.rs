use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::track::NormalizedTrack;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub title: String,
    pub artist: String,
    #[serde(rename = "coverUrl")]
    pub cover_url: Option<String>,
    #[serde(rename = "stationName")]
    pub station_name: String,
    #[serde(rename = "observedAt")]
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingLinks {
    pub spotify: String,
    pub deezer: String,
    #[serde(rename = "appleMusic")]
    pub apple_music: String,
}

impl StreamingLinks {
    pub fn for_track(artist: &str, title: &str) -> Self {
        let query = urlencoding::encode(&format!("{artist} {title}")).into_owned();
        Self {
            spotify: format!("https://open.spotify.com/search/{query}"),
            deezer: format!("https://www.deezer.com/search/{query}"),
            apple_music: format!("https://music.apple.com/search?term={query}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    #[serde(rename = "ageLabel")]
    pub age_label: String,
    pub links: StreamingLinks,
}

/// Coarse age of an entry relative to render time. There is no day tier, so
/// very old entries report large hour counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeAge {
    JustNow,
    Minutes(i64),
    Hours(i64),
}

impl RelativeAge {
    pub fn between(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = (now - observed_at).num_seconds();
        if seconds < 60 {
            return RelativeAge::JustNow;
        }
        let minutes = seconds / 60;
        if minutes < 60 {
            return RelativeAge::Minutes(minutes);
        }
        RelativeAge::Hours(minutes / 60)
    }
}

impl std::fmt::Display for RelativeAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelativeAge::JustNow => write!(f, "À l'instant"),
            RelativeAge::Minutes(minutes) => write!(f, "Il y a {minutes}min"),
            RelativeAge::Hours(hours) => write!(f, "Il y a {hours}h"),
        }
    }
}

/// Newest-first log of the last tracks heard during the session.
///
/// Only the most recently recorded key is remembered, so a track comes back
/// into the log once something else has played in between.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    entries: VecDeque<HistoryEntry>,
    last_key: Option<String>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a new entry was logged. Live programs, tracks without
    /// an artist and repeats of the last key are ignored.
    pub fn record(
        &mut self,
        candidate: &NormalizedTrack,
        station_name: &str,
        default_cover: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if candidate.artist.is_empty() || candidate.is_live() || !candidate.is_usable() {
            return false;
        }
        let key = candidate.identity_key();
        if self.last_key.as_deref() == Some(key.as_str()) {
            return false;
        }
        self.last_key = Some(key);

        self.entries.push_front(HistoryEntry {
            title: candidate.title.clone(),
            artist: candidate.artist.clone(),
            cover_url: candidate
                .cover_url
                .clone()
                .or_else(|| default_cover.map(str::to_string)),
            station_name: station_name.to_string(),
            observed_at: now,
        });
        self.entries.truncate(HISTORY_CAPACITY);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn render(&self, now: DateTime<Utc>) -> Vec<RenderedEntry> {
        self.entries
            .iter()
            .map(|entry| RenderedEntry {
                age_label: RelativeAge::between(entry.observed_at, now).to_string(),
                links: StreamingLinks::for_track(&entry.artist, &entry.title),
                entry: entry.clone(),
            })
            .collect()
    }

    pub fn count_label(&self) -> String {
        match self.entries.len() {
            1 => "1 titre".to_string(),
            count => format!("{count} titres"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::LIVE_SENTINEL;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn track(n: usize) -> NormalizedTrack {
        NormalizedTrack::new(format!("Title {n}"), format!("Artist {n}"), None)
    }

    #[test]
    fn repeated_track_is_logged_once() {
        let mut history = HistoryTracker::new();
        assert!(history.record(&NormalizedTrack::new("Titan", "DJ Snake", None), "Skyrock", None, at(0)));
        assert!(!history.record(&NormalizedTrack::new("TITAN", "dj snake", None), "Skyrock", None, at(10)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn eleventh_track_evicts_the_oldest() {
        let mut history = HistoryTracker::new();
        for n in 1..=11 {
            assert!(history.record(&track(n), "Mouv'", None, at(n as i64)));
        }
        let titles: Vec<_> = history.entries().map(|e| e.title.clone()).collect();
        assert_eq!(titles.len(), HISTORY_CAPACITY);
        assert_eq!(titles.first().map(String::as_str), Some("Title 11"));
        assert_eq!(titles.last().map(String::as_str), Some("Title 2"));
        assert!(!titles.contains(&"Title 1".to_string()));
    }

    #[test]
    fn live_and_artistless_candidates_are_ignored() {
        let mut history = HistoryTracker::new();
        for title in ["Le Morning", "", "Anything"] {
            assert!(!history.record(&NormalizedTrack::new(title, LIVE_SENTINEL, None), "Mouv'", None, at(0)));
        }
        assert!(!history.record(&NormalizedTrack::new("Jingle", "", None), "Skyrock", None, at(0)));
        assert!(history.is_empty());
    }

    #[test]
    fn track_returns_after_another_intervenes() {
        let mut history = HistoryTracker::new();
        history.record(&track(1), "A", None, at(0));
        history.record(&track(2), "A", None, at(1));
        assert!(history.record(&track(1), "A", None, at(2)));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn missing_cover_falls_back_to_station_image() {
        let mut history = HistoryTracker::new();
        history.record(&track(1), "Skyrock", Some("images/skyrock.png"), at(0));
        history.record(
            &NormalizedTrack::new("B", "C", Some("https://img.test/b.jpg".into())),
            "Skyrock",
            Some("images/skyrock.png"),
            at(1),
        );
        let covers: Vec<_> = history.entries().map(|e| e.cover_url.clone()).collect();
        assert_eq!(
            covers,
            vec![
                Some("https://img.test/b.jpg".to_string()),
                Some("images/skyrock.png".to_string())
            ]
        );
    }

    #[test]
    fn relative_age_tiers() {
        let now = at(100_000);
        assert_eq!(RelativeAge::between(now - Duration::seconds(59), now).to_string(), "À l'instant");
        assert_eq!(RelativeAge::between(now - Duration::seconds(60), now).to_string(), "Il y a 1min");
        assert_eq!(RelativeAge::between(now - Duration::minutes(59), now).to_string(), "Il y a 59min");
        assert_eq!(RelativeAge::between(now - Duration::minutes(60), now).to_string(), "Il y a 1h");
        assert_eq!(RelativeAge::between(now - Duration::hours(30), now), RelativeAge::Hours(30));
    }

    #[test]
    fn render_is_a_snapshot_with_links() {
        let mut history = HistoryTracker::new();
        history.record(&NormalizedTrack::new("Titan", "DJ Snake", None), "Skyrock", None, at(0));
        let rendered = history.render(at(120));
        history.record(&track(2), "Skyrock", None, at(130));

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].age_label, "Il y a 2min");
        assert_eq!(rendered[0].links.spotify, "https://open.spotify.com/search/DJ%20Snake%20Titan");
        assert_eq!(rendered[0].links.deezer, "https://www.deezer.com/search/DJ%20Snake%20Titan");
        assert_eq!(
            rendered[0].links.apple_music,
            "https://music.apple.com/search?term=DJ%20Snake%20Titan"
        );
    }

    #[test]
    fn count_label_pluralizes() {
        let mut history = HistoryTracker::new();
        assert_eq!(history.count_label(), "0 titres");
        history.record(&track(1), "A", None, at(0));
        assert_eq!(history.count_label(), "1 titre");
        history.record(&track(2), "A", None, at(1));
        assert_eq!(history.count_label(), "2 titres");
    }
}
