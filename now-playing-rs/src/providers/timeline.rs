use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};

use super::{non_empty, records, ExtractContext};
use crate::track::NormalizedTrack;

const SONG_EMBED_TYPE: &str = "song";

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Step {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    embed_type: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    start: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    end: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    title: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    title_concept: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    highlighted_artists: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    authors: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    visual: Option<String>,
}

impl Step {
    fn is_song(&self) -> bool {
        self.embed_type.as_deref() == Some(SONG_EMBED_TYPE)
    }

    fn covers(&self, now: i64) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start <= now && now <= end)
    }

    fn start_key(&self) -> i64 {
        self.start.unwrap_or(i64::MIN)
    }
}

/// Latest-starting song step, or the program on air right now when the
/// timeline carries no songs. Equal start times keep the first step seen.
pub fn extract_steps_timeline(data: &Value, ctx: &ExtractContext<'_>) -> Option<NormalizedTrack> {
    let steps: Vec<Step> = records(data.get("steps")?)
        .into_iter()
        .filter_map(|raw| Step::deserialize(raw).ok())
        .collect();

    if let Some(song) = latest(steps.iter().filter(|step| step.is_song())) {
        let title = non_empty(song.title.as_deref())?;
        let artist = song
            .highlighted_artists
            .first()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .or_else(|| non_empty(song.authors.as_deref()))
            .unwrap_or_default();
        return Some(NormalizedTrack::new(title, artist, song.visual.clone()));
    }

    let program = latest(steps.iter().filter(|step| step.covers(ctx.now)))?;
    let title = non_empty(program.title_concept.as_deref())
        .or_else(|| non_empty(program.title.as_deref()))
        .unwrap_or(ctx.station_name);
    Some(NormalizedTrack::live(title, None))
}

fn latest<'a>(steps: impl Iterator<Item = &'a Step>) -> Option<&'a Step> {
    steps.fold(None, |best: Option<&'a Step>, step| match best {
        Some(current) if step.start_key() <= current.start_key() => Some(current),
        _ => Some(step),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::LIVE_SENTINEL;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CTX: ExtractContext<'static> = ExtractContext {
        now: 1_500,
        station_name: "Mouv'",
    };

    #[test]
    fn latest_song_wins() {
        let data = json!({
            "steps": [
                { "embedType": "song", "start": 100, "title": "A" },
                { "embedType": "song", "start": 200, "title": "B" }
            ]
        });
        let track = extract_steps_timeline(&data, &CTX).unwrap();
        assert_eq!(track.title, "B");
    }

    #[test]
    fn equal_starts_keep_first_encountered() {
        let data = json!({
            "steps": {
                "k2": { "embedType": "song", "start": 300, "title": "First", "authors": "X" },
                "k1": { "embedType": "song", "start": 300, "title": "Second", "authors": "Y" },
                "k0": { "embedType": "song", "start": 100, "title": "Old" }
            }
        });
        let track = extract_steps_timeline(&data, &CTX).unwrap();
        assert_eq!(track.title, "First");
        assert_eq!(track.artist, "X");
    }

    #[test]
    fn artist_prefers_highlighted_then_authors() {
        let data = json!({
            "steps": {
                "a": {
                    "embedType": "song",
                    "start": 10,
                    "title": "Bande organisée",
                    "highlightedArtists": ["Jul", "SCH"],
                    "authors": "Collectif",
                    "visual": "https://img.test/cover.jpg"
                }
            }
        });
        let track = extract_steps_timeline(&data, &CTX).unwrap();
        assert_eq!(track.artist, "Jul");
        assert_eq!(track.cover_url.as_deref(), Some("https://img.test/cover.jpg"));

        let data = json!({
            "steps": [{ "embedType": "song", "start": 10, "title": "T", "highlightedArtists": [], "authors": "Authors" }]
        });
        assert_eq!(extract_steps_timeline(&data, &CTX).unwrap().artist, "Authors");

        let data = json!({ "steps": [{ "embedType": "song", "start": 10, "title": "T" }] });
        assert_eq!(extract_steps_timeline(&data, &CTX).unwrap().artist, "");
    }

    #[test]
    fn program_on_air_is_the_fallback() {
        let data = json!({
            "steps": {
                "past": { "embedType": "expression", "start": 0, "end": 1_000, "titleConcept": "Old show" },
                "wide": { "embedType": "expression", "start": 1_000, "end": 5_000, "title": "Wide block" },
                "now": { "embedType": "expression", "start": 1_200, "end": 1_800, "titleConcept": "Le Mouv' Club", "title": "Episode 12" }
            }
        });
        let track = extract_steps_timeline(&data, &CTX).unwrap();
        assert_eq!(track.title, "Le Mouv' Club");
        assert_eq!(track.artist, LIVE_SENTINEL);
        assert_eq!(track.cover_url, None);
    }

    #[test]
    fn untitled_program_falls_back_to_station_name() {
        let data = json!({ "steps": [{ "start": 1_000, "end": 2_000 }] });
        assert_eq!(extract_steps_timeline(&data, &CTX).unwrap().title, "Mouv'");
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(extract_steps_timeline(&json!({}), &CTX), None);
        assert_eq!(extract_steps_timeline(&json!({ "steps": {} }), &CTX), None);
        let ended = json!({ "steps": [{ "start": 0, "end": 10, "title": "Over" }] });
        assert_eq!(extract_steps_timeline(&ended, &CTX), None);
        let untitled_song = json!({ "steps": [{ "embedType": "song", "start": 10 }] });
        assert_eq!(extract_steps_timeline(&untitled_song, &CTX), None);
    }

    #[test]
    fn malformed_fields_do_not_poison_the_timeline() {
        let data = json!({
            "steps": [
                "garbage",
                { "embedType": "song", "start": "soon", "title": "No start" },
                { "embedType": "song", "start": 50, "title": "Good", "highlightedArtists": 42 }
            ]
        });
        let track = extract_steps_timeline(&data, &CTX).unwrap();
        assert_eq!(track.title, "Good");
        assert_eq!(track.artist, "");
    }
}
