use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};

use super::{non_empty, records};
use crate::track::NormalizedTrack;

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnAirEntry {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    song: Option<bool>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    artist_name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    image_url: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    description: Option<String>,
}

/// First named song on the channel, else the first entry with a description
/// reported as a live program.
pub fn extract_channel_results(data: &Value, channel: &str) -> Option<NormalizedTrack> {
    let entries: Vec<OnAirEntry> = records(data.get("results")?.get(channel)?)
        .into_iter()
        .filter_map(|raw| OnAirEntry::deserialize(raw).ok())
        .collect();

    if let Some((entry, name)) = entries.iter().find_map(|entry| {
        let name = non_empty(entry.name.as_deref())?;
        (entry.song == Some(true)).then_some((entry, name))
    }) {
        return Some(NormalizedTrack::new(
            name,
            entry.artist_name.clone().unwrap_or_default(),
            entry.image_url.clone(),
        ));
    }

    entries.iter().find_map(|entry| {
        let description = non_empty(entry.description.as_deref())?;
        Some(NormalizedTrack::live(description, entry.image_url.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::LIVE_SENTINEL;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn first_named_song_wins() {
        let data = json!({
            "results": {
                "3": [
                    { "type": "PI", "description": "Fun Morning" },
                    { "type": "PE_E", "song": true, "name": "", "artistName": "Nobody" },
                    { "type": "PE_E", "song": true, "name": "Losing It", "artistName": "Fisher", "imageUrl": "https://img.test/fisher.jpg" },
                    { "type": "PE_E", "song": true, "name": "Later", "artistName": "Someone" }
                ]
            }
        });
        let track = extract_channel_results(&data, "3").unwrap();
        assert_eq!(
            track,
            NormalizedTrack::new("Losing It", "Fisher", Some("https://img.test/fisher.jpg".into()))
        );
    }

    #[test]
    fn description_is_the_live_fallback() {
        let data = json!({
            "results": {
                "3": [
                    { "type": "PI", "song": false, "name": "Show" },
                    { "type": "PI", "description": "Fun Radio Club", "imageUrl": "https://img.test/club.png" }
                ]
            }
        });
        let track = extract_channel_results(&data, "3").unwrap();
        assert_eq!(track.title, "Fun Radio Club");
        assert_eq!(track.artist, LIVE_SENTINEL);
        assert_eq!(track.cover_url.as_deref(), Some("https://img.test/club.png"));
    }

    #[test]
    fn missing_channel_or_data_yields_none() {
        assert_eq!(extract_channel_results(&json!({}), "3"), None);
        assert_eq!(extract_channel_results(&json!({ "results": { "4": [] } }), "3"), None);
        let empty = json!({ "results": { "3": [{ "song": false }, { "description": "" }] } });
        assert_eq!(extract_channel_results(&empty, "3"), None);
    }

    #[test]
    fn song_without_artist_keeps_empty_artist() {
        let data = json!({ "results": { "3": [{ "song": true, "name": "Instrumental" }] } });
        let track = extract_channel_results(&data, "3").unwrap();
        assert_eq!(track.artist, "");
    }
}
