//! Per-station translation of upstream "now playing" payloads into a
//! [`NormalizedTrack`].
//!
//! Adapters are selected by station, never by sniffing the payload: the
//! fetcher decodes the body according to [`Provider::response_kind`] and the
//! matching variant extracts from it. Every adapter returns `None` on missing
//! or malformed data so the player keeps its previous display.

mod channel;
mod markup;
mod timeline;

use serde::Serialize;
use serde_json::Value;

use crate::track::NormalizedTrack;

pub use channel::extract_channel_results;
pub use markup::{extract_scraped_playlist, split_artist_title};
pub use timeline::extract_steps_timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseKind {
    Json,
    ScrapedMarkup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Provider {
    /// Playlist page listing recent plays as `<a href="/track/..">Artist - Title</a>`.
    ScrapedPlaylist,
    /// Timeline of `steps` where songs carry `embedType: "song"`.
    StepsTimeline,
    /// On-air results grouped by channel id.
    ChannelResults { channel: String },
}

#[derive(Debug, Clone)]
pub enum RawPayload {
    Json(Value),
    Markup(String),
}

/// Inputs an adapter may need besides the payload itself.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Wall clock in unix seconds.
    pub now: i64,
    pub station_name: &'a str,
}

impl Provider {
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Provider::ScrapedPlaylist => ResponseKind::ScrapedMarkup,
            Provider::StepsTimeline | Provider::ChannelResults { .. } => ResponseKind::Json,
        }
    }

    pub fn extract(&self, raw: &RawPayload, ctx: &ExtractContext<'_>) -> Option<NormalizedTrack> {
        let track = match (self, raw) {
            (Provider::ScrapedPlaylist, RawPayload::Markup(html)) => extract_scraped_playlist(html),
            (Provider::StepsTimeline, RawPayload::Json(data)) => extract_steps_timeline(data, ctx),
            (Provider::ChannelResults { channel }, RawPayload::Json(data)) => {
                extract_channel_results(data, channel)
            }
            _ => None,
        }?;
        track.is_usable().then_some(track)
    }
}

/// Reads a list of records that upstream may encode either as an array or as
/// an object keyed by id, preserving document order.
fn records(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CTX: ExtractContext<'static> = ExtractContext {
        now: 1_000,
        station_name: "Test FM",
    };

    #[test]
    fn response_kind_follows_variant() {
        assert_eq!(Provider::ScrapedPlaylist.response_kind(), ResponseKind::ScrapedMarkup);
        assert_eq!(Provider::StepsTimeline.response_kind(), ResponseKind::Json);
        assert_eq!(
            Provider::ChannelResults { channel: "3".into() }.response_kind(),
            ResponseKind::Json
        );
    }

    #[test]
    fn mismatched_payload_shape_yields_nothing() {
        let markup = RawPayload::Markup("<a href=\"/track/1\">A - B</a>".into());
        assert_eq!(Provider::StepsTimeline.extract(&markup, &CTX), None);
        let json = RawPayload::Json(json!({ "steps": {} }));
        assert_eq!(Provider::ScrapedPlaylist.extract(&json, &CTX), None);
    }

    #[test]
    fn records_accepts_arrays_and_objects_in_document_order() {
        let object = json!({ "z": 1, "a": 2 });
        let values: Vec<_> = records(&object).into_iter().cloned().collect();
        assert_eq!(values, vec![json!(1), json!(2)]);
        assert!(records(&json!("nope")).is_empty());
    }
}
