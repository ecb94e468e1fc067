use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{stations::StationConfig, track::NormalizedTrack};

const IDLE_WINDOW_TITLE: &str = "Noct PLM";

/// The one live playback session. Replaced wholesale on every station switch;
/// `generation` identifies it to in-flight metadata cycles.
pub(crate) struct PlaybackSession {
    pub(crate) generation: u64,
    pub(crate) station: StationConfig,
    pub(crate) current_track: Option<NormalizedTrack>,
    pub(crate) playing: bool,
    /// True until the first cycle either shows a track or falls back.
    pub(crate) loading: bool,
    /// Secondary-lookup artwork for the track identity it was found for.
    pub(crate) looked_up_cover: Option<(String, String)>,
    ticker: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    pub(crate) fn new(generation: u64, station: StationConfig) -> Self {
        Self {
            generation,
            station,
            current_track: None,
            playing: true,
            loading: true,
            looked_up_cover: None,
            ticker: None,
        }
    }

    pub(crate) fn attach_ticker(&mut self, ticker: JoinHandle<()>) {
        if let Some(previous) = self.ticker.replace(ticker) {
            previous.abort();
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    pub(crate) fn cached_cover(&self, key: &str) -> Option<&str> {
        self.looked_up_cover
            .as_ref()
            .filter(|(cached_key, _)| cached_key == key)
            .map(|(_, url)| url.as_str())
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            station_id: Some(self.station.id.clone()),
            station_name: Some(self.station.name.clone()),
            generation: self.generation,
            playing: self.playing,
            loading: self.loading,
            window_title: window_title(Some(self)),
            current_track: self.current_track.clone(),
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    #[serde(rename = "stationId")]
    pub station_id: Option<String>,
    #[serde(rename = "stationName")]
    pub station_name: Option<String>,
    pub generation: u64,
    pub playing: bool,
    pub loading: bool,
    #[serde(rename = "windowTitle")]
    pub window_title: String,
    #[serde(rename = "currentTrack")]
    pub current_track: Option<NormalizedTrack>,
}

impl SessionSnapshot {
    pub(crate) fn idle(generation: u64) -> Self {
        Self {
            station_id: None,
            station_name: None,
            generation,
            playing: false,
            loading: false,
            window_title: window_title(None),
            current_track: None,
        }
    }
}

fn window_title(session: Option<&PlaybackSession>) -> String {
    match session {
        None => IDLE_WINDOW_TITLE.to_string(),
        Some(session) => match &session.current_track {
            Some(track) => format!("🎵 {} • {}", track.title, session.station.name),
            None => session.station.name.clone(),
        },
    }
}
