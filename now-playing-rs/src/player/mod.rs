//! Drives the metadata poll for the single active station and feeds the
//! presenter and the history log.
//!
//! Every station switch bumps a session generation. Cycles remember the
//! generation they were started for and are dropped on completion if a newer
//! session has taken over, so a slow response for a previous station never
//! overwrites the current display.

mod session;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use crate::{
    cover_art::CoverArtLookup,
    fetcher::{FetchError, PayloadFetcher},
    history::{HistoryTracker, RenderedEntry},
    logging::logger,
    presenter::{AudioOutput, PlayStatus, Presenter},
    providers::ExtractContext,
    stations::{Catalog, StationConfig},
    track::{NormalizedTrack, LIVE_SENTINEL, LOADING_LABEL},
};

use session::PlaybackSession;
pub use session::SessionSnapshot;

/// Floor for the tick period; a zero period would make `interval` panic.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("unknown station {0}")]
    UnknownStation(String),
    #[error("no station is playing")]
    NothingPlaying,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// What a single metadata cycle did to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A usable track is now displayed.
    Updated { logged: bool },
    /// Nothing usable; the fallback display replaced the loading state.
    Fallback,
    /// Nothing usable; the previous display stays.
    Kept,
    /// The cycle belonged to a superseded session and was discarded.
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub count: usize,
    pub label: String,
    pub entries: Vec<RenderedEntry>,
}

#[derive(Default)]
struct PlayerState {
    generation: u64,
    session: Option<PlaybackSession>,
    history: HistoryTracker,
}

struct PlayerInner {
    catalog: Arc<Catalog>,
    fetcher: Arc<dyn PayloadFetcher>,
    covers: Arc<dyn CoverArtLookup>,
    presenter: Arc<dyn Presenter>,
    audio: Arc<dyn AudioOutput>,
    poll_interval: Duration,
    state: Mutex<PlayerState>,
}

#[derive(Clone)]
pub struct Player {
    inner: Arc<PlayerInner>,
}

impl Player {
    pub fn new(
        catalog: Arc<Catalog>,
        fetcher: Arc<dyn PayloadFetcher>,
        covers: Arc<dyn CoverArtLookup>,
        presenter: Arc<dyn Presenter>,
        audio: Arc<dyn AudioOutput>,
        poll_interval: Duration,
    ) -> Self {
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        Self {
            inner: Arc::new(PlayerInner {
                catalog,
                fetcher,
                covers,
                presenter,
                audio,
                poll_interval,
                state: Mutex::new(PlayerState::default()),
            }),
        }
    }

    /// Card-click semantics: the playing station pauses, anything else
    /// (including a paused station) starts from scratch. Decided and applied
    /// under one lock so concurrent clicks serialize.
    pub async fn play(&self, station_id: &str) -> Result<SessionSnapshot, PlayerError> {
        let station = self.lookup_station(station_id)?;
        let mut state = self.inner.state.lock().await;
        let playing_same = state
            .session
            .as_ref()
            .is_some_and(|session| session.station.id == station_id && session.playing);
        if playing_same {
            return self.toggle_locked(&mut state).await;
        }
        Ok(self.start_locked(&mut state, station).await)
    }

    pub async fn start(&self, station_id: &str) -> Result<SessionSnapshot, PlayerError> {
        let station = self.lookup_station(station_id)?;
        let mut state = self.inner.state.lock().await;
        Ok(self.start_locked(&mut state, station).await)
    }

    pub async fn toggle(&self) -> Result<SessionSnapshot, PlayerError> {
        let mut state = self.inner.state.lock().await;
        self.toggle_locked(&mut state).await
    }

    fn lookup_station(&self, station_id: &str) -> Result<StationConfig, PlayerError> {
        self.inner
            .catalog
            .get(station_id)
            .cloned()
            .ok_or_else(|| PlayerError::UnknownStation(station_id.to_string()))
    }

    async fn start_locked(&self, state: &mut PlayerState, station: StationConfig) -> SessionSnapshot {
        if let Some(mut previous) = state.session.take() {
            previous.cancel();
        }
        state.generation += 1;
        let generation = state.generation;
        let mut session = PlaybackSession::new(generation, station.clone());

        self.inner.audio.set_source(Some(&station.stream_url)).await;
        self.inner.audio.play().await;
        self.inner
            .presenter
            .display_track(&station.name, LOADING_LABEL, Some(&station.default_image))
            .await;
        self.inner.presenter.display_status(PlayStatus::Live).await;

        session.attach_ticker(self.spawn_ticker(generation, station.clone()));
        let snapshot = session.snapshot();
        state.session = Some(session);

        logger().info(
            "player.started",
            json!({
                "stationId": station.id,
                "generation": generation,
                "intervalMs": self.inner.poll_interval.as_millis() as u64,
            }),
        );
        snapshot
    }

    async fn toggle_locked(&self, state: &mut PlayerState) -> Result<SessionSnapshot, PlayerError> {
        let session = state.session.as_mut().ok_or(PlayerError::NothingPlaying)?;
        session.playing = !session.playing;
        if session.playing {
            self.inner.audio.play().await;
            self.inner.presenter.display_status(PlayStatus::Live).await;
        } else {
            self.inner.audio.pause().await;
            self.inner.presenter.display_status(PlayStatus::Paused).await;
        }
        logger().info(
            "player.toggled",
            json!({ "stationId": session.station.id, "playing": session.playing }),
        );
        Ok(session.snapshot())
    }

    /// Safe to call with nothing playing.
    pub async fn stop(&self) -> SessionSnapshot {
        let mut state = self.inner.state.lock().await;
        if let Some(mut session) = state.session.take() {
            session.cancel();
            logger().info(
                "player.stopped",
                json!({ "stationId": session.station.id, "generation": session.generation }),
            );
        }
        self.inner.audio.pause().await;
        self.inner.audio.set_source(None).await;
        self.inner.presenter.display_status(PlayStatus::Stopped).await;
        SessionSnapshot::idle(state.generation)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        match &state.session {
            Some(session) => session.snapshot(),
            None => SessionSnapshot::idle(state.generation),
        }
    }

    pub async fn history(&self, now: DateTime<Utc>) -> HistoryView {
        let state = self.inner.state.lock().await;
        HistoryView {
            count: state.history.len(),
            label: state.history.count_label(),
            entries: state.history.render(now),
        }
    }

    /// One fetch-and-normalize pass outside any session; nothing is displayed
    /// or logged to history.
    pub async fn probe(&self, station_id: &str) -> Result<Option<NormalizedTrack>, PlayerError> {
        let station = self
            .inner
            .catalog
            .get(station_id)
            .ok_or_else(|| PlayerError::UnknownStation(station_id.to_string()))?;
        let raw = self.inner.fetcher.fetch(station).await?;
        let ctx = ExtractContext {
            now: Utc::now().timestamp(),
            station_name: &station.name,
        };
        Ok(station.provider.extract(&raw, &ctx))
    }

    fn spawn_ticker(&self, generation: u64, station: StationConfig) -> JoinHandle<()> {
        let player = self.clone();
        let period = self.inner.poll_interval;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let player = player.clone();
                let station = station.clone();
                // Each cycle runs on its own so a slow upstream never delays
                // the next tick.
                tokio::spawn(async move {
                    player.poll_once(generation, &station).await;
                });
            }
        })
    }

    pub(crate) async fn poll_once(&self, generation: u64, station: &StationConfig) -> CycleOutcome {
        let fetched = self.inner.fetcher.fetch(station).await;
        let now = Utc::now();
        let extracted = fetched.map(|raw| {
            let ctx = ExtractContext {
                now: now.timestamp(),
                station_name: &station.name,
            };
            station.provider.extract(&raw, &ctx)
        });

        let (outcome, lookup) = self.apply(generation, station, extracted, now).await;
        if let Some(track) = lookup {
            self.lookup_cover(generation, station, track).await;
        }
        outcome
    }

    async fn apply(
        &self,
        generation: u64,
        station: &StationConfig,
        extracted: Result<Option<NormalizedTrack>, FetchError>,
        now: DateTime<Utc>,
    ) -> (CycleOutcome, Option<NormalizedTrack>) {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        let session = match state.session.as_mut() {
            Some(session) if session.generation == generation => session,
            _ => {
                logger().debug(
                    "metadata.stale_discarded",
                    json!({ "stationId": station.id, "generation": generation }),
                );
                return (CycleOutcome::Stale, None);
            }
        };

        let track = match extracted {
            Ok(Some(track)) => track,
            Ok(None) => {
                logger().debug("metadata.no_data", json!({ "stationId": station.id }));
                return (self.fall_back(session).await, None);
            }
            Err(error) => {
                logger().warn(
                    "metadata.fetch_failed",
                    json!({
                        "stationId": station.id,
                        "kind": error.kind(),
                        "error": error.to_string(),
                    }),
                );
                return (self.fall_back(session).await, None);
            }
        };

        let key = track.identity_key();
        let cached_cover = session.cached_cover(&key).map(str::to_string);
        let cover = track
            .cover_url
            .clone()
            .or(cached_cover.clone())
            .unwrap_or_else(|| station.default_image.clone());
        self.inner
            .presenter
            .display_track(&track.title, &track.artist, Some(&cover))
            .await;

        let changed = session.current_track.as_ref() != Some(&track);
        session.loading = false;
        session.current_track = Some(track.clone());

        let logged = state
            .history
            .record(&track, &station.name, Some(&station.default_image), now);
        if changed {
            logger().info(
                "metadata.track",
                json!({
                    "stationId": station.id,
                    "title": track.title,
                    "artist": track.artist,
                    "logged": logged,
                }),
            );
        }

        let lookup = (track.cover_url.is_none() && cached_cover.is_none() && !track.is_live())
            .then_some(track);
        (CycleOutcome::Updated { logged }, lookup)
    }

    async fn fall_back(&self, session: &mut PlaybackSession) -> CycleOutcome {
        if !session.loading {
            return CycleOutcome::Kept;
        }
        session.loading = false;
        self.inner
            .presenter
            .display_track(
                &session.station.name,
                LIVE_SENTINEL,
                Some(&session.station.default_image),
            )
            .await;
        CycleOutcome::Fallback
    }

    async fn lookup_cover(&self, generation: u64, station: &StationConfig, track: NormalizedTrack) {
        let Some(cover) = self.inner.covers.lookup(&track.title, &track.artist).await else {
            return;
        };

        let mut state = self.inner.state.lock().await;
        let Some(session) = state
            .session
            .as_mut()
            .filter(|session| session.generation == generation)
        else {
            return;
        };
        if session.current_track.as_ref() != Some(&track) {
            return;
        }
        session.looked_up_cover = Some((track.identity_key(), cover.clone()));
        self.inner
            .presenter
            .display_track(&track.title, &track.artist, Some(&cover))
            .await;
        logger().debug(
            "cover.applied",
            json!({ "stationId": station.id, "title": track.title, "coverUrl": cover }),
        );
    }
}
