use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayStatus {
    Live,
    Paused,
    Stopped,
}

/// Receives what the player wants shown; never reports back.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn display_track(&self, title: &str, artist: &str, cover_url: Option<&str>);
    async fn display_status(&self, status: PlayStatus);
}

/// Directives for the element that actually renders the audio stream.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn set_source(&self, url: Option<&str>);
    async fn play(&self);
    async fn pause(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub title: String,
    pub artist: String,
    #[serde(rename = "coverUrl")]
    pub cover_url: Option<String>,
    pub status: PlayStatus,
    #[serde(rename = "streamUrl")]
    pub stream_url: Option<String>,
    pub playing: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            cover_url: None,
            status: PlayStatus::Stopped,
            stream_url: None,
            playing: false,
        }
    }
}

/// Headless stand-in for the player bar: keeps the latest display and audio
/// directives so HTTP clients can mirror them.
#[derive(Default)]
pub struct DisplayBoard {
    state: RwLock<DisplayState>,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> DisplayState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl Presenter for DisplayBoard {
    async fn display_track(&self, title: &str, artist: &str, cover_url: Option<&str>) {
        let mut state = self.state.write().await;
        state.title = title.to_string();
        state.artist = artist.to_string();
        if let Some(cover) = cover_url {
            state.cover_url = Some(cover.to_string());
        }
    }

    async fn display_status(&self, status: PlayStatus) {
        let mut state = self.state.write().await;
        state.status = status;
        if status == PlayStatus::Stopped {
            *state = DisplayState::default();
        }
    }
}

#[async_trait]
impl AudioOutput for DisplayBoard {
    async fn set_source(&self, url: Option<&str>) {
        self.state.write().await.stream_url = url.map(str::to_string);
    }

    async fn play(&self) {
        self.state.write().await.playing = true;
    }

    async fn pause(&self) {
        self.state.write().await.playing = false;
    }
}
