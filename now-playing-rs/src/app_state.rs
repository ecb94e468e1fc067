use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use crate::{
    config::Config,
    cover_art::{CoverArtLookup, ItunesCoverLookup, NoCoverLookup},
    fetcher::{PayloadFetcher, ProxiedFetcher},
    logging::logger,
    player::Player,
    presenter::DisplayBoard,
    profile::{FileProfileStore, ProfileError, ProfileStore, UserProfile},
    stations::Catalog,
};

/// Outcome of the one profile load done at startup.
#[derive(Debug, Clone)]
pub enum ProfileState {
    Loaded(UserProfile),
    Unavailable { code: &'static str },
}

impl ProfileState {
    pub fn from_result(result: Result<UserProfile, ProfileError>) -> Self {
        match result {
            Ok(profile) => ProfileState::Loaded(profile),
            Err(error) => ProfileState::Unavailable { code: error.code() },
        }
    }

    pub fn favorites(&self) -> &[String] {
        match self {
            ProfileState::Loaded(profile) => &profile.preferences.favorite_radios,
            ProfileState::Unavailable { .. } => &[],
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub player: Player,
    pub board: Arc<DisplayBoard>,
    pub profile: Arc<ProfileState>,
}

impl AppState {
    pub async fn initialize(config: Config) -> anyhow::Result<Self> {
        let fetcher = ProxiedFetcher::new(&config.metadata)
            .context("failed to build metadata http client")?;
        let covers: Arc<dyn CoverArtLookup> = if config.cover_lookup.enabled {
            Arc::new(
                ItunesCoverLookup::new(&config.cover_lookup, config.metadata.fetch_timeout())
                    .context("failed to build cover lookup client")?,
            )
        } else {
            Arc::new(NoCoverLookup)
        };

        let store = FileProfileStore::new(config.profile_path.clone());
        let loaded = store.load().await;
        match &loaded {
            Ok(profile) => logger().info(
                "profile.loaded",
                json!({
                    "uid": profile.uid,
                    "favorites": profile.preferences.favorite_radios.len(),
                }),
            ),
            Err(error) => logger().warn(
                "profile.unavailable",
                json!({ "code": error.code(), "error": error.to_string() }),
            ),
        }
        let profile = ProfileState::from_result(loaded);

        Ok(Self::from_parts(
            config,
            Catalog::builtin(),
            Arc::new(fetcher),
            covers,
            profile,
        ))
    }

    pub fn from_parts(
        config: Config,
        catalog: Catalog,
        fetcher: Arc<dyn PayloadFetcher>,
        covers: Arc<dyn CoverArtLookup>,
        profile: ProfileState,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let board = Arc::new(DisplayBoard::new());
        let player = Player::new(
            catalog.clone(),
            fetcher,
            covers,
            board.clone(),
            board.clone(),
            config.metadata.poll_interval(),
        );
        Self {
            config,
            catalog,
            player,
            board,
            profile: Arc::new(profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserPreferences;
    use pretty_assertions::assert_eq;

    #[test]
    fn profile_state_keeps_favorites_or_error_code() {
        let profile = UserProfile {
            uid: "u1".into(),
            email: None,
            display_name: None,
            preferences: UserPreferences {
                favorite_radios: vec!["mouv".into()],
                ..UserPreferences::default()
            },
        };
        let state = ProfileState::from_result(Ok(profile));
        assert_eq!(state.favorites(), ["mouv".to_string()]);

        let state = ProfileState::from_result(Err(ProfileError::NotConfigured));
        assert!(matches!(state, ProfileState::Unavailable { code: "auth/user-not-found" }));
        assert!(state.favorites().is_empty());
    }

    #[tokio::test]
    async fn initialize_without_profile_path_reports_missing_user() {
        let config = Config {
            port: 0,
            allow_insecure_transports: false,
            metadata: crate::config::MetadataConfig::default(),
            cover_lookup: crate::config::CoverLookupConfig {
                enabled: false,
                base_url: "https://itunes.apple.com/search".into(),
            },
            profile_path: None,
        };
        let state = AppState::initialize(config).await.unwrap();
        assert!(matches!(
            state.profile.as_ref(),
            ProfileState::Unavailable { code: "auth/user-not-found" }
        ));
        assert_eq!(state.catalog.len(), 4);
    }
}
