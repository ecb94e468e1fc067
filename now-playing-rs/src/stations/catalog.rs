use super::{SocialLink, StationConfig, StationInfo, StationSummary};
use crate::providers::Provider;

#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<StationConfig>,
}

impl Catalog {
    pub fn new(stations: Vec<StationConfig>) -> Self {
        Self { stations }
    }

    pub fn builtin() -> Self {
        Self::new(vec![skyrock(), mouv(), skyrock_plm(), fun_radio()])
    }

    pub fn get(&self, id: &str) -> Option<&StationConfig> {
        self.stations.iter().find(|station| station.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationConfig> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Catalog order, with the listener's favorites moved to the front in the
    /// order they were saved. Unknown favorite ids are ignored.
    pub fn summaries(&self, favorites: &[String]) -> Vec<StationSummary> {
        let mut out: Vec<StationSummary> = favorites
            .iter()
            .filter_map(|id| self.get(id))
            .map(|station| station.summary(true))
            .collect();
        for station in &self.stations {
            if !favorites.iter().any(|id| id == &station.id) {
                out.push(station.summary(false));
            }
        }
        out
    }
}

fn socials(links: &[(&str, &str)]) -> Vec<SocialLink> {
    links
        .iter()
        .map(|(platform, url)| SocialLink {
            platform: platform.to_string(),
            url: url.to_string(),
        })
        .collect()
}

fn genres(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn skyrock() -> StationConfig {
    StationConfig {
        id: "skyrock".into(),
        name: "Skyrock".into(),
        stream_url: "https://icecast.skyrock.net/s/natio_mp3_128k".into(),
        endpoint: "https://onlineradiobox.com/fr/skyrock/playlist/".into(),
        provider: Provider::ScrapedPlaylist,
        default_image: "images/skyrock.png".into(),
        info: StationInfo {
            slogan: "Premier sur le Rap".into(),
            description: "Skyrock est la radio française numéro 1 du rap et du RnB. Elle diffuse les meilleurs hits hip-hop français et internationaux depuis 1986.".into(),
            location: "Paris, France".into(),
            year: "1986".into(),
            genres: genres(&["Rap", "Hip-Hop", "RnB", "Urbain"]),
            website: "https://www.skyrock.fm".into(),
            socials: socials(&[
                ("facebook", "https://www.facebook.com/SkyrockOfficiel"),
                ("instagram", "https://www.instagram.com/skyabordo"),
                ("twitter", "https://twitter.com/abordo_skyrock"),
                ("youtube", "https://www.youtube.com/skyrock"),
                ("snapchat", "https://www.snapchat.com/add/skyrock"),
                ("tiktok", "https://www.tiktok.com/@skyrock"),
            ]),
            email: "contact@skyrock.com".into(),
        },
    }
}

fn mouv() -> StationConfig {
    StationConfig {
        id: "mouv".into(),
        name: "Mouv'".into(),
        stream_url: "https://icecast.radiofrance.fr/mouv-hifi.aac".into(),
        endpoint: "https://api.radiofrance.fr/livemeta/pull/6".into(),
        provider: Provider::StepsTimeline,
        default_image: "images/mouv.png".into(),
        info: StationInfo {
            slogan: "100% Urbain".into(),
            description: "Mouv' est une station de Radio France dédiée aux cultures urbaines. Elle propose du rap français, de l'afrobeat, du reggaeton et des découvertes musicales.".into(),
            location: "Paris, France".into(),
            year: "1997".into(),
            genres: genres(&["Rap FR", "Afrobeat", "Urbain", "Reggaeton"]),
            website: "https://www.radiofrance.fr/mouv".into(),
            socials: socials(&[
                ("facebook", "https://www.facebook.com/moabordo"),
                ("instagram", "https://www.instagram.com/moabordo"),
                ("twitter", "https://twitter.com/moabordo"),
                ("youtube", "https://www.youtube.com/user/moabordo"),
            ]),
            email: "mouv@radiofrance.com".into(),
        },
    }
}

fn skyrock_plm() -> StationConfig {
    StationConfig {
        id: "skyrockplm".into(),
        name: "Skyrock PLM".into(),
        stream_url: "https://icecast.skyrock.net/s/plm_mp3_128k".into(),
        endpoint: "https://onlineradiobox.com/fr/skyrockplm/playlist/".into(),
        provider: Provider::ScrapedPlaylist,
        default_image: "images/skyrock-plm.png".into(),
        info: StationInfo {
            slogan: "La Playlist Musicale Non-Stop".into(),
            description: "Skyrock PLM (Playlist Musicale) est la webradio de Skyrock dédiée à la musique non-stop, sans animateur. 100% hits rap et RnB en continu.".into(),
            location: "Paris, France".into(),
            year: "2010".into(),
            genres: genres(&["Rap", "Hip-Hop", "RnB", "Playlist"]),
            website: "https://www.skyrock.fm/plm".into(),
            socials: socials(&[
                ("facebook", "https://www.facebook.com/SkyrockOfficiel"),
                ("instagram", "https://www.instagram.com/skyabordo"),
                ("twitter", "https://twitter.com/abordo_skyrock"),
            ]),
            email: "contact@skyrock.com".into(),
        },
    }
}

fn fun_radio() -> StationConfig {
    StationConfig {
        id: "funradio".into(),
        name: "Fun Radio".into(),
        stream_url: "https://streaming.radio.funradio.fr/fun-1-44-128".into(),
        endpoint: "https://core-search.radioplayer.cloud/056/qp/v4/onair?rpIds=3".into(),
        provider: Provider::ChannelResults {
            channel: "3".into(),
        },
        default_image: "images/funradio.png".into(),
        info: StationInfo {
            slogan: "Enjoy the Music".into(),
            description: "Fun Radio est une station de radio musicale belge qui diffuse principalement de la musique dance, électro et hits actuels. Connue pour ses DJ sets et ses événements musicaux.".into(),
            location: "Bruxelles, Belgique".into(),
            year: "1983".into(),
            genres: genres(&["Dance", "Électro", "Hits", "House"]),
            website: "https://www.funradio.be".into(),
            socials: socials(&[
                ("facebook", "https://www.facebook.com/funradiobe"),
                ("instagram", "https://www.instagram.com/funradiobe"),
                ("twitter", "https://twitter.com/funradiobe"),
                ("youtube", "https://www.youtube.com/funradiobe"),
            ]),
            email: "contact@funradio.be".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ResponseKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let ids: HashSet<_> = catalog.iter().map(|station| station.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn scraped_stations_expect_markup() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.get("skyrock").map(StationConfig::response_kind),
            Some(ResponseKind::ScrapedMarkup)
        );
        assert_eq!(
            catalog.get("funradio").map(StationConfig::response_kind),
            Some(ResponseKind::Json)
        );
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn favorites_come_first_in_saved_order() {
        let catalog = Catalog::builtin();
        let favorites = vec!["funradio".to_string(), "ghost".to_string(), "mouv".to_string()];
        let ids: Vec<_> = catalog
            .summaries(&favorites)
            .into_iter()
            .map(|summary| (summary.id, summary.favorite))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("funradio".to_string(), true),
                ("mouv".to_string(), true),
                ("skyrock".to_string(), false),
                ("skyrockplm".to_string(), false),
            ]
        );
    }
}
