pub mod app_state;
pub mod config;
pub mod cover_art;
pub mod fetcher;
pub mod history;
pub mod http;
pub mod logging;
pub mod player;
pub mod presenter;
pub mod profile;
pub mod providers;
pub mod stations;
pub mod track;
