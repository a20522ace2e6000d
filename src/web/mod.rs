//! Browser implementations of the session's collaborators.

mod monaco;
mod preview;

pub use monaco::{MonacoEditor, MonacoFactory};
pub use preview::{DetachedWindow, FrameSurface};

use gloo_storage::{LocalStorage, Storage};
use leptos::prelude::window;
use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::debounce::TimerHost;
use crate::session::UrlSurface;
use crate::settings::{Settings, SettingsPersistence};

const SETTINGS_KEY: &str = "playpen-settings";

#[derive(Debug, Error)]
pub enum WebError {
    #[error("no element with id `{0}` in the page")]
    MissingElement(&'static str),

    #[error("browser call failed: {0}")]
    Js(String),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        WebError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

#[derive(Clone, Copy, Default)]
pub struct BrowserTimers;

impl TimerHost for BrowserTimers {
    type Handle = gloo_timers::callback::Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle {
        gloo_timers::callback::Timeout::new(delay_ms, task)
    }
}

/// `location.pathname` / `history.replaceState`.
pub struct BrowserUrl;

impl UrlSurface for BrowserUrl {
    fn current_token(&self) -> Option<String> {
        let path = window().location().pathname().ok()?;
        let token = path.trim_start_matches('/');
        (!token.is_empty()).then(|| token.to_string())
    }

    fn replace_token(&self, token: &str) {
        let replaced = window().history().and_then(|history| {
            history.replace_state_with_url(&JsValue::NULL, "", Some(&format!("/{token}")))
        });
        if let Err(err) = replaced {
            tracing::warn!("could not update the address bar: {}", WebError::from(err));
        }
    }
}

pub struct LocalSettings;

impl SettingsPersistence for LocalSettings {
    fn load(&self) -> Option<Settings> {
        LocalStorage::get(SETTINGS_KEY).ok()
    }

    fn save(&self, settings: &Settings) {
        if let Err(err) = LocalStorage::set(SETTINGS_KEY, settings) {
            tracing::warn!("could not persist settings: {err}");
        }
    }
}
