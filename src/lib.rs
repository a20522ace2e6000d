pub mod codec;
pub mod compose;
pub mod debounce;
pub mod editor;
pub mod logging;
pub mod render;
pub mod session;
pub mod settings;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use codec::{decode, decode_or_empty, encode, DecodeError, EncodeError, SourceBundle};
pub use compose::compose;
pub use debounce::{debounce, Debounced, TimerHost, VirtualTimers};
pub use editor::{DisplayOptions, EditorFactory, EditorHandle, Pane};
pub use render::{PreviewSurface, RenderSync, RenderTargetUnavailable};
pub use session::{Session, SessionConfig, UrlSurface};
pub use settings::{Settings, SettingsPersistence, SettingsStore, Subscription};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init();
    leptos::mount::mount_to_body(app::App);
}
