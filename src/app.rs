use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use serde_json::{json, Map, Value};

use crate::editor::Pane;
use crate::render::RenderSync;
use crate::session::{Session, SessionConfig};
use crate::settings::{Settings, SettingsStore};
use crate::web::{
    BrowserTimers, BrowserUrl, DetachedWindow, FrameSurface, LocalSettings, MonacoEditor,
    MonacoFactory, WebError,
};

const PREVIEW_FRAME_ID: &str = "preview";

thread_local! {
    static SESSION: RefCell<Option<Session<MonacoEditor>>> = const { RefCell::new(None) };
}

fn start_session() -> Result<Rc<SettingsStore>, WebError> {
    let settings = SettingsStore::restore(LocalSettings);
    let render = Rc::new(RenderSync::new(FrameSurface::find(PREVIEW_FRAME_ID)?));
    let session = Session::start(
        &MonacoFactory,
        Rc::new(BrowserUrl),
        render,
        Rc::clone(&settings),
        BrowserTimers,
        SessionConfig::default(),
    )?;
    SESSION.with(|slot| slot.replace(Some(session)));
    Ok(settings)
}

fn update_setting(key: &str, value: Value) {
    SESSION.with(|slot| {
        if let Some(session) = slot.borrow().as_ref() {
            let mut patch = Map::new();
            patch.insert(key.to_string(), value);
            session.settings().update(Value::Object(patch));
        }
    });
}

fn open_preview_window() -> bool {
    SESSION.with(|slot| {
        let slot = slot.borrow();
        let Some(session) = slot.as_ref() else {
            return false;
        };
        let render = session.render_sync();
        if render.is_secondary_open() {
            render.refresh_secondary();
            return true;
        }
        match DetachedWindow::open() {
            Ok(window) => {
                render.attach_secondary(window);
                true
            }
            Err(err) => {
                tracing::warn!("could not open preview window: {err}");
                false
            }
        }
    })
}

#[component]
pub fn App() -> impl IntoView {
    let (settings, set_settings) = signal(Settings::default());
    let (preview_open, set_preview_open) = signal(false);

    Effect::new(move |_| match start_session() {
        Ok(store) => {
            set_settings.set(store.get());
            // Registered for the page lifetime; the handle is only needed to unsubscribe.
            let _subscription =
                store.subscribe(move |snapshot| set_settings.set(snapshot.clone()));
        }
        Err(err) => tracing::error!("playground failed to start: {err}"),
    });

    let panes = Pane::ALL
        .iter()
        .map(|pane| view! { <div class="editor" id=pane.dom_id()></div> })
        .collect::<Vec<_>>();

    view! {
        <main class="playground">
            <aside class="settings">
                <label>
                    "Font size"
                    <input type="number" min="8" max="40"
                        prop:value=move || settings.get().font_size().to_string()
                        on:input=move |e| {
                            if let Ok(size) = event_target_value(&e).parse::<u32>() {
                                update_setting("fontSize", json!(size));
                            }
                        } />
                </label>
                <label>
                    "Font family"
                    <input type="text"
                        prop:value=move || settings.get().font_family().unwrap_or_default().to_string()
                        on:change=move |e| update_setting("fontFamily", json!(event_target_value(&e))) />
                </label>
                <label>
                    "Theme"
                    <select
                        prop:value=move || settings.get().theme().to_string()
                        on:change=move |e| update_setting("theme", json!(event_target_value(&e)))>
                        <option value="vs-dark">"Dark"</option>
                        <option value="vs">"Light"</option>
                        <option value="hc-black">"High contrast"</option>
                    </select>
                </label>
                <label>
                    "Line numbers"
                    <select
                        prop:value=move || settings.get().line_numbers().to_string()
                        on:change=move |e| update_setting("lineNumbers", json!(event_target_value(&e)))>
                        <option value="off">"Off"</option>
                        <option value="on">"On"</option>
                    </select>
                </label>
                <label>
                    "Word wrap"
                    <select
                        prop:value=move || settings.get().word_wrap().to_string()
                        on:change=move |e| update_setting("wordWrap", json!(event_target_value(&e)))>
                        <option value="on">"On"</option>
                        <option value="off">"Off"</option>
                    </select>
                </label>
                <label>
                    <input type="checkbox"
                        prop:checked=move || settings.get().minimap()
                        on:change=move |e| update_setting("minimap", json!(event_target_checked(&e))) />
                    "Minimap"
                </label>
                <label>
                    <input type="checkbox"
                        prop:checked=move || settings.get().font_ligatures()
                        on:change=move |e| update_setting("fontLigatures", json!(event_target_checked(&e))) />
                    "Ligatures"
                </label>
                <button on:click=move |_| set_preview_open.set(open_preview_window())>
                    {move || if preview_open.get() { "Refresh preview window" } else { "Open preview window" }}
                </button>
            </aside>
            {panes}
            <iframe id=PREVIEW_FRAME_ID class="preview" sandbox="allow-scripts allow-modals allow-forms"></iframe>
        </main>
    }
}
