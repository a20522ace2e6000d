//! Startup and steady-state wiring between the editors, the preview and the
//! address bar.

use std::rc::{Rc, Weak};

use crate::codec::{decode_or_empty, encode, EncodeError, SourceBundle};
use crate::compose::compose;
use crate::debounce::{debounce, TimerHost};
use crate::editor::{DisplayOptions, EditorFactory, EditorHandle, Pane};
use crate::render::RenderSync;
use crate::settings::{Settings, SettingsStore, Subscription};

/// The page address, reduced to the single path segment holding the token.
pub trait UrlSurface {
    fn current_token(&self) -> Option<String>;

    /// Swaps the token in place without adding a history entry.
    fn replace_token(&self, token: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub render_delay_ms: u32,
    pub persist_delay_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_delay_ms: 200,
            persist_delay_ms: 1000,
        }
    }
}

pub struct Editors<E> {
    markup: E,
    style: E,
    script: E,
}

impl<E: EditorHandle> Editors<E> {
    pub fn get(&self, pane: Pane) -> &E {
        match pane {
            Pane::Markup => &self.markup,
            Pane::Style => &self.style,
            Pane::Script => &self.script,
        }
    }

    /// Reads the three buffers as they are right now.
    pub fn bundle(&self) -> SourceBundle {
        SourceBundle {
            markup: self.markup.text(),
            style: self.style.text(),
            script: self.script.text(),
        }
    }

    fn all(&self) -> [&E; 3] {
        [&self.markup, &self.style, &self.script]
    }
}

pub struct Session<E: EditorHandle> {
    editors: Rc<Editors<E>>,
    render: Rc<RenderSync>,
    settings: Rc<SettingsStore>,
    settings_subscription: Option<Subscription>,
}

impl<E: EditorHandle + 'static> Session<E> {
    /// Restores the bundle from the URL, creates the editors and goes live.
    /// The session only exists once it is live; loading happens in here.
    pub fn start<F, U, H>(
        factory: &F,
        url: Rc<U>,
        render: Rc<RenderSync>,
        settings: Rc<SettingsStore>,
        timers: H,
        config: SessionConfig,
    ) -> Result<Self, F::Error>
    where
        F: EditorFactory<Editor = E>,
        U: UrlSurface + 'static,
        H: TimerHost,
    {
        let initial = url
            .current_token()
            .filter(|token| !token.is_empty())
            .map(|token| decode_or_empty(&token))
            .unwrap_or_default();
        tracing::info!(restored = !initial.is_empty(), "loading session");

        let options = DisplayOptions::initial(&settings.get());
        let editors = Rc::new(Editors {
            markup: factory.create_editor(Pane::Markup, &initial.markup, &options)?,
            style: factory.create_editor(Pane::Style, &initial.style, &options)?,
            script: factory.create_editor(Pane::Script, &initial.script, &options)?,
        });
        render.render(&compose(&initial));

        let refresh_preview = {
            let editors = Rc::downgrade(&editors);
            let render = Rc::clone(&render);
            debounce(
                move |()| {
                    let Some(editors) = editors.upgrade() else {
                        return;
                    };
                    tracing::debug!("refreshing preview");
                    render.render(&compose(&editors.bundle()));
                },
                config.render_delay_ms,
                timers.clone(),
            )
        };
        let persist_url = {
            let editors = Rc::downgrade(&editors);
            debounce(
                move |()| {
                    let Some(editors) = editors.upgrade() else {
                        return;
                    };
                    match encode(&editors.bundle()) {
                        Ok(token) => {
                            tracing::debug!(len = token.len(), "persisting bundle to url");
                            url.replace_token(&token);
                        }
                        // Keep the last token that still decodes.
                        Err(err) => tracing::warn!("not persisting bundle to url: {err}"),
                    }
                },
                config.persist_delay_ms,
                timers,
            )
        };
        for editor in editors.all() {
            let refresh_preview = refresh_preview.clone();
            let persist_url = persist_url.clone();
            editor.on_text_changed(Box::new(move || {
                refresh_preview.call(());
                persist_url.call(());
            }));
        }

        let settings_subscription = settings.subscribe(fan_out(Rc::downgrade(&editors)));

        tracing::info!("session live");
        Ok(Self {
            editors,
            render,
            settings,
            settings_subscription: Some(settings_subscription),
        })
    }

    pub fn editor(&self, pane: Pane) -> &E {
        self.editors.get(pane)
    }

    pub fn bundle(&self) -> SourceBundle {
        self.editors.bundle()
    }

    pub fn render_sync(&self) -> &Rc<RenderSync> {
        &self.render
    }

    pub fn settings(&self) -> &Rc<SettingsStore> {
        &self.settings
    }

    /// Path for a share link reflecting the buffers at this instant.
    pub fn share_path(&self) -> Result<String, EncodeError> {
        Ok(format!("/{}", encode(&self.bundle())?))
    }
}

impl<E: EditorHandle> Drop for Session<E> {
    fn drop(&mut self) {
        if let Some(subscription) = self.settings_subscription.take() {
            subscription.unsubscribe();
        }
    }
}

fn fan_out<E: EditorHandle + 'static>(
    editors: Weak<Editors<E>>,
) -> impl Fn(&Settings) + 'static {
    move |snapshot| {
        let Some(editors) = editors.upgrade() else {
            return;
        };
        let options = DisplayOptions::from_settings(snapshot);
        for editor in editors.all() {
            editor.apply_display_options(&options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::VirtualTimers;
    use crate::test_support::{FakeFactory, MemoryUrl, MissingPane, RecordingSurface};
    use serde_json::json;

    struct Harness {
        session: Session<crate::test_support::FakeEditor>,
        factory: FakeFactory,
        url: Rc<MemoryUrl>,
        frame: RecordingSurface,
        timers: VirtualTimers,
    }

    impl Harness {
        fn start(token: Option<&str>) -> Self {
            let factory = FakeFactory::default();
            let url = Rc::new(MemoryUrl::new(token));
            let frame = RecordingSurface::default();
            let timers = VirtualTimers::new();
            let session = Session::start(
                &factory,
                Rc::clone(&url),
                Rc::new(RenderSync::new(frame.clone())),
                SettingsStore::new(Settings::default()),
                timers.clone(),
                SessionConfig::default(),
            )
            .unwrap();
            Self {
                session,
                factory,
                url,
                frame,
                timers,
            }
        }
    }

    #[test]
    fn starts_empty_without_token() {
        let h = Harness::start(None);

        assert_eq!(h.session.bundle(), SourceBundle::default());
        let doc = h.frame.content().unwrap();
        assert!(doc.contains("<style></style>"));
        assert!(doc.contains("<body>\n\n<script"));
        assert!(doc.contains("<script type=\"module\"></script>"));
    }

    #[test]
    fn malformed_token_starts_empty() {
        let h = Harness::start(Some("definitely-not-a-token"));

        assert_eq!(h.session.bundle(), SourceBundle::default());
        assert_eq!(h.frame.content(), Some(compose(&SourceBundle::default())));
        assert_eq!(h.url.replacements(), 0);
    }

    #[test]
    fn restores_editors_from_token() {
        let bundle = SourceBundle::new("<h1>saved</h1>", "h1{}", "alert(1)");
        let h = Harness::start(Some(encode(&bundle).unwrap().as_str()));

        assert_eq!(h.factory.editor(Pane::Markup).text(), "<h1>saved</h1>");
        assert_eq!(h.factory.editor(Pane::Script).text(), "alert(1)");
        assert_eq!(h.frame.content(), Some(compose(&bundle)));
    }

    #[test]
    fn edits_render_after_fast_debounce() {
        let h = Harness::start(None);

        h.factory.editor(Pane::Markup).set_text("<p>hi</p>");
        h.factory.editor(Pane::Style).set_text("p{color:red}");
        h.factory.editor(Pane::Script).set_text("console.log(1)");
        h.timers.advance(199);
        assert_eq!(h.frame.shows(), 1);

        h.timers.advance(1);
        assert_eq!(h.frame.shows(), 2);
        let doc = h.frame.content().unwrap();
        assert!(doc.contains("<style>p{color:red}</style>"));
        assert!(doc.contains("<body>\n<p>hi</p>\n"));
        assert!(doc.contains("<script type=\"module\">console.log(1)</script>"));
    }

    #[test]
    fn url_follows_on_slow_debounce() {
        let h = Harness::start(None);

        h.factory.editor(Pane::Markup).set_text("<b>x</b>");
        h.timers.advance(500);
        assert_eq!(h.url.replacements(), 0);

        h.factory.editor(Pane::Script).set_text("let a = 1");
        h.timers.advance(999);
        assert_eq!(h.url.replacements(), 0);
        h.timers.advance(1);

        assert_eq!(h.url.replacements(), 1);
        let token = h.url.current_token().unwrap();
        assert_eq!(
            crate::codec::decode(&token).unwrap(),
            SourceBundle::new("<b>x</b>", "", "let a = 1")
        );
    }

    #[test]
    fn uses_state_visible_when_timer_fires() {
        let h = Harness::start(None);
        let markup = h.factory.editor(Pane::Markup);

        markup.set_text("first");
        markup.set_text_silently("second");
        h.timers.advance(200);

        assert!(h.frame.content().unwrap().contains("second"));
    }

    #[test]
    fn settings_fan_out_to_every_editor() {
        let h = Harness::start(None);

        h.session.settings().update(json!({ "minimap": true, "theme": "vs" }));

        for pane in Pane::ALL {
            let applied = h.factory.editor(pane).applied();
            let last = applied.last().unwrap();
            assert_eq!(last.get("minimap"), Some(&json!({ "enabled": true })));
            assert_eq!(last.get("theme"), Some(&json!("vs")));
        }
    }

    #[test]
    fn dropped_session_stops_listening() {
        let h = Harness::start(None);
        let settings = Rc::clone(h.session.settings());
        let markup = h.factory.editor(Pane::Markup);
        let applied_before = markup.applied().len();

        drop(h.session);
        settings.update(json!({ "theme": "vs" }));
        h.timers.advance(5_000);

        assert_eq!(markup.applied().len(), applied_before);
        assert_eq!(h.frame.shows(), 1);
    }

    #[test]
    fn editors_receive_initial_options() {
        let h = Harness::start(None);
        let options = h.factory.creation_options(Pane::Style);
        assert_eq!(options.get("automaticLayout"), Some(&json!(true)));
        assert_eq!(options.get("theme"), Some(&json!("vs-dark")));
    }

    #[test]
    fn share_path_encodes_current_buffers() {
        let h = Harness::start(None);
        h.factory.editor(Pane::Style).set_text("body{margin:0}");

        let path = h.session.share_path().unwrap();
        let token = path.strip_prefix('/').unwrap();
        assert_eq!(
            crate::codec::decode(token).unwrap(),
            SourceBundle::new("", "body{margin:0}", "")
        );
    }

    #[test]
    fn oversized_bundle_keeps_last_persisted_token() {
        let h = Harness::start(None);
        let script = h.factory.editor(Pane::Script);

        script.set_text("let small = 1");
        h.timers.advance(1_000);
        assert_eq!(h.url.replacements(), 1);
        let saved = h.url.current_token().unwrap();

        script.set_text(&"a".repeat(crate::codec::MAX_FRAME_LEN));
        h.timers.advance(1_000);

        assert_eq!(h.url.replacements(), 1);
        assert_eq!(h.url.current_token(), Some(saved));
        assert!(matches!(
            h.session.share_path(),
            Err(EncodeError::TooLarge(_))
        ));
    }

    #[test]
    fn editor_creation_failure_is_reported() {
        let factory = FakeFactory::failing_on(Pane::Style);
        let result = Session::start(
            &factory,
            Rc::new(MemoryUrl::new(None)),
            Rc::new(RenderSync::new(RecordingSurface::default())),
            SettingsStore::new(Settings::default()),
            VirtualTimers::new(),
            SessionConfig::default(),
        );
        assert!(matches!(result, Err(MissingPane(Pane::Style))));
    }
}
