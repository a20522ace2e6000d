//! In-memory stand-ins for the browser collaborators.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::editor::{DisplayOptions, EditorFactory, EditorHandle, Pane};
use crate::render::{PreviewSurface, RenderTargetUnavailable};
use crate::session::UrlSurface;
use crate::settings::{Settings, SettingsPersistence};

#[derive(Clone, Default)]
pub struct FakeEditor {
    inner: Rc<FakeEditorInner>,
}

#[derive(Default)]
struct FakeEditorInner {
    text: RefCell<String>,
    listeners: RefCell<Vec<Box<dyn Fn()>>>,
    applied: RefCell<Vec<DisplayOptions>>,
}

impl FakeEditor {
    /// Simulates typing: replaces the buffer and fires change listeners.
    pub fn set_text(&self, text: &str) {
        self.set_text_silently(text);
        for listener in self.inner.listeners.borrow().iter() {
            listener();
        }
    }

    pub fn set_text_silently(&self, text: &str) {
        self.inner.text.replace(text.to_string());
    }

    pub fn applied(&self) -> Vec<DisplayOptions> {
        self.inner.applied.borrow().clone()
    }
}

impl EditorHandle for FakeEditor {
    fn text(&self) -> String {
        self.inner.text.borrow().clone()
    }

    fn on_text_changed(&self, callback: Box<dyn Fn()>) {
        self.inner.listeners.borrow_mut().push(callback);
    }

    fn apply_display_options(&self, options: &DisplayOptions) {
        self.inner.applied.borrow_mut().push(options.clone());
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MissingPane(pub Pane);

#[derive(Default)]
pub struct FakeFactory {
    created: RefCell<Vec<(Pane, FakeEditor, DisplayOptions)>>,
    fail_on: Option<Pane>,
}

impl FakeFactory {
    pub fn failing_on(pane: Pane) -> Self {
        Self {
            fail_on: Some(pane),
            ..Self::default()
        }
    }

    pub fn editor(&self, pane: Pane) -> FakeEditor {
        self.created
            .borrow()
            .iter()
            .find(|(created, _, _)| *created == pane)
            .map(|(_, editor, _)| editor.clone())
            .unwrap_or_else(|| panic!("no editor created for {pane:?}"))
    }

    pub fn creation_options(&self, pane: Pane) -> DisplayOptions {
        self.created
            .borrow()
            .iter()
            .find(|(created, _, _)| *created == pane)
            .map(|(_, _, options)| options.clone())
            .unwrap_or_else(|| panic!("no editor created for {pane:?}"))
    }
}

impl EditorFactory for FakeFactory {
    type Editor = FakeEditor;
    type Error = MissingPane;

    fn create_editor(
        &self,
        pane: Pane,
        initial_text: &str,
        options: &DisplayOptions,
    ) -> Result<FakeEditor, MissingPane> {
        if self.fail_on == Some(pane) {
            return Err(MissingPane(pane));
        }
        let editor = FakeEditor::default();
        editor.set_text_silently(initial_text);
        self.created
            .borrow_mut()
            .push((pane, editor.clone(), options.clone()));
        Ok(editor)
    }
}

pub struct MemoryUrl {
    token: RefCell<Option<String>>,
    replacements: Cell<usize>,
}

impl MemoryUrl {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: RefCell::new(token.map(str::to_string)),
            replacements: Cell::new(0),
        }
    }

    pub fn replacements(&self) -> usize {
        self.replacements.get()
    }
}

impl UrlSurface for MemoryUrl {
    fn current_token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn replace_token(&self, token: &str) {
        self.token.replace(Some(token.to_string()));
        self.replacements.set(self.replacements.get() + 1);
    }
}

#[derive(Clone)]
pub struct RecordingSurface {
    inner: Rc<SurfaceState>,
}

struct SurfaceState {
    content: RefCell<Option<String>>,
    shows: Cell<usize>,
    open: Cell<bool>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            inner: Rc::new(SurfaceState {
                content: RefCell::new(None),
                shows: Cell::new(0),
                open: Cell::new(true),
            }),
        }
    }
}

impl RecordingSurface {
    pub fn content(&self) -> Option<String> {
        self.inner.content.borrow().clone()
    }

    pub fn shows(&self) -> usize {
        self.inner.shows.get()
    }

    pub fn close(&self) {
        self.inner.open.set(false);
    }
}

impl PreviewSurface for RecordingSurface {
    fn show(&self, document: &str) -> Result<(), RenderTargetUnavailable> {
        if !self.inner.open.get() {
            return Err(RenderTargetUnavailable);
        }
        self.inner.content.replace(Some(document.to_string()));
        self.inner.shows.set(self.inner.shows.get() + 1);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.open.get()
    }
}

#[derive(Clone, Default)]
pub struct MemoryPersistence {
    stored: Rc<RefCell<Option<Settings>>>,
}

impl MemoryPersistence {
    pub fn with(value: Value) -> Self {
        let settings = serde_json::from_value(value).ok();
        Self {
            stored: Rc::new(RefCell::new(settings)),
        }
    }

    pub fn saved(&self) -> Option<Settings> {
        self.stored.borrow().clone()
    }
}

impl SettingsPersistence for MemoryPersistence {
    fn load(&self) -> Option<Settings> {
        self.stored.borrow().clone()
    }

    fn save(&self, settings: &Settings) {
        self.stored.replace(Some(settings.clone()));
    }
}
