use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::settings::Settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pane {
    Markup,
    Style,
    Script,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Markup, Pane::Style, Pane::Script];

    /// Id of the element the pane's editor mounts into.
    pub fn dom_id(self) -> &'static str {
        match self {
            Pane::Markup => "html",
            Pane::Style => "css",
            Pane::Script => "js",
        }
    }

    pub fn language(self) -> &'static str {
        match self {
            Pane::Markup => "html",
            Pane::Style => "css",
            Pane::Script => "javascript",
        }
    }
}

/// Options in the shape the editor widget understands.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DisplayOptions(Map<String, Value>);

impl DisplayOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut options = settings.as_map().clone();
        options.insert("minimap".into(), json!({ "enabled": settings.minimap() }));
        Self(options)
    }

    /// Options for a freshly created editor: the settings plus fixed layout
    /// behaviour.
    pub fn initial(settings: &Settings) -> Self {
        let mut options = Self::from_settings(settings);
        let fixed = [
            ("automaticLayout", json!(true)),
            ("fixedOverflowWidgets", json!(true)),
            ("scrollBeyondLastLine", json!(false)),
            ("roundedSelection", json!(false)),
            ("padding", json!({ "top": 16 })),
        ];
        for (key, value) in fixed {
            options.0.insert(key.into(), value);
        }
        options
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// A live editor owned by the widget library.
pub trait EditorHandle {
    fn text(&self) -> String;

    fn on_text_changed(&self, callback: Box<dyn Fn()>);

    fn apply_display_options(&self, options: &DisplayOptions);
}

pub trait EditorFactory {
    type Editor: EditorHandle + 'static;
    type Error;

    fn create_editor(
        &self,
        pane: Pane,
        initial_text: &str,
        options: &DisplayOptions,
    ) -> Result<Self::Editor, Self::Error>;
}
