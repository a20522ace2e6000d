use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Flat option map shared by every editor. Keys follow the editor's option
/// names; anything unknown is carried along untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Default for Settings {
    fn default() -> Self {
        let defaults = json!({
            "fontSize": 18,
            "lineNumbers": "off",
            "minimap": false,
            "theme": "vs-dark",
            "wordWrap": "on",
            "fontLigatures": true,
            "fontFamily": "'Cascadia Code PL', 'Menlo', 'Monaco', 'Courier New', 'monospace'",
        });
        match defaults {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn theme(&self) -> &str {
        self.str_or("theme", "vs-dark")
    }

    pub fn font_size(&self) -> u32 {
        self.0
            .get("fontSize")
            .and_then(Value::as_u64)
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(18)
    }

    pub fn line_numbers(&self) -> &str {
        self.str_or("lineNumbers", "off")
    }

    pub fn minimap(&self) -> bool {
        self.bool_or("minimap", false)
    }

    pub fn word_wrap(&self) -> &str {
        self.str_or("wordWrap", "on")
    }

    pub fn font_ligatures(&self) -> bool {
        self.bool_or("fontLigatures", true)
    }

    pub fn font_family(&self) -> Option<&str> {
        self.0.get("fontFamily").and_then(Value::as_str)
    }

    fn str_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.0.get(key).and_then(Value::as_str).unwrap_or(fallback)
    }

    fn bool_or(&self, key: &str, fallback: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(fallback)
    }

    fn merge(&mut self, partial: Map<String, Value>) {
        self.0.extend(partial);
    }
}

/// Where settings survive between visits.
pub trait SettingsPersistence {
    fn load(&self) -> Option<Settings>;
    fn save(&self, settings: &Settings);
}

type Callback = Rc<dyn Fn(&Settings)>;

pub struct SettingsStore {
    current: RefCell<Settings>,
    subscribers: RefCell<Vec<(u64, Callback)>>,
    next_id: Cell<u64>,
}

/// Handle returned by [`SettingsStore::subscribe`]. Dropping it keeps the
/// callback registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    store: Weak<SettingsStore>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Rc<Self> {
        Rc::new(Self {
            current: RefCell::new(initial),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    /// Defaults overlaid with whatever `persistence` remembers, saving every
    /// later snapshot back through it.
    pub fn restore(persistence: impl SettingsPersistence + 'static) -> Rc<Self> {
        let mut initial = Settings::default();
        if let Some(saved) = persistence.load() {
            initial.merge(saved.0);
        }
        let store = Self::new(initial);
        store.subscribe(move |snapshot| persistence.save(snapshot));
        store
    }

    pub fn get(&self) -> Settings {
        self.current.borrow().clone()
    }

    /// Shallow-merges `partial` (a JSON object) and notifies subscribers with
    /// the full result.
    ///
    /// Subscribers run synchronously. Calling `update` from inside one of
    /// them starts a nested round of notifications.
    pub fn update(&self, partial: Value) {
        let Value::Object(partial) = partial else {
            tracing::warn!("ignoring non-object settings update: {partial}");
            return;
        };
        let snapshot = {
            let mut current = self.current.borrow_mut();
            current.merge(partial);
            current.clone()
        };
        let subscribers: Vec<Callback> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        tracing::debug!(subscribers = subscribers.len(), "settings updated");
        for callback in subscribers {
            callback(&snapshot);
        }
    }

    pub fn subscribe(self: &Rc<Self>, callback: impl Fn(&Settings) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));
        Subscription {
            id,
            store: Rc::downgrade(self),
        }
    }
}
