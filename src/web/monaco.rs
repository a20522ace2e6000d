use leptos::prelude::document;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::WebError;
use crate::editor::{DisplayOptions, EditorFactory, EditorHandle, Pane};

#[wasm_bindgen]
extern "C" {
    /// A `monaco.editor.IStandaloneCodeEditor` from the page's global `monaco`.
    pub type MonacoEditor;

    #[wasm_bindgen(catch, js_namespace = ["monaco", "editor"], js_name = create)]
    fn create(element: &web_sys::HtmlElement, options: &JsValue) -> Result<MonacoEditor, JsValue>;

    #[wasm_bindgen(method, js_name = getValue)]
    fn get_value(this: &MonacoEditor) -> String;

    #[wasm_bindgen(method, js_name = onDidChangeModelContent)]
    fn on_did_change_model_content(this: &MonacoEditor, listener: &Closure<dyn Fn(JsValue)>);

    #[wasm_bindgen(method, js_name = updateOptions)]
    fn update_options(this: &MonacoEditor, options: &JsValue);

    #[wasm_bindgen(method, js_name = getRawOptions)]
    fn get_raw_options(this: &MonacoEditor) -> JsValue;
}

fn to_js(options: &DisplayOptions) -> Result<JsValue, WebError> {
    options
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| WebError::Js(err.to_string()))
}

impl EditorHandle for MonacoEditor {
    fn text(&self) -> String {
        self.get_value()
    }

    fn on_text_changed(&self, callback: Box<dyn Fn()>) {
        let listener = Closure::<dyn Fn(JsValue)>::new(move |_event: JsValue| callback());
        self.on_did_change_model_content(&listener);
        // Listeners live as long as the page.
        listener.forget();
    }

    fn apply_display_options(&self, options: &DisplayOptions) {
        let options = match to_js(options) {
            Ok(options) => options,
            Err(err) => {
                tracing::warn!("skipping editor option update: {err}");
                return;
            }
        };
        let Some(raw) = self.get_raw_options().dyn_into::<js_sys::Object>().ok() else {
            self.update_options(&options);
            return;
        };
        let merged = js_sys::Object::assign2(&js_sys::Object::new(), &raw, options.unchecked_ref());
        self.update_options(&merged);
    }
}

pub struct MonacoFactory;

impl EditorFactory for MonacoFactory {
    type Editor = MonacoEditor;
    type Error = WebError;

    fn create_editor(
        &self,
        pane: Pane,
        initial_text: &str,
        options: &DisplayOptions,
    ) -> Result<MonacoEditor, WebError> {
        let element = document()
            .get_element_by_id(pane.dom_id())
            .and_then(|element| element.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or(WebError::MissingElement(pane.dom_id()))?;

        let options = to_js(options)?;
        js_sys::Reflect::set(&options, &"value".into(), &initial_text.into())?;
        js_sys::Reflect::set(&options, &"language".into(), &pane.language().into())?;
        Ok(create(&element, &options)?)
    }
}
