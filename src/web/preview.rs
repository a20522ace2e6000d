use leptos::prelude::{document, window};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlIFrameElement, Window};

use super::WebError;
use crate::render::{PreviewSurface, RenderTargetUnavailable};

/// The always-present preview frame, fed through `srcdoc`.
pub struct FrameSurface {
    frame: HtmlIFrameElement,
}

impl FrameSurface {
    pub fn find(id: &'static str) -> Result<Self, WebError> {
        let frame = document()
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlIFrameElement>().ok())
            .ok_or(WebError::MissingElement(id))?;
        Ok(Self { frame })
    }
}

impl PreviewSurface for FrameSurface {
    fn show(&self, document: &str) -> Result<(), RenderTargetUnavailable> {
        self.frame.set_srcdoc(document);
        Ok(())
    }
}

/// A preview popped out into its own browser window.
pub struct DetachedWindow {
    window: Window,
}

impl DetachedWindow {
    pub fn open() -> Result<Self, WebError> {
        let window = window()
            .open_with_url_and_target("", "playpen-preview")?
            .ok_or_else(|| WebError::Js("popup blocked".to_string()))?;
        Ok(Self { window })
    }
}

impl PreviewSurface for DetachedWindow {
    fn show(&self, content: &str) -> Result<(), RenderTargetUnavailable> {
        let Some(document) = self.window.document() else {
            return Err(RenderTargetUnavailable);
        };
        let written = document.open().and_then(|document| {
            document.write(&js_sys::Array::of1(&JsValue::from_str(content)))?;
            document.close()
        });
        written.map_err(|_| RenderTargetUnavailable)
    }

    fn is_open(&self) -> bool {
        !self.window.closed().unwrap_or(true)
    }
}
