use std::cell::RefCell;

use thiserror::Error;

/// The surface has gone away (e.g. the user closed the preview window).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("preview surface is no longer open")]
pub struct RenderTargetUnavailable;

pub trait PreviewSurface {
    /// Replaces the surface content with `document`.
    fn show(&self, document: &str) -> Result<(), RenderTargetUnavailable>;

    fn is_open(&self) -> bool {
        true
    }
}

/// Keeps the embedded preview and an optional detached preview showing the
/// same document.
pub struct RenderSync {
    primary: Box<dyn PreviewSurface>,
    secondary: RefCell<Option<Box<dyn PreviewSurface>>>,
    last_document: RefCell<Option<String>>,
}

impl RenderSync {
    pub fn new(primary: impl PreviewSurface + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: RefCell::new(None),
            last_document: RefCell::new(None),
        }
    }

    pub fn render(&self, document: &str) {
        if let Err(err) = self.primary.show(document) {
            tracing::warn!("embedded preview rejected document: {err}");
        }
        self.last_document.replace(Some(document.to_string()));
        self.push_secondary(document);
    }

    pub fn last_document(&self) -> Option<String> {
        self.last_document.borrow().clone()
    }

    /// Adopts a detached surface and shows it the current document.
    pub fn attach_secondary(&self, surface: impl PreviewSurface + 'static) {
        self.secondary.replace(Some(Box::new(surface)));
        self.refresh_secondary();
    }

    pub fn detach_secondary(&self) -> Option<Box<dyn PreviewSurface>> {
        self.secondary.take()
    }

    pub fn is_secondary_open(&self) -> bool {
        self.secondary
            .borrow()
            .as_ref()
            .is_some_and(|surface| surface.is_open())
    }

    pub fn refresh_secondary(&self) {
        let Some(document) = self.last_document() else {
            return;
        };
        self.push_secondary(&document);
    }

    fn push_secondary(&self, document: &str) {
        let mut secondary = self.secondary.borrow_mut();
        let Some(surface) = secondary.as_ref() else {
            return;
        };
        let shown = if surface.is_open() {
            surface.show(document)
        } else {
            Err(RenderTargetUnavailable)
        };
        if let Err(err) = shown {
            tracing::debug!("dropping detached preview: {err}");
            *secondary = None;
        }
    }
}
