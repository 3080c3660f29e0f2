//! Fallback pages for clients that prefer rendered HTML.

use std::collections::HashMap;
use std::fmt;

use failwire_model::ResponseStatus;
use http::StatusCode;

use crate::config::FallbackConfig;
use crate::Result;

/// Renders an error page.
pub trait PageRenderer: Send + Sync {
    /// HTML for `status`. `response_status` is the structured status the
    /// page replaces, when there is one.
    fn render(&self, status: StatusCode, response_status: Option<&ResponseStatus>) -> String;
}

/// A page with fixed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPage(pub String);

impl StaticPage {
    /// Create a page from its HTML.
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }
}

impl PageRenderer for StaticPage {
    fn render(&self, _status: StatusCode, _response_status: Option<&ResponseStatus>) -> String {
        self.0.clone()
    }
}

/// Global and per-status fallback pages.
#[derive(Default)]
pub struct FallbackPages {
    global: Option<Box<dyn PageRenderer>>,
    per_status: HashMap<StatusCode, Box<dyn PageRenderer>>,
}

impl fmt::Debug for FallbackPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<_> = self.per_status.keys().map(|s| s.as_u16()).collect();
        statuses.sort_unstable();
        f.debug_struct("FallbackPages")
            .field("global", &self.global.is_some())
            .field("per_status", &statuses)
            .finish()
    }
}

impl FallbackPages {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the static pages described by configuration. Pages already set
    /// for the same slot are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if a per-status key is not a status code. Nothing is
    /// changed in that case.
    pub fn apply_config(&mut self, config: &FallbackConfig) -> Result<()> {
        let status_pages = config.status_pages()?;
        if let Some(global) = &config.global {
            self.set_global(Box::new(StaticPage::new(global.as_str())));
        }
        for (status, html) in status_pages {
            self.set_status(status, Box::new(StaticPage::new(html)));
        }
        Ok(())
    }

    /// Set the page used when no per-status page matches.
    pub fn set_global(&mut self, renderer: Box<dyn PageRenderer>) {
        self.global = Some(renderer);
    }

    /// Set the page for one status code.
    pub fn set_status(&mut self, status: StatusCode, renderer: Box<dyn PageRenderer>) {
        self.per_status.insert(status, renderer);
    }

    /// Page for `status`: the per-status page, else the global one.
    pub fn resolve(&self, status: StatusCode) -> Option<&dyn PageRenderer> {
        self.per_status
            .get(&status)
            .or(self.global.as_ref())
            .map(|renderer| &**renderer)
    }

    /// Whether any page is configured.
    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.per_status.is_empty()
    }
}
