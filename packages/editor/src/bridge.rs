//! # Source Synchronization Bridge
//!
//! Moves the current page between the canvas and the code view. Extracting
//! strips document shells and noise rules and pretty-prints both halves;
//! applying runs the same shell stripping on the edited markup and loads it
//! back all-or-nothing.

use crate::engine::{CanvasEngine, EngineError};
use crate::errors::{EditorError, EditorResult};
use blueprint_markup::{format_fragment, parse_fragment, pretty_css, sanitize_fragment, strip_noise_rules};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Editable text form of one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceView {
    pub html: String,
    pub css: String,
}

#[derive(Debug, Clone)]
pub struct SourceBridge {
    indent: String,
}

fn load_source(engine: &mut dyn CanvasEngine, html: &str, css: &str) -> Result<(), EngineError> {
    engine.set_components(html)?;
    engine.set_style(css)
}

impl SourceBridge {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    pub fn extract(&self, engine: &dyn CanvasEngine) -> EditorResult<SourceView> {
        let html = format_fragment(&engine.html(), &self.indent)?;
        let css = pretty_css(&strip_noise_rules(&engine.css()), &self.indent);
        Ok(SourceView { html, css })
    }

    /// Replace the current page with edited source. On failure the canvas
    /// keeps exactly what it showed before.
    pub fn apply(&self, engine: &mut dyn CanvasEngine, view: &SourceView) -> EditorResult<()> {
        let html = sanitize_fragment(&view.html);
        parse_fragment(&html).map_err(|err| EditorError::Apply(err.into()))?;

        let previous_html = engine.html();
        let previous_css = strip_noise_rules(&engine.css());

        if let Err(err) = load_source(engine, &html, &view.css) {
            if let Err(restore) = load_source(engine, &previous_html, &previous_css) {
                warn!(error = %restore, "Failed to restore canvas after rejected source");
            }
            return Err(EditorError::Apply(err));
        }

        engine.refresh();
        debug!(html_len = html.len(), css_len = view.css.len(), "Applied edited source");
        Ok(())
    }
}

impl Default for SourceBridge {
    fn default() -> Self {
        Self::new("  ")
    }
}
