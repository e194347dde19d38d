//! # Blueprint Markup
//!
//! Text-level transforms between a canvas and the people editing it:
//!
//! - [`html`]: strict fragment parser over the html5ever tokenizer, compact and
//!   pretty serializers
//! - [`fragment`]: strips document shells down to a body fragment
//! - [`css`]: canvas noise-rule filtering, plus cssparser-driven validation and
//!   pretty printing
//! - [`document`]: per-page render documents
//!
//! Nothing here knows about canvases or pages; the editor crate composes these
//! transforms for its code view and save path.

pub mod css;
pub mod document;
pub mod error;
pub mod fragment;
pub mod html;

pub use css::{pretty_css, strip_noise_rules, validate_css};
pub use document::{render_document, split_render_document};
pub use error::{ParseError, ParseResult};
pub use fragment::{format_fragment, sanitize_fragment};
pub use html::{parse_fragment, pretty_html, to_html, Attribute, Element, Node};
