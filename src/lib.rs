//! Output interpretation and preview pipeline for comparing generated code
//! side by side.
//!
//! Raw model output flows through four stages:
//!
//! 1. [`classifier`] splits it into code and explanation
//! 2. [`preview`] turns the code into a self-contained document
//! 3. [`registry`] owns the revocable render handle for each slot
//! 4. [`slot`] drives the per-slot code/preview state machine
//!
//! ```
//! use model_compare::host::MemoryHost;
//! use model_compare::language::Language;
//! use model_compare::slot::{SlotViewController, Transition, ViewMode};
//!
//! let mut slots = SlotViewController::new(2, MemoryHost::new());
//! slots.receive_output(0, Some("Here is the code:\n```html\n<button>Hi</button>\n```"), &Language::Markup);
//! assert_eq!(slots.request_view(0, ViewMode::Preview), Transition::EnteredPreview);
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod language;
pub mod logging;
pub mod preview;
pub mod registry;
pub mod report;
pub mod slot;
pub mod web;

pub use classifier::{classify, ExtractedContent};
pub use error::{Error, HostError, PreviewError, Result, SlotError};
pub use host::{DataUrlHost, MemoryHost, RenderHandle, RenderResource};
pub use language::Language;
pub use preview::{build_preview, build_preview_with, PreviewDocument, PreviewOptions};
pub use registry::RenderResourceRegistry;
pub use slot::{SlotViewController, Transition, ViewMode};
