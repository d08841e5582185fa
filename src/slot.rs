//! # Stage: SlotViewController
//!
//! ## Responsibility
//! Per-slot `Code` ⇄ `Preview` state machine. Stores model outputs and edited
//! code, and drives classify → build → registry swap whenever a slot enters
//! or refreshes its preview.
//!
//! ## Guarantees
//! - Every operation returns a [`Transition`]; failures are attached to the
//!   slot as a [`SlotError`] and never propagated
//! - A slot only reaches `Preview` holding a live handle
//! - A build failure keeps the slot's previous preview
//! - Removing slots releases their resources regardless of state
//! - Slot *i*'s pipeline never reads or mutates slot *j*
//!
//! ## NOT Responsible For
//! - Fetching model outputs
//! - Rendering (the UI loads [`Slot::handle`] into an isolated frame)

use serde::{Deserialize, Serialize};

use crate::classifier::{self, ExtractedContent};
use crate::error::SlotError;
use crate::host::{RenderHandle, RenderResource};
use crate::language::Language;
use crate::preview::{build_preview_with, PreviewOptions};
use crate::registry::RenderResourceRegistry;

/// Upper bound on simultaneous comparison slots.
pub const MAX_SLOTS: usize = 9;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Code,
    Preview,
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(ViewMode::Code),
            "preview" => Ok(ViewMode::Preview),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Code => write!(f, "code"),
            ViewMode::Preview => write!(f, "preview"),
        }
    }
}

/// A model output exactly as received, with the language in force.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    pub text: Option<String>,
    pub language: Language,
}

/// Outcome of one controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Code → Preview.
    EnteredPreview,
    /// Preview → Preview with a fresh handle.
    Refreshed,
    /// Preview → Code.
    LeftPreview,
    /// Content stored without touching the preview.
    Stored,
    Unchanged,
    Aborted(SlotError),
}

impl Transition {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Transition::Aborted(_))
    }
}

/// One comparison pane.
#[derive(Debug, Clone)]
pub struct Slot {
    label: String,
    raw: RawOutput,
    code: String,
    mode: ViewMode,
    handle: Option<RenderHandle>,
    error: Option<SlotError>,
}

impl Slot {
    fn new(index: usize) -> Self {
        Self {
            label: default_label(index),
            raw: RawOutput::default(),
            code: String::new(),
            mode: ViewMode::Code,
            handle: None,
            error: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &RawOutput {
        &self.raw
    }

    /// Editor contents: the raw output until the user edits it.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> &Language {
        &self.raw.language
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn handle(&self) -> Option<&RenderHandle> {
        self.handle.as_ref()
    }

    pub fn error(&self) -> Option<&SlotError> {
        self.error.as_ref()
    }
}

fn default_label(index: usize) -> String {
    format!("Model {}", index + 1)
}

/// Serializable view of a slot for UIs and `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub label: String,
    pub language: Language,
    pub mode: ViewMode,
    pub code: String,
    pub explanation: String,
    pub preview_available: bool,
    pub preview_uri: Option<String>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the slots and the registry backing their previews.
#[derive(Debug)]
pub struct SlotViewController<H: RenderResource> {
    slots: Vec<Slot>,
    registry: RenderResourceRegistry<H>,
    options: PreviewOptions,
}

impl<H: RenderResource> SlotViewController<H> {
    /// `count` is clamped to `1..=MAX_SLOTS`.
    pub fn new(count: usize, host: H) -> Self {
        Self::with_options(count, host, PreviewOptions::default())
    }

    pub fn with_options(count: usize, host: H, options: PreviewOptions) -> Self {
        let count = count.clamp(1, MAX_SLOTS);
        Self {
            slots: (0..count).map(Slot::new).collect(),
            registry: RenderResourceRegistry::new(host),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn registry(&self) -> &RenderResourceRegistry<H> {
        &self.registry
    }

    pub fn set_label(&mut self, index: usize, label: impl Into<String>) -> Transition {
        let Some(slot) = self.slot_mut(index) else {
            return Transition::Unchanged;
        };
        slot.label = label.into();
        Transition::Stored
    }

    /// A new model response for slot `index`. Replaces the editor contents
    /// and refreshes the preview if the slot is showing one.
    pub fn receive_output(
        &mut self,
        index: usize,
        text: Option<&str>,
        language: &Language,
    ) -> Transition {
        let Some(slot) = self.slot_mut(index) else {
            return Transition::Unchanged;
        };
        slot.raw = RawOutput {
            text: text.map(str::to_string),
            language: language.clone(),
        };
        slot.code = text.unwrap_or_default().to_string();
        slot.error = None;
        tracing::debug!(slot = index, %language, bytes = slot.code.len(), "received output");

        if slot.mode == ViewMode::Preview {
            self.render(index)
        } else {
            Transition::Stored
        }
    }

    /// Replace the editor contents of slot `index`.
    pub fn edit_code(&mut self, index: usize, code: &str) -> Transition {
        let Some(slot) = self.slot_mut(index) else {
            return Transition::Unchanged;
        };
        if slot.code == code {
            return Transition::Unchanged;
        }
        slot.code = code.to_string();

        if slot.mode == ViewMode::Preview {
            self.render(index)
        } else {
            Transition::Stored
        }
    }

    /// Switch slot `index` to `mode`.
    pub fn request_view(&mut self, index: usize, mode: ViewMode) -> Transition {
        let Some(slot) = self.slot_mut(index) else {
            return Transition::Unchanged;
        };
        match (slot.mode, mode) {
            (ViewMode::Code, ViewMode::Code) | (ViewMode::Preview, ViewMode::Preview) => {
                Transition::Unchanged
            }
            (ViewMode::Code, ViewMode::Preview) => self.render(index),
            (ViewMode::Preview, ViewMode::Code) => {
                self.leave_preview(index);
                Transition::LeftPreview
            }
        }
    }

    /// Change the number of slots. Removed slots are released whatever
    /// their state.
    pub fn resize(&mut self, count: usize) -> Transition {
        let count = count.clamp(1, MAX_SLOTS);
        let before = self.slots.len();
        if count == before {
            return Transition::Unchanged;
        }

        for index in count..before {
            self.registry.release(index);
        }
        self.slots.truncate(count);
        for index in before..count {
            self.slots.push(Slot::new(index));
        }
        tracing::debug!(from = before, to = count, "resized comparison");
        Transition::Stored
    }

    /// Release every resource and return all slots to `Code`.
    pub fn unmount(&mut self) -> Transition {
        let mut any = false;
        for slot in &mut self.slots {
            any |= slot.mode == ViewMode::Preview;
            slot.mode = ViewMode::Code;
            slot.handle = None;
        }
        self.registry.flush();
        if any {
            Transition::LeftPreview
        } else {
            Transition::Unchanged
        }
    }

    /// Forwarded to the registry once the UI has loaded a render cycle.
    pub fn finish_render_cycle(&mut self) -> usize {
        self.registry.finish_render_cycle()
    }

    /// Code and explanation of slot `index`, recomputed on every call.
    pub fn extracted(&self, index: usize) -> Option<ExtractedContent> {
        self.slots
            .get(index)
            .map(|slot| classifier::classify(Some(&slot.code), &slot.raw.language))
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let extracted = classifier::classify(Some(&slot.code), &slot.raw.language);
                SlotSnapshot {
                    index,
                    label: slot.label.clone(),
                    language: slot.raw.language.clone(),
                    mode: slot.mode,
                    code: extracted.code,
                    explanation: extracted.explanation,
                    preview_available: slot.raw.language.supports_preview(),
                    preview_uri: slot.handle.as_ref().map(|h| h.uri.clone()),
                    error: slot.error.as_ref().map(ToString::to_string),
                }
            })
            .collect()
    }

    // -- internals ----------------------------------------------------------

    fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index);
        if slot.is_none() {
            tracing::warn!(slot = index, slots = len, "ignoring operation on unknown slot");
        }
        slot
    }

    /// Run the full pipeline for `index` and apply the result.
    fn render(&mut self, index: usize) -> Transition {
        let was_preview = self.slots[index].mode == ViewMode::Preview;

        match self.build_and_swap(index) {
            Ok(handle) => {
                let slot = &mut self.slots[index];
                slot.handle = Some(handle);
                slot.mode = ViewMode::Preview;
                slot.error = None;
                if was_preview {
                    tracing::debug!(slot = index, "refreshed preview");
                    Transition::Refreshed
                } else {
                    tracing::debug!(slot = index, "entered preview");
                    Transition::EnteredPreview
                }
            }
            Err(err) => {
                tracing::warn!(slot = index, error = %err, "preview aborted");
                if was_preview && !err.keeps_previous_preview() {
                    self.leave_preview(index);
                }
                self.slots[index].error = Some(err.clone());
                Transition::Aborted(err)
            }
        }
    }

    fn build_and_swap(&mut self, index: usize) -> Result<RenderHandle, SlotError> {
        let slot = &self.slots[index];
        let language = &slot.raw.language;

        if !language.supports_preview() {
            return Err(SlotError::PreviewUnsupported {
                language: language.to_string(),
            });
        }
        if slot.code.trim().is_empty() {
            return Err(SlotError::NothingToPreview);
        }

        let extracted = classifier::classify(Some(&slot.code), language);
        if extracted.is_empty() {
            return Err(SlotError::NothingToPreview);
        }
        let doc = build_preview_with(&extracted.code, language, &self.options)
            .ok_or(SlotError::NothingToPreview)?;

        self.registry
            .set(index, slot.handle.as_ref(), &doc)
            .map_err(|e| SlotError::BuildFailure {
                message: e.to_string(),
            })
    }

    fn leave_preview(&mut self, index: usize) {
        self.registry.release(index);
        let slot = &mut self.slots[index];
        slot.mode = ViewMode::Code;
        slot.handle = None;
        tracing::debug!(slot = index, "left preview");
    }
}
