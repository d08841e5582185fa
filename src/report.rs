//! Terminal and file output for one-shot comparisons.

use std::io::Read;
use std::path::{Path, PathBuf};

use colored::*;

use crate::error::{Error, Result};
use crate::host::{MemoryHost, RenderResource};
use crate::language::Language;
use crate::slot::{SlotViewController, Transition, ViewMode};

/// Read each input: a file path, or `-` for stdin (at most once).
pub fn read_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut stdin_used = false;
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input == "-" {
            if stdin_used {
                return Err(Error::config("stdin ('-') can only be read once"));
            }
            stdin_used = true;
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            out.push(buf);
        } else {
            out.push(std::fs::read_to_string(input)?);
        }
    }
    Ok(out)
}

/// Feed `outputs` into consecutive slots.
pub fn load_outputs<H: RenderResource>(
    controller: &mut SlotViewController<H>,
    outputs: &[String],
    language: &Language,
) {
    for (index, text) in outputs.iter().enumerate() {
        controller.receive_output(index, Some(text), language);
    }
}

/// Switch every slot with content to preview. Returns the transitions in
/// slot order.
pub fn preview_all<H: RenderResource>(controller: &mut SlotViewController<H>) -> Vec<Transition> {
    (0..controller.len())
        .map(|index| controller.request_view(index, ViewMode::Preview))
        .collect()
}

/// Pretty JSON snapshot of every slot.
pub fn render_json<H: RenderResource>(controller: &SlotViewController<H>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&controller.snapshot())?)
}

/// Human-readable comparison report.
pub fn render_terminal<H: RenderResource>(controller: &SlotViewController<H>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "MODEL COMPARE".bright_cyan().bold()));

    for (index, slot) in controller.slots().iter().enumerate() {
        let Some(extracted) = controller.extracted(index) else {
            continue;
        };
        out.push_str(&format!("{}\n", "=".repeat(50).bright_blue()));
        out.push_str(&format!(
            "{} {}  {}: {}\n",
            format!("[{}]", index + 1).bright_white(),
            slot.label().bright_yellow().bold(),
            "Language".bright_yellow(),
            slot.language()
        ));

        if !extracted.explanation.is_empty() {
            out.push_str(&format!("{}\n", extracted.explanation.bright_black()));
        }
        if extracted.code.is_empty() {
            out.push_str(&format!("{}\n", "(no code found)".bright_red()));
        } else {
            out.push_str(&extracted.code);
            out.push('\n');
        }

        match (slot.handle(), slot.error()) {
            (Some(handle), _) => out.push_str(&format!(
                "{}: {}\n",
                "Preview".bright_green(),
                handle.uri
            )),
            (None, Some(err)) => {
                out.push_str(&format!("{}: {}\n", "Preview".bright_red(), err))
            }
            (None, None) => {}
        }
    }
    out
}

/// Write the current preview document of every slot to `dir/slot-N.html`.
pub fn write_previews(
    controller: &SlotViewController<MemoryHost>,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let host = controller.registry().host();
    let mut written = Vec::new();
    for (index, slot) in controller.slots().iter().enumerate() {
        let Some(doc) = slot.handle().and_then(|h| host.resolve(h)) else {
            continue;
        };
        let path = dir.join(format!("slot-{}.html", index + 1));
        std::fs::write(&path, doc.as_str())?;
        tracing::info!(path = %path.display(), "wrote preview");
        written.push(path);
    }
    Ok(written)
}
