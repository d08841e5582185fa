use clap::Parser;
use colored::*;

use model_compare::cli::{print_completions, Args};
use model_compare::config::Settings;
use model_compare::report;
use model_compare::slot::SlotViewController;
use model_compare::{logging, web};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        print_completions(shell, &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::load(args.config.as_deref())?;
    logging::init(&settings.logging.filter);
    tracing::debug!(
        stages = ?model_compare::classifier::stage_names(),
        slots = settings.compare.slots,
        "starting"
    );

    let language = args.content_language();
    let outputs = report::read_inputs(&args.inputs)?;
    let count = if outputs.is_empty() {
        settings.compare.slots
    } else {
        outputs.len()
    };
    if count > model_compare::slot::MAX_SLOTS {
        return Err(format!(
            "at most {} inputs can be compared, got {}",
            model_compare::slot::MAX_SLOTS,
            count
        )
        .into());
    }

    let mut controller = SlotViewController::with_options(
        count,
        settings.memory_host(),
        settings.preview_options(),
    );
    for index in 0..count {
        if let Some(label) = args.label(index) {
            controller.set_label(index, label);
        }
    }
    report::load_outputs(&mut controller, &outputs, &language);

    // Web UI mode
    if args.web {
        let port = args.port.unwrap_or(settings.server.port);
        web::serve(
            &settings.server.bind,
            port,
            settings.preview.title.clone(),
            controller,
        )
        .await?;
        return Ok(());
    }

    if args.preview || args.out_dir.is_some() {
        report::preview_all(&mut controller);
    }

    if args.json {
        println!("{}", report::render_json(&controller)?);
    } else {
        print!("{}", report::render_terminal(&controller));
    }

    if let Some(dir) = &args.out_dir {
        let written = report::write_previews(&controller, dir)?;
        eprintln!(
            "{}",
            format!("Wrote {} preview document(s) to {}", written.len(), dir.display())
                .bright_green()
        );
    }

    Ok(())
}
