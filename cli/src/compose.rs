use crate::SceneArgs;
use anyhow::{Context, Result};
use app_lib::{AddReport, Editor, Settings};
use clap::Args;
use colored::*;
use std::path::PathBuf;

#[derive(Args)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Where to save the PDF
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn run(args: ComposeArgs) -> Result<()> {
    let settings = args.scene.settings()?;
    let editor = build_editor(settings, &args.scene)?;

    editor
        .export(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;

    println!(
        "{}",
        format!(
            "Saved {} image(s) to {}",
            editor.scene().len(),
            args.output.display()
        )
        .green()
    );
    Ok(())
}

/// Adds every input, applies rotations and prints per-file failures.
pub fn build_editor(settings: Settings, args: &SceneArgs) -> Result<Editor> {
    let mut editor = Editor::new(settings);
    let report = editor.add_paths(&args.inputs);
    print_failures(&editor, &report);

    for (index, degrees) in &args.rotations {
        let id = editor
            .scene()
            .ids()
            .nth(*index)
            .with_context(|| format!("No image at index {} to rotate", index))?;
        editor.rotate(id, *degrees)?;
    }

    Ok(editor)
}

fn print_failures(editor: &Editor, report: &AddReport) {
    for (path, error) in &report.failed {
        editor.report(error);
        eprintln!(
            "{} {}: {}",
            "Skipped".yellow().bold(),
            path.display(),
            error
        );
    }
}
