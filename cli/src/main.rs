use anyhow::{Context, Result};
use app_lib::{PageSize, Settings};
use clap::{Args, Parser, Subcommand};
use colored::*;
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

mod compose;
mod plan;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log everything the editor and the PDF writer do
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out images on one page and save it as a PDF
    Compose(compose::ComposeArgs),
    /// Print the draw instructions as JSON without writing a PDF
    Plan(plan::PlanArgs),
}

/// Options shared by every command that builds a scene.
#[derive(Args)]
pub struct SceneArgs {
    /// Image files, or folders to scan for png/jpg/jpeg images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page size: a4, a3, a5, letter, legal or WIDTHxHEIGHT in points
    #[arg(long)]
    page: Option<PageSize>,

    /// Initial display width of each image, in points
    #[arg(long)]
    width: Option<f64>,

    /// Rotate the n-th image (0-based), e.g. `--rotate 2:45`
    #[arg(long = "rotate", value_parser = parse_rotation)]
    rotations: Vec<(usize, f64)>,
}

impl SceneArgs {
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("Couldn't load settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(page) = self.page {
            settings.page = page;
        }
        if let Some(width) = self.width {
            settings.initial_width = width;
        }
        settings.validate()?;
        debug!("Using {:?}", settings);
        Ok(settings)
    }
}

fn parse_rotation(s: &str) -> Result<(usize, f64), String> {
    let (index, degrees) = s
        .split_once(':')
        .ok_or_else(|| format!("expected INDEX:DEGREES, got '{}'", s))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid image index '{}': {}", index, e))?;
    let degrees = degrees
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid angle '{}': {}", degrees, e))?;
    Ok((index, degrees))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Compose(args) => compose::run(args)?,
        Commands::Plan(args) => plan::run(args)?,
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_parse_rotation() {
        assert_eq!(Ok((2, 45.0)), parse_rotation("2:45"));
        assert_eq!(Ok((0, -12.5)), parse_rotation(" 0 : -12.5 "));
        assert!(parse_rotation("45").is_err());
        assert!(parse_rotation("x:45").is_err());
    }

    #[test]
    fn test_cli_parses_compose() {
        let cli = Cli::try_parse_from([
            "collage", "compose", "a.png", "shots/", "-o", "out.pdf", "--page", "letter",
            "--rotate", "1:90",
        ])
        .unwrap();
        let Commands::Compose(args) = cli.command else {
            panic!("expected compose");
        };
        assert_eq!(PathBuf::from("out.pdf"), args.output);
        assert_eq!(2, args.scene.inputs.len());
        assert_eq!(Some(PageSize::Letter), args.scene.page);
        assert_eq!(vec![(1, 90.0)], args.scene.rotations);
    }

    #[test]
    fn test_cli_requires_inputs() {
        assert!(Cli::try_parse_from(["collage", "plan"]).is_err());
    }

    fn scene_args(args: &[&str]) -> SceneArgs {
        let cli = Cli::try_parse_from(["collage", "plan"].iter().chain(args)).unwrap();
        let Commands::Plan(plan) = cli.command else {
            panic!("expected plan");
        };
        plan.scene
    }

    fn write_image(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        image::RgbImage::from_pixel(20, 10, image::Rgb([0, 90, 180]))
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_settings_come_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("collage.json");
        fs::write(&config, r#"{"page": "a3", "initial_width": 150, "min_width": 20}"#).unwrap();
        let config = config.to_string_lossy().into_owned();

        let settings = scene_args(&["a.png", "--config", &config]).settings().unwrap();
        assert_eq!(PageSize::A3, settings.page);
        assert_eq!(150.0, settings.initial_width);
        assert_eq!(20.0, settings.min_width);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("collage.json");
        fs::write(&config, r#"{"page": "a3", "initial_width": 150}"#).unwrap();
        let config = config.to_string_lossy().into_owned();

        let settings = scene_args(&[
            "a.png", "--config", &config, "--page", "letter", "--width", "80",
        ])
        .settings()
        .unwrap();
        assert_eq!(PageSize::Letter, settings.page);
        assert_eq!(80.0, settings.initial_width);
    }

    #[test]
    fn test_width_below_min_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("collage.json");
        fs::write(&config, r#"{"min_width": 50}"#).unwrap();
        let config = config.to_string_lossy().into_owned();

        let result = scene_args(&["a.png", "--config", &config, "--width", "10"]).settings();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let result = scene_args(&["a.png", "--config", "test/potato.json"]).settings();
        assert!(result.is_err());
    }

    #[test]
    fn test_rotate_applies_to_the_nth_image() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_image(dir.path(), "first.png");
        let second = write_image(dir.path(), "second.png");

        let args = scene_args(&[&first, &second, "--rotate", "1:30"]);
        let editor = compose::build_editor(args.settings().unwrap(), &args).unwrap();

        let rotations: Vec<f64> = editor
            .scene()
            .iter()
            .map(|placement| placement.rotation_degrees())
            .collect();
        assert_eq!(vec![0.0, 30.0], rotations);
    }

    #[test]
    fn test_rotate_out_of_range_fails() {
        let dir = tempfile::tempdir().unwrap();
        let only = write_image(dir.path(), "only.png");

        let args = scene_args(&[&only, "--rotate", "1:30"]);
        assert!(compose::build_editor(args.settings().unwrap(), &args).is_err());
    }

    #[test]
    fn test_bad_input_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_image(dir.path(), "good.png");
        let bad = dir.path().join("bad.png");
        fs::write(&bad, "not an image").unwrap();
        let bad = bad.to_string_lossy().into_owned();

        let args = scene_args(&[&bad, &good]);
        let editor = compose::build_editor(args.settings().unwrap(), &args).unwrap();
        assert_eq!(1, editor.scene().len());
    }
}
