use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drawer::Config;
use drawer::draw::{Color, CompositingCanvas};
use drawer::scene::{FileLoader, ResourceLoader, SceneOptions, load_scene, restore_into};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DRAWER_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "drawer")]
#[command(version = VERSION, about = "Drawing canvas with erasable shapes")]
struct Cli {
    /// Configuration file (defaults to ~/.config/drawer/config.toml)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a scene file into a PNG image
    Render {
        /// Scene file to read
        scene: PathBuf,

        /// PNG file to write
        #[arg(long, short = 'o', value_name = "PNG")]
        output: PathBuf,

        /// Override the canvas width stored in the scene
        #[arg(long)]
        width: Option<i32>,

        /// Override the canvas height stored in the scene
        #[arg(long)]
        height: Option<i32>,

        /// Background colour (#RRGGBB or #RRGGBBAA) used when the scene has none
        #[arg(long, value_name = "COLOR")]
        background: Option<Color>,
    },

    /// Print a summary of a scene file
    Inspect {
        /// Scene file to read
        scene: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn render(
    config: &Config,
    scene_path: &Path,
    output: &Path,
    size: (Option<i32>, Option<i32>),
    background: Option<Color>,
) -> Result<()> {
    let options = SceneOptions::from_config(&config.scene);
    let loaded = load_scene(scene_path, &options)?;
    let scene = loaded.scene;

    let mut canvas_options = config.canvas_options();
    canvas_options.width = size.0.unwrap_or(scene.width);
    canvas_options.height = size.1.unwrap_or(scene.height);
    canvas_options.background = scene
        .background
        .or(background)
        .or(canvas_options.background);
    let canvas = Rc::new(RefCell::new(CompositingCanvas::with_options(canvas_options)));

    let root = scene_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut loader = FileLoader::new(root);
    let summary = restore_into(&canvas, scene.objects, &mut loader);
    while loader.pending() > 0 {
        loader.run_pending();
    }

    let mut canvas = canvas.borrow_mut();
    canvas
        .export_png(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "Rendered {} objects ({} rejected) into {}",
        canvas.len(),
        summary.rejected,
        output.display()
    );
    Ok(())
}

fn inspect(config: &Config, scene_path: &Path) -> Result<()> {
    let options = SceneOptions::from_config(&config.scene);
    let loaded = load_scene(scene_path, &options)?;
    let scene = &loaded.scene;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for object in &scene.objects {
        *counts.entry(object.kind_name()).or_default() += 1;
    }

    println!("Scene: {}", scene_path.display());
    println!("  Version: {}", scene.version);
    if !scene.last_modified.is_empty() {
        println!("  Last modified: {}", scene.last_modified);
    }
    println!("  Size: {}x{}", scene.width, scene.height);
    match scene.background {
        Some(color) => println!("  Background: {}", color.to_hex()),
        None => println!("  Background: transparent"),
    }
    println!("  Compressed: {}", if loaded.compressed { "yes" } else { "no" });
    println!("  Objects: {}", scene.objects.len());
    for (kind, count) in counts {
        println!("    {kind}: {count}");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            scene,
            output,
            width,
            height,
            background,
        } => render(&config, &scene, &output, (width, height), background),
        Command::Inspect { scene } => inspect(&config, &scene),
    }
}
