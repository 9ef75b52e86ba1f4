use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use codex::{Notebook, PluginRegistry, Renderer, Settings};

#[derive(Parser, Debug)]
#[clap(name = "codex", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Path to the settings file.
    #[clap(short, long, default_value = "codex.yaml")]
    config: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a view file to HTML.
    Render {
        /// Notebook-relative path of the view file.
        file: String,
        /// Write the HTML here instead of stdout.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and validate a view file.
    Check {
        /// Notebook-relative path of the view file.
        file: String,
    },
    /// List the view types provided by installed plugins.
    Plugins,
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    match run(&args) {
        Ok(_) => {}
        Err(e) => {
            log::error!("Failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(&args.config)?;
    let registry = PluginRegistry::new(&settings.plugins_dir, settings.mode);
    registry.initialize()?;

    match &args.command {
        Command::Render { file, output } => {
            let notebook = Notebook::open(&settings.notebook_root)?;
            let mut renderer = Renderer::new(notebook, registry);
            let view = renderer.render_file(file)?;
            for warning in &view.warnings {
                log::warn!("{}", warning);
            }
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        if !parent.as_os_str().is_empty() {
                            fs::create_dir_all(parent)?;
                        }
                    }
                    fs::write(path, &view.html)?;
                    log::info!("Rendered {} to {}", file, path.display());
                }
                None => println!("{}", view.html),
            }
        }
        Command::Check { file } => {
            let notebook = Notebook::open(&settings.notebook_root)?;
            let content = notebook.load(file)?;
            let definition = codex::parse_view_definition(&content)?;
            let validation =
                codex::validate_view_definition(&definition, &registry.valid_view_types());
            if validation.valid {
                log::info!("{} is a valid \"{}\" view", file, definition.view_type);
            } else {
                for error in &validation.errors {
                    log::error!("{}: {}", file, error);
                }
                return Err("validation failed".into());
            }
        }
        Command::Plugins => {
            for view_type in registry.valid_view_types() {
                match registry.view_plugin(&view_type) {
                    Some(plugin) => {
                        println!("{}\t{} ({})", view_type, plugin.name, plugin.plugin_name)
                    }
                    None => println!("{}\tbuilt in", view_type),
                }
            }
        }
    }
    Ok(())
}
