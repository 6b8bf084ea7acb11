use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use resonance::console::Console;
use resonance::{FlattenConfig, MachineConfig, PrintStyle, compile, run};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resonance", about = "Run a program of sounds and walls")]
struct Cli {
    /// Path to the source code.
    filename: PathBuf,

    /// Style of output: "ascii" prints characters, "numbers" prints values.
    #[arg(short, long, value_enum, default_value_t = PrintStyle::Ascii)]
    print_style: PrintStyle,

    /// File receiving the rendered frames.
    #[arg(long, default_value = "renders.txt")]
    frames: PathBuf,

    /// Skip frame rendering entirely.
    #[arg(long)]
    no_frames: bool,

    /// Minimum number of distance cells drawn per direction.
    #[arg(long, default_value_t = 10)]
    min_width: usize,

    /// Maximum nesting of for blocks.
    #[arg(long, default_value_t = 16)]
    max_depth: usize,

    /// Maximum number of instructions after expanding for blocks.
    #[arg(long, default_value_t = 1 << 20)]
    max_len: usize,
}

/// Read the program source. Operands are case-insensitive.
fn load_source(path: &Path) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(path).ok()?;
    Some(text.to_lowercase().lines().map(str::to_owned).collect())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(source) = load_source(&cli.filename) else {
        eprintln!("Cannot open file '{}'.", cli.filename.display());
        std::process::exit(1);
    };

    if let Err(e) = execute(&cli, &source) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn execute(cli: &Cli, source: &[String]) -> resonance::Result<()> {
    let flatten_config = FlattenConfig {
        max_depth: cli.max_depth,
        max_len: cli.max_len,
    };
    let program = compile(source, &flatten_config)?;
    info!(instructions = program.len(), "program compiled");

    let config = MachineConfig {
        print_style: cli.print_style,
        min_width: cli.min_width,
        record_frames: !cli.no_frames,
    };
    let mut console = Console::stdio();
    let frames = run(&program, &mut console, config)?;

    if !cli.no_frames {
        let file = File::create(&cli.frames)?;
        frames.write_to(BufWriter::new(file))?;
        info!(frames = frames.len(), path = %cli.frames.display(), "frames written");
    }
    Ok(())
}
