use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, IntoDiagnostic, NamedSource, Result};

use chip3::{output, Assembly, System};

/// Chip3 is an assembler and cycle-accurate simulator for a tiny 8-bit computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or binary `.bin` file until it halts and show the printout
    Run {
        /// `.asm` or `.bin` file to run
        name: PathBuf,
        /// Maximum amount of cycles before giving up
        #[arg(short, long)]
        cycles: Option<u64>,
        /// Print the whole machine after every cycle
        #[arg(short, long)]
        trace: bool,
        /// Print the memory listing once the program stops
        #[arg(long)]
        memory: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Create binary `.bin` memory image to run later
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output .bin file
        dest: Option<PathBuf>,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Show the assembled memory image and its labels
    Dump {
        /// `.asm` file to dump
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Place a watch on a `.asm` file to receive constant assembler updates
    Watch {
        /// `.asm` file to watch
        name: PathBuf,
    },
}

#[derive(Default)]
struct RunOptions {
    cycles: Option<u64>,
    trace: bool,
    memory: bool,
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let env = env_logger::Env::default()
        .filter_or("CHIP3_LOG", "warn")
        .write_style_or("CHIP3_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args = Args::parse();
    chip3::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(chip3::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, RunOptions::default());
        }
        println!("\n~ chip3 v{VERSION} ~");
        println!("{}", LOGO.truecolor(120, 200, 160).bold());
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run {
            name,
            cycles,
            trace,
            memory,
            minimal,
        } => {
            output::set_minimal(minimal);
            run(
                &name,
                RunOptions {
                    cycles,
                    trace,
                    memory,
                },
            )
        }
        Command::Compile { name, dest } => {
            file_message(Green, "Assembling", &name);
            let asm = assemble_file(&name)?;
            let dest = dest.unwrap_or_else(|| name.with_extension("bin"));
            fs::write(&dest, &asm.words).into_diagnostic()?;
            message(Green, "Finished", &format!("emit {} words", asm.words.len()));
            file_message(Green, "Saved", &dest);
            Ok(())
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let _ = assemble_file(&name)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
        Command::Dump { name, minimal } => {
            output::set_minimal(minimal);
            let asm = assemble_file(&name)?;
            print!("{}", output::image_listing(&asm.words));
            if !asm.symbols.is_empty() {
                if !minimal {
                    message(Cyan, "Symbols", &format!("{} labels", asm.symbols.len()));
                }
                print!("{}", output::symbol_table(&asm.symbols));
            }
            Ok(())
        }
        Command::Watch { name } => watch(name),
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    let image = match name.extension().and_then(|ext| ext.to_str()) {
        Some("bin") => {
            file_message(MsgColor::Green, "Loading", name);
            fs::read(name).into_diagnostic()?
        }
        Some("asm") => {
            file_message(MsgColor::Green, "Assembling", name);
            assemble_file(name)?.words
        }
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };
    let budget = opts.cycles.unwrap_or_else(chip3::env::max_cycles);
    let trace = opts.trace || chip3::env::is_trace_enabled();

    let system = System::load(&image)?;
    message(MsgColor::Green, "Running", &format!("{} words", image.len()));

    let done = if trace {
        println!("{system}");
        let mut state = system;
        while !state.is_halted() && state.cycle < budget {
            state = state.cycle();
            println!("{state}");
        }
        state
    } else {
        system.run(budget)
    };

    if output::is_minimal() {
        println!("{}", output::printout_text(done.printout()));
    } else if !done.printout().is_empty() {
        message(MsgColor::Cyan, "Printout", &format!("{} bytes", done.printout().len()));
        print!("{}", output::printout_table(done.printout()));
    }
    if opts.memory {
        print!("{}", output::memory_listing(&done));
    }

    if !done.is_halted() {
        message(
            MsgColor::Red,
            "Stopped",
            &format!("no halt after {} cycles", done.cycle),
        );
        bail!("Program did not halt within {budget} cycles");
    }
    message(
        MsgColor::Green,
        "Halted",
        &format!("after {} cycles", done.cycle),
    );
    Ok(())
}

/// Read and assemble a source file, attaching the source to any diagnostic.
fn assemble_file(name: &Path) -> Result<Assembly> {
    let src = fs::read_to_string(name).into_diagnostic()?;
    chip3::assemble(&src).map_err(|e| {
        miette::Report::new(e).with_source_code(NamedSource::new(name.display().to_string(), src))
    })
}

fn watch(name: PathBuf) -> Result<()> {
    use MsgColor::*;
    if !name.exists() {
        bail!("File does not exist. Exiting...")
    }
    // Vim breaks if watching a single file
    let folder_path = match name.parent() {
        Some(pth) if pth.is_dir() => pth.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Clear screen and move cursor to top left
    print!("\x1B[2J\x1B[2;1H");
    file_message(Green, "Watching", &name);
    message(Cyan, "Help", "press CTRL+C to exit");

    let mut watcher =
        Hotwatch::new_with_custom_delay(Duration::from_millis(500)).into_diagnostic()?;

    watcher
        .watch(folder_path, move |event: Event| match event.kind {
            // Watch remove for vim changes
            EventKind::Modify(_) | EventKind::Remove(_) => {
                print!("\x1B[2J\x1B[2;1H");
                file_message(Green, "Watching", &name);
                message(Green, "Re-checking", "file change detected");
                message(Cyan, "Help", "press CTRL+C to exit");

                // Editors may still be writing
                sleep(Duration::from_millis(50));

                match assemble_file(&name) {
                    Ok(asm) => message(
                        Green,
                        "Success",
                        &format!("no errors found, {} words", asm.words.len()),
                    ),
                    Err(e) => println!("\n{:?}", e),
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        })
        .into_diagnostic()?;
    watcher.run();
    Ok(())
}

const LOGO: &str = r#"
      __    _      ____
 ____/ /_  (_)___ |_  /
/ __/ _  \/ / _  \_/_ <
\__/_//_/_/ .___/____/
         /_/           "#;

const SHORT_INFO: &str = r"
Welcome to chip3, a toolchain for a tiny 8-bit computer:
an assembler and a simulator that steps the machine one clock tick at a time.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
