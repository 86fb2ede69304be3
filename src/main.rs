use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use e20sim::output::{write_config, write_final_state};
use e20sim::{Layout, MachineState, Printer, Simulator};

/// Simulate an E20 program and log every access to its data cache.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// The file containing machine code, typically with .bin suffix
    filename: PathBuf,
    /// Cache configuration: size,associativity,blocksize (for one cache) or
    /// size,associativity,blocksize,size,associativity,blocksize (for two caches).
    /// Without it the program only runs when --dump is given
    #[arg(long)]
    cache: Option<String>,
    /// Print the final machine state and the first N words of memory once halted
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "128"
    )]
    dump: Option<usize>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // `--help` and `--version` go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    e20sim::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(e20sim::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let minimal = args.minimal || e20sim::env::is_minimal_forced();
    let status = Status { minimal };

    status.file_message(MsgColor::Green, "Loading", &args.filename);
    let src = fs::read_to_string(&args.filename)
        .map_err(|e| e20sim::error::file_unreadable(&args.filename, e))?;
    let image = e20sim::parse_image(&src)?;
    let layout = args.cache.as_deref().map(Layout::parse).transpose()?;

    if layout.is_none() && args.dump.is_none() {
        // Nothing would be printed, so the program is not run at all
        status.message(MsgColor::Cyan, "Skipped", "no --cache or --dump given");
        return Ok(());
    }

    let mut out = BufWriter::new(io::stdout().lock());
    if let Some(layout) = &layout {
        for (name, params) in layout.levels() {
            write_config(&mut out, name, params).into_diagnostic()?;
        }
    } else {
        status.message(MsgColor::Cyan, "Note", "no --cache given, running uncached");
    }

    let state = MachineState::from_raw(&image)?;
    let mut sim = Simulator::new(state, layout.as_ref(), Printer::new(out));

    status.message(MsgColor::Green, "Running", "loaded image");
    let steps = sim.run();
    status.message(
        MsgColor::Cyan,
        "Halted",
        &format!("after {steps} instructions"),
    );

    let (state, printer) = sim.into_parts();
    let mut out = printer.finish().into_diagnostic()?;
    if let Some(words) = args.dump {
        write_final_state(&mut out, &state, words).into_diagnostic()?;
    }
    out.flush().into_diagnostic()?;

    status.file_message(MsgColor::Green, "Completed", &args.filename);
    Ok(())
}

enum MsgColor {
    Green,
    Cyan,
}

/// Progress lines on stderr, so stdout carries only the simulation output.
struct Status {
    minimal: bool,
}

impl Status {
    fn file_message(&self, color: MsgColor, left: &str, right: &Path) {
        let right = format!("target {}", right.display());
        self.message(color, left, &right);
    }

    fn message(&self, color: MsgColor, left: &str, right: &str) {
        if self.minimal {
            return;
        }
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
        };
        eprintln!("{left:>12} {right}");
    }
}
