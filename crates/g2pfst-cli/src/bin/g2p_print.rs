// g2p-print: Dump a native model as AT&T text.
//
// Without BASE the transducer is printed to stdout using symbol names where
// the model has symbol tables. With BASE, BASE.fst.txt and the symbol files
// BASE.input.syms / BASE.output.syms are written instead.
//
// Usage:
//   g2p-print [--info] MODEL [BASE]

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use g2pfst::Fst;
use g2pfst::import::export_att;
use g2pfst_cli::{fatal, init_logging};

#[derive(Parser)]
#[command(name = "g2p-print")]
#[command(about = "Print a g2pfst model as AT&T text")]
struct Cli {
    /// Native model file
    model: PathBuf,
    /// Write BASE.fst.txt and symbol files instead of printing
    base: Option<PathBuf>,
    /// Print a one-line summary instead of the transducer
    #[arg(long)]
    info: bool,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let fst = Fst::load_model(&cli.model)
        .with_context(|| format!("loading {}", cli.model.display()))?;

    if cli.info {
        let symbols = |t: Option<&g2pfst::SymbolTable>| t.map_or(0, |t| t.size());
        println!(
            "semiring={} states={} arcs={} start={} isyms={} osyms={}",
            fst.semiring(),
            fst.num_states(),
            fst.num_arcs(),
            fst.start().map_or_else(|| "none".to_string(), |s| s.to_string()),
            symbols(fst.input_symbols()),
            symbols(fst.output_symbols()),
        );
        return Ok(());
    }

    match &cli.base {
        Some(base) => export_att(&fst, base)
            .with_context(|| format!("writing {}", base.display()))?,
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write!(out, "{fst}")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        fatal(format!("{e:#}"));
    }
}
