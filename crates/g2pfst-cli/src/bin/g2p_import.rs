// g2p-import: Convert a foreign model into the native model format.
//
// Accepts OpenFst binary vector FSTs (standard/tropical or log arcs, with
// optional embedded symbol tables) and AT&T text models (BASE.fst.txt with
// optional BASE.input.syms and BASE.output.syms).
//
// Usage:
//   g2p-import [--format openfst|att] [--semiring S] [--arc-sort input|output] INPUT OUTPUT

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use g2pfst::Fst;
use g2pfst::import::{AttModel, OpenFstModel, import};
use g2pfst::ops::{ArcOrder, arc_sort};
use g2pfst_cli::{SemiringArg, fatal, init_logging};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// OpenFst binary vector FST
    Openfst,
    /// AT&T text with optional symbol files
    Att,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Input,
    Output,
}

#[derive(Parser)]
#[command(name = "g2p-import")]
#[command(about = "Convert OpenFst binary or AT&T text models to the g2pfst model format")]
struct Cli {
    /// OpenFst file, or AT&T base name (without .fst.txt)
    input: PathBuf,
    /// Native model file to write
    output: PathBuf,
    /// Input format; guessed from the input path when omitted
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// Semiring of AT&T text weights (OpenFst files carry their own)
    #[arg(long, value_enum, default_value = "tropical")]
    semiring: SemiringArg,
    /// Sort every state's arcs before saving
    #[arg(long, value_enum)]
    arc_sort: Option<SortArg>,
}

/// AT&T when `<input>.fst.txt` exists or the path itself names the text file.
fn guess_format(input: &Path) -> Format {
    let mut text = input.as_os_str().to_owned();
    text.push(".fst.txt");
    if Path::new(&text).is_file() || input.to_string_lossy().ends_with(".fst.txt") {
        Format::Att
    } else {
        Format::Openfst
    }
}

fn read_model(cli: &Cli) -> anyhow::Result<Fst> {
    let format = cli.format.unwrap_or_else(|| guess_format(&cli.input));
    tracing::info!(input = %cli.input.display(), ?format, "importing");
    let fst = match format {
        Format::Openfst => {
            let model = OpenFstModel::read(&cli.input)?;
            import(&model)?
        }
        Format::Att => {
            let path = cli.input.to_string_lossy();
            let base = path.strip_suffix(".fst.txt").unwrap_or(&*path);
            let model = AttModel::read(base, cli.semiring.into())?;
            import(&model)?
        }
    };
    Ok(fst)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut fst =
        read_model(cli).with_context(|| format!("importing {}", cli.input.display()))?;
    match cli.arc_sort {
        Some(SortArg::Input) => arc_sort(&mut fst, ArcOrder::Input),
        Some(SortArg::Output) => arc_sort(&mut fst, ArcOrder::Output),
        None => {}
    }
    fst.save_model(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    eprintln!(
        "{}: {} states, {} arcs, {} semiring",
        cli.output.display(),
        fst.num_states(),
        fst.num_arcs(),
        fst.semiring()
    );
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        fatal(format!("{e:#}"));
    }
}
