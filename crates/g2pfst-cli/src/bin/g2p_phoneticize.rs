// g2p-phoneticize: Print pronunciations for a list of words.
//
// Reads INPUT one entry per line (only the text before the first double
// space is used, so pronouncing-dictionary files work as input) and prints
// the BEST best pronunciations of each word:
//   word<TAB>cost<TAB>phone phone ...
// A word with no pronunciation prints an empty line. Words are decoded as
// written unless --lowercase is given.
//
// Usage:
//   g2p-phoneticize [OPTIONS] MODEL INPUT BEST

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use g2pfst_cli::{DecodeOptions, entry_word, fatal, format_result, init_logging, query_word};
use g2pfst_decoder::Decoder;

#[derive(Parser)]
#[command(name = "g2p-phoneticize")]
#[command(about = "Print pronunciations for a list of words using a g2pfst model")]
struct Cli {
    /// Native model file
    model: PathBuf,
    /// Word list, one entry per line
    input: PathBuf,
    /// Number of pronunciations per word
    best: usize,
    /// Lowercase each word before decoding (the output row still echoes it as written)
    #[arg(long)]
    lowercase: bool,
    #[command(flatten)]
    decode: DecodeOptions,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.decode.to_config()?;
    let decoder = Decoder::load(&cli.model, config)
        .with_context(|| format!("loading model {}", cli.model.display()))?;
    let input = File::open(&cli.input)
        .with_context(|| format!("opening input {}", cli.input.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let started = Instant::now();
    let mut words = 0usize;

    for line in BufReader::new(input).lines() {
        let line = line.with_context(|| format!("reading {}", cli.input.display()))?;
        let Some(word) = entry_word(&line) else {
            writeln!(out)?;
            continue;
        };
        words += 1;
        let paths = decoder.decode_word(&query_word(word, cli.lowercase), cli.best)?;
        if paths.is_empty() {
            writeln!(out)?;
        }
        for path in &paths {
            writeln!(out, "{}", format_result(word, path))?;
        }
    }
    out.flush()?;

    let elapsed = started.elapsed();
    tracing::info!(
        words,
        seconds = elapsed.as_secs_f64(),
        ms_per_word = if words > 0 {
            elapsed.as_secs_f64() * 1000.0 / words as f64
        } else {
            0.0
        },
        "decoding finished"
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
