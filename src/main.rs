use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use clap::Parser;

use keypiece::cli::{Cli, Commands, OutputFormat};
use keypiece::domain::{ShareCount, SplitConfig};
use keypiece::format;
use keypiece::{EncryptionScheme, Piece, Registry};

/// Read a whole piece from stdin, in any supported format
fn read_piece(registry: &Registry) -> Result<Piece> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read piece from stdin")?;
    format::parse(&input, registry).context("Failed to parse piece")
}

/// Resolve the passphrase: the flag wins, otherwise prompt on a TTY
/// (hidden input); with piped stdin the piece occupies the stream, so the
/// flag is mandatory there
fn obtain_passphrase(arg: Option<String>) -> Result<String> {
    match arg {
        Some(passphrase) => Ok(passphrase),
        None if atty::is(atty::Stream::Stdin) => {
            eprintln!("Enter passphrase:");
            rpassword::read_password().context("Failed to read passphrase")
        }
        None => bail!("stdin is piped, pass the passphrase with --passphrase"),
    }
}

/// Read blank-line-separated pieces from stdin
///
/// Structured records and tables contain no blank lines, so paragraphs are
/// a safe delimiter for them.
fn read_pieces(registry: &Registry) -> Result<Vec<Piece>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read pieces from stdin")?;

    let mut pieces = Vec::new();
    for (i, chunk) in input.split("\n\n").enumerate() {
        if chunk.trim().is_empty() {
            continue;
        }
        let piece = format::parse(chunk, registry)
            .with_context(|| format!("Failed to parse piece #{}", i + 1))?;
        pieces.push(piece);
    }
    if pieces.is_empty() {
        bail!("No pieces provided");
    }
    Ok(pieces)
}

fn render_progress(fraction: f64) {
    eprint!("\r{:>3.0}%", fraction * 100.0);
    if (fraction - 1.0).abs() < f64::EPSILON {
        eprintln!();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = Registry::standard();

    match cli.command {
        Commands::Generate { tickers } => {
            let currencies = tickers
                .iter()
                .map(|t| registry.by_ticker(t))
                .collect::<keypiece::Result<Vec<_>>>()?;
            let piece = Piece::generate(&currencies)?;
            println!("{}", format::json::encode(&piece)?);
        }
        Commands::Encrypt { scheme, passphrase } => {
            let passphrase = obtain_passphrase(passphrase)?;
            let mut piece = read_piece(registry)?;
            let schemes =
                vec![EncryptionScheme::from(scheme); piece.keypairs()?.len()];
            piece.encrypt(&passphrase, &schemes, Some(&render_progress))?;
            println!("{}", format::json::encode(&piece)?);
        }
        Commands::Decrypt { passphrase } => {
            let passphrase = obtain_passphrase(passphrase)?;
            let mut piece = read_piece(registry)?;
            piece.decrypt(&passphrase, Some(&render_progress))?;
            println!("{}", format::json::encode(&piece)?);
        }
        Commands::Split { shares, threshold } => {
            let piece = read_piece(registry)?;
            let share_count = ShareCount::new(shares)?;
            let config = SplitConfig::new(threshold, share_count)?;
            for share_piece in piece.split(config)? {
                println!("{}\n", format::json::encode(&share_piece)?);
            }
        }
        Commands::Combine => {
            let pieces = read_pieces(registry)?;
            let recovered = Piece::combine(&pieces)?;
            println!("{}", format::json::encode(&recovered)?);
        }
        Commands::Convert { to } => {
            let piece = read_piece(registry)?;
            let rendered = match to {
                OutputFormat::Json => format::json::encode(&piece)?,
                OutputFormat::Csv => format::table::encode(&piece)?,
                OutputFormat::Txt => format::text::encode(&piece)?,
            };
            println!("{rendered}");
        }
        Commands::Recover => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read text from stdin")?;
            let piece = format::parse(&input, registry)?;
            println!("{}", format::json::encode(&piece)?);
        }
    }

    Ok(())
}
