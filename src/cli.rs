use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::Threshold;
use crate::scheme::EncryptionScheme;

/// Validates that threshold is at least 2
/// A threshold of 1 defeats the purpose of secret sharing
/// (any single piece would be able to recover every private key)
fn validate_threshold(s: &str) -> Result<Threshold, String> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    Threshold::new(value).map_err(|e| e.to_string())
}

/// Output format of the `convert` command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Txt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        f.write_str(value.get_name())
    }
}

/// Passphrase encryption scheme selector
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    /// AES-256-GCM with a PBKDF2-HMAC-SHA256 key (fast)
    AesGcmPbkdf2,
    /// AES-256-GCM with an scrypt key (memory-hard, slower)
    AesGcmScrypt,
}

impl std::fmt::Display for SchemeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        f.write_str(value.get_name())
    }
}

impl From<SchemeArg> for EncryptionScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::AesGcmPbkdf2 => EncryptionScheme::AesGcmPbkdf2,
            SchemeArg::AesGcmScrypt => EncryptionScheme::AesGcmScrypt,
        }
    }
}

#[derive(Parser)]
#[command(name = "keypiece")]
#[command(about = "Generate, encrypt, split and recover cold storage keypairs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new piece with one keypair per ticker
    Generate {
        /// Tickers to generate keypairs for (e.g. BTC ETH XMR BIP39)
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Encrypt the private keys of a piece read from stdin
    Encrypt {
        /// Encryption scheme applied to every keypair
        #[arg(short, long, value_enum, default_value_t = SchemeArg::AesGcmScrypt)]
        scheme: SchemeArg,

        /// Passphrase; prompted for interactively when omitted
        #[arg(short, long)]
        passphrase: Option<String>,
    },
    /// Decrypt the private keys of a piece read from stdin
    Decrypt {
        /// Passphrase; prompted for interactively when omitted
        #[arg(short, long)]
        passphrase: Option<String>,
    },
    /// Split a piece read from stdin into shares
    Split {
        /// Number of share pieces to create
        #[arg(short = 'n', long)]
        shares: u8,

        /// Threshold: minimum number of pieces needed to reconstruct (must be >= 2)
        #[arg(short, long, value_parser = validate_threshold)]
        threshold: Threshold,
    },
    /// Combine share pieces read from stdin (pieces separated by blank lines)
    Combine,
    /// Convert a piece read from stdin to another format
    Convert {
        /// Target format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        to: OutputFormat,
    },
    /// Recover a piece from arbitrary pasted text on stdin
    Recover,
}
