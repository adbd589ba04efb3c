use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, debug, warn};
use pathcipher_core::{
    CipherConfig, CipherError, CombinedCiphertext, DEFAULT_BLOCK_SIZE, Keypair, Seed,
    decapsulate, decrypt_with_config, decrypt_with_seed_config, encapsulate, encrypt_with_rng,
    encrypt_with_seed_rng, generate, random_seed, secure_rng,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "pathcipher",
    author,
    version,
    about = "Solving-path cipher CLI (experimental, unauthenticated)"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    /// Block size N in bytes; decryption must use the value used to encrypt.
    #[arg(long, global = true, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a keypair and write it to disk.
    Keygen {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Encrypt for a stored keypair's public key under a fresh random seed.
    Encrypt {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "TEXT")]
        message: Option<String>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Decrypt a combined ciphertext with a stored keypair's private key.
    Decrypt {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "FILE")]
        cipher: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Encrypt directly under a decimal seed.
    SeedEncrypt {
        #[arg(long)]
        seed: String,
        #[arg(long, value_name = "TEXT")]
        message: Option<String>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Decrypt an envelope produced by `seed-encrypt`.
    SeedDecrypt {
        #[arg(long)]
        seed: String,
        #[arg(long, value_name = "FILE")]
        cipher: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Run a short inline demo of both APIs.
    Demo {
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = 3)]
        count: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CiphertextKind {
    Combined,
    Envelope,
}

/// On-disk wrapper recording what produced the bytes and with which block size.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCiphertext {
    kind: CiphertextKind,
    block_size: usize,
    hex: String,
}

impl StoredCiphertext {
    fn new(kind: CiphertextKind, config: &CipherConfig, bytes: &[u8]) -> Self {
        Self {
            kind,
            block_size: config.block_size(),
            hex: hex::encode(bytes),
        }
    }

    fn bytes(&self, expected: CiphertextKind, config: &CipherConfig) -> Result<Vec<u8>> {
        if self.kind != expected {
            bail!(
                "ciphertext kind is {:?}, this command expects {:?}",
                self.kind,
                expected
            );
        }
        if self.block_size != config.block_size() {
            bail!(
                "ciphertext was produced with --block-size {}, got {}",
                self.block_size,
                config.block_size()
            );
        }
        hex::decode(&self.hex).context("decoding ciphertext hex")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let config = CipherConfig::new(cli.block_size)?;
    match cli.command {
        Commands::Keygen { out } => cmd_keygen(out),
        Commands::Encrypt {
            keys,
            message,
            input,
            out,
        } => cmd_encrypt(keys, message, input, out, &config),
        Commands::Decrypt { keys, cipher, out } => cmd_decrypt(keys, cipher, out, &config),
        Commands::SeedEncrypt {
            seed,
            message,
            input,
            out,
        } => cmd_seed_encrypt(seed, message, input, out, &config),
        Commands::SeedDecrypt { seed, cipher, out } => {
            cmd_seed_decrypt(seed, cipher, out, &config)
        }
        Commands::Demo { seed, count } => cmd_demo(seed, count, &config),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn cmd_keygen(out: PathBuf) -> Result<()> {
    let keypair = generate()?;
    save_json(&out, "keypair", &keypair)?;
    println!("Wrote keypair to {}", out.display());
    println!("Public key: {}", keypair.public);
    debug!("keypair version={}", keypair.version);
    Ok(())
}

fn cmd_encrypt(
    keys_path: PathBuf,
    message: Option<String>,
    input: Option<PathBuf>,
    out_path: PathBuf,
    config: &CipherConfig,
) -> Result<()> {
    let keypair: Keypair = load_json(&keys_path, "keypair")?;
    let plaintext = resolve_plaintext(message, input)?;
    let mut rng = secure_rng();
    println!(
        "Encrypting {} bytes with block size {}.",
        plaintext.len(),
        config.block_size()
    );
    let combined = encrypt_with_rng(&plaintext, &keypair.public, config, &mut rng)?;
    let stored = StoredCiphertext::new(CiphertextKind::Combined, config, &combined);
    save_json(&out_path, "ciphertext", &stored)?;
    println!(
        "Wrote {}-byte combined ciphertext to {}",
        combined.len(),
        out_path.display()
    );
    Ok(())
}

fn cmd_decrypt(
    keys_path: PathBuf,
    cipher_path: PathBuf,
    out_path: Option<PathBuf>,
    config: &CipherConfig,
) -> Result<()> {
    let keypair: Keypair = load_json(&keys_path, "keypair")?;
    let stored: StoredCiphertext = load_json(&cipher_path, "ciphertext")?;
    let combined = stored.bytes(CiphertextKind::Combined, config)?;
    let plaintext = decrypt_with_config(&combined, &keypair.private, config)
        .context("combined decryption failed (the trapdoor rarely returns the encapsulated seed)")?;
    write_plaintext(out_path.as_deref(), &plaintext)
}

fn cmd_seed_encrypt(
    seed: String,
    message: Option<String>,
    input: Option<PathBuf>,
    out_path: PathBuf,
    config: &CipherConfig,
) -> Result<()> {
    let seed = parse_seed(&seed)?;
    let plaintext = resolve_plaintext(message, input)?;
    let mut rng = secure_rng();
    let envelope = encrypt_with_seed_rng(&plaintext, &seed, config, &mut rng)?;
    let stored = StoredCiphertext::new(CiphertextKind::Envelope, config, &envelope);
    save_json(&out_path, "envelope", &stored)?;
    println!(
        "Wrote {}-byte envelope ({} blocks after the IV) to {}",
        envelope.len(),
        envelope.len() / config.block_size() - 1,
        out_path.display()
    );
    Ok(())
}

fn cmd_seed_decrypt(
    seed: String,
    cipher_path: PathBuf,
    out_path: Option<PathBuf>,
    config: &CipherConfig,
) -> Result<()> {
    let seed = parse_seed(&seed)?;
    let stored: StoredCiphertext = load_json(&cipher_path, "envelope")?;
    let envelope = stored.bytes(CiphertextKind::Envelope, config)?;
    let plaintext = decrypt_with_seed_config(&envelope, &seed, config)?;
    write_plaintext(out_path.as_deref(), &plaintext)
}

fn cmd_demo(seed: Option<String>, count: u64, config: &CipherConfig) -> Result<()> {
    let seed = match seed {
        Some(text) => parse_seed(&text)?,
        None => random_seed()?,
    };
    let mut rng = secure_rng();
    for idx in 0..count {
        let payload = format!("Solving path demo payload #{idx}");
        let envelope = encrypt_with_seed_rng(payload.as_bytes(), &seed, config, &mut rng)?;
        let recovered = decrypt_with_seed_config(&envelope, &seed, config)?;
        debug!("demo idx={} envelope={}", idx, hex::encode(&envelope));
        println!(
            "Msg {idx}: {} envelope bytes -> '{}'",
            envelope.len(),
            String::from_utf8_lossy(&recovered)
        );
    }

    let keypair = generate()?;
    let encapsulation = encapsulate(&seed, &keypair.public);
    let recovered_seed = decapsulate(&encapsulation.cipher, &keypair.private);
    println!(
        "Trapdoor: encapsulated {} seed bytes, decapsulation {} the seed.",
        encapsulation.cipher.len(),
        if recovered_seed == seed {
            "recovered"
        } else {
            "did not recover"
        }
    );

    let message = b"combined public-key message";
    let combined = encrypt_with_rng(message, &keypair.public, config, &mut rng)?;
    let parsed = CombinedCiphertext::from_bytes(&combined)?;
    println!(
        "Combined: {} bytes ({} encapsulated, {} envelope).",
        combined.len(),
        parsed.encapsulated_seed.len(),
        parsed.envelope.len()
    );
    match decrypt_with_config(&combined, &keypair.private, config) {
        Ok(plaintext) if plaintext == message => println!("Combined decryption recovered the message."),
        Ok(plaintext) => println!(
            "Combined decryption produced {} unrelated bytes.",
            plaintext.len()
        ),
        Err(err @ CipherError::InvalidPadding { .. }) => {
            warn!("combined decryption rejected: {err}");
            println!("Combined decryption failed with invalid padding.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn resolve_plaintext(message: Option<String>, input: Option<PathBuf>) -> Result<Vec<u8>> {
    match (message, input) {
        (Some(text), None) => Ok(text.into_bytes()),
        (None, Some(path)) => {
            fs::read(&path).with_context(|| format!("reading plaintext from {}", path.display()))
        }
        (Some(_), Some(_)) => bail!("Provide either --message or --input, not both."),
        (None, None) => bail!("Provide --message TEXT or --input FILE for data to encrypt."),
    }
}

fn write_plaintext(out_path: Option<&Path>, plaintext: &[u8]) -> Result<()> {
    if let Some(path) = out_path {
        fs::write(path, plaintext)
            .with_context(|| format!("writing plaintext to {}", path.display()))?;
        println!("Wrote {} plaintext bytes to {}", plaintext.len(), path.display());
    } else {
        println!("{}", String::from_utf8_lossy(plaintext));
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let data =
        fs::read(path).with_context(|| format!("reading {} from {}", label, path.display()))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {} from {}", label, path.display()))?;
    Ok(value)
}

fn save_json<T: ?Sized + serde::Serialize>(path: &Path, label: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .with_context(|| format!("writing {} to {}", label, path.display()))?;
    Ok(())
}

fn parse_seed(seed: &str) -> Result<Seed> {
    match Seed::parse_bytes(seed.trim().as_bytes(), 10) {
        Some(value) => Ok(value),
        None => bail!("seed must be a non-negative decimal integer, got '{seed}'"),
    }
}
