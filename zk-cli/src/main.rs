use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zkcp::document::{self, Document};
use zkcp::inputs::{format_field, parse_field, parse_fields};
use zkcp::utils::{export_verifying_key_to_rs, load_proof, save_proof};
use zkcp::{CircuitConfig, Contingent, PrivateWitness, PublicInputs, utils};

/// zkcp: zero-knowledge contingent payment proofs
#[derive(Parser)]
#[command(name = "zkcp")]
#[command(about = "Prove that a ciphertext encrypts committed data under a hash-committed key")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proving and verifying keys for a block count
    Genkeys {
        #[arg(long)]
        num_blocks: usize,
        #[arg(long, default_value = "keys/contingent.pk.bin")]
        pk: PathBuf,
        #[arg(long, default_value = "keys/contingent.vk.bin")]
        vk: PathBuf,
    },

    /// Generate a proof and write it as JSON
    Prove {
        #[arg(long, default_value = "keys/contingent.pk.bin")]
        pk: PathBuf,
        #[arg(long, default_value = "proofs/proof.json")]
        out: PathBuf,
        /// SHA-256 of the key, 64 hex characters
        #[arg(long)]
        key_hash: String,
        /// Ciphertext blocks, or @FILE with one block per line
        #[arg(long, num_args = 1.., required = true)]
        ciphertext: Vec<String>,
        /// MiMC Merkle root of the plaintext
        #[arg(long)]
        root: String,
        /// MiMC encryption key
        #[arg(long)]
        key: String,
        /// Plaintext blocks, or @FILE with one block per line
        #[arg(long, num_args = 1.., required = true)]
        plaintext: Vec<String>,
    },

    /// Verify a JSON proof against the public inputs
    Verify {
        #[arg(long, default_value = "keys/contingent.vk.bin")]
        vk: PathBuf,
        #[arg(long, default_value = "proofs/proof.json")]
        proof: PathBuf,
        #[arg(long)]
        key_hash: String,
        #[arg(long, num_args = 1.., required = true)]
        ciphertext: Vec<String>,
        #[arg(long)]
        root: String,
    },

    /// Encrypt a file into blocks, with a supplied or random key
    Encrypt {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        num_blocks: usize,
        /// Key in decimal; random when omitted
        #[arg(long)]
        key: Option<String>,
        #[arg(long, default_value = "sealed")]
        out: PathBuf,
    },

    /// Decrypt ciphertext blocks back into the original file
    Decrypt {
        /// File with one ciphertext block per line
        #[arg(long)]
        ciphertext: PathBuf,
        #[arg(long)]
        key: String,
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the header and components of a JSON proof
    Inspect {
        #[arg(long)]
        proof: PathBuf,
    },

    /// Write the verifying key as a Rust byte array for on-chain embedding
    ExportVk {
        #[arg(long, default_value = "keys/contingent.vk.bin")]
        vk: PathBuf,
        #[arg(long, default_value = "keys/verifying_key_bytes.rs")]
        out: PathBuf,
    },
}

/// Expands `@FILE` into the whitespace-separated values it contains.
fn expand_values(values: &[String]) -> anyhow::Result<Vec<String>> {
    match values {
        [single] if single.starts_with('@') => {
            let path = &single[1..];
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Ok(text.split_whitespace().map(str::to_owned).collect())
        }
        _ => Ok(values.to_vec()),
    }
}

fn write_lines(path: &Path, lines: impl IntoIterator<Item = String>) -> anyhow::Result<()> {
    let mut text = String::new();
    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zkcp=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Genkeys { num_blocks, pk, vk } => {
            let config = CircuitConfig::new(num_blocks)?;
            let engine = Contingent::setup(config)?;
            engine
                .save(&pk, &vk)
                .with_context(|| format!("writing keys to {} and {}", pk.display(), vk.display()))?;
            println!(
                "✅ Keys for {} blocks saved to {} and {}",
                num_blocks,
                pk.display(),
                vk.display()
            );
        }

        Commands::Prove { pk, out, key_hash, ciphertext, root, key, plaintext } => {
            let public = PublicInputs::parse(&key_hash, &expand_values(&ciphertext)?, &root)?;
            let witness = PrivateWitness::parse(&key, &expand_values(&plaintext)?)?;
            let proving_key = utils::load_proving_key(&pk)
                .with_context(|| format!("loading proving key {}", pk.display()))?;
            let engine = Contingent::from_proving_key(proving_key)?;
            let proof = engine.prove(&public, &witness)?;
            save_proof(&proof, &out).with_context(|| format!("writing {}", out.display()))?;
            println!("✅ Proof saved to {}", out.display());
        }

        Commands::Verify { vk, proof, key_hash, ciphertext, root } => {
            let public = PublicInputs::parse(&key_hash, &expand_values(&ciphertext)?, &root)?;
            let verifying_key = utils::load_verifying_key(&vk).context("loading verifying key")?;
            let engine = Contingent::for_verifier(verifying_key)?;
            let text = fs::read_to_string(&proof)
                .with_context(|| format!("reading {}", proof.display()))?;
            if engine.verify_json(&text, &public)? {
                println!("Verification Passed!");
            } else {
                eprintln!("Verification Failed!");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Encrypt { input, num_blocks, key, out } => {
            let config = CircuitConfig::new(num_blocks)?;
            let data = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let key = match key {
                Some(k) => parse_field(&k)?,
                None => document::random_key(&mut OsRng),
            };
            let sealed = Document::from_bytes(&data, &config)?.seal(key);

            fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;
            write_lines(&out.join("ciphertext.txt"), sealed.ciphertext.iter().map(format_field))?;
            write_lines(&out.join("plaintext.txt"), sealed.plaintext.iter().map(format_field))?;
            write_lines(&out.join("key.txt"), [format_field(&sealed.key)])?;
            write_lines(&out.join("key_hash.txt"), [hex::encode(sealed.key_hash)])?;
            write_lines(&out.join("root.txt"), [format_field(&sealed.plaintext_root)])?;
            info!(bytes = data.len(), num_blocks, "sealed document");
            println!(
                "✅ Sealed {} bytes into {} blocks under {}",
                data.len(),
                num_blocks,
                out.display()
            );
        }

        Commands::Decrypt { ciphertext, key, out } => {
            let text = fs::read_to_string(&ciphertext)
                .with_context(|| format!("reading {}", ciphertext.display()))?;
            let blocks: Vec<&str> = text.split_whitespace().collect();
            if blocks.is_empty() {
                bail!("{} holds no ciphertext blocks", ciphertext.display());
            }
            let data = Document::open(&parse_fields(&blocks)?, parse_field(&key)?)?;
            fs::write(&out, &data).with_context(|| format!("writing {}", out.display()))?;
            println!("✅ Recovered {} bytes into {}", data.len(), out.display());
        }

        Commands::Inspect { proof } => {
            let proof = load_proof(&proof).with_context(|| format!("loading {}", proof.display()))?;
            println!("num_blocks: {}", proof.num_blocks());
            println!("{}", proof.to_json()?);
        }

        Commands::ExportVk { vk, out } => {
            let verifying_key = utils::load_verifying_key(&vk).context("loading verifying key")?;
            export_verifying_key_to_rs(&verifying_key, &out)?;
            println!("✅ Verifying key exported to {}", out.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
