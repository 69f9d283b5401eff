//! Key Generation CLI for the Shroud action circuit
//!
//! Generates the Groth16 proving and verifying keys for `ActionCircuit`.
//!
//! Usage:
//!   cargo run --package shroud-prover --bin keygen -- --pk-out ./keys/action.pk --vk-out ./keys/action.vk
//!
//! Keys must be regenerated whenever the circuit changes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::{OsRng, StdRng};
use shroud_prover::{ActionProver, Groth16Prover};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut pk_path = String::from("./keys/action.pk");
    let mut vk_path = String::from("./keys/action.vk");
    let mut force = false;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pk-out" => {
                i += 1;
                pk_path = args.get(i).context("--pk-out needs a path")?.clone();
            }
            "--vk-out" => {
                i += 1;
                vk_path = args.get(i).context("--vk-out needs a path")?.clone();
            }
            "--seed" => {
                i += 1;
                let raw = args.get(i).context("--seed needs a value")?;
                seed = Some(raw.parse().context("--seed must be an integer")?);
            }
            "--force" | "-f" => {
                force = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                print_help();
                bail!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    if !force && Path::new(&pk_path).exists() && Path::new(&vk_path).exists() {
        println!("Keys already exist at:");
        println!("  Proving key:   {}", pk_path);
        println!("  Verifying key: {}", vk_path);
        println!("\nUse --force to regenerate keys.");
        return Ok(());
    }

    println!("Shroud Action Circuit Key Generation");
    println!("====================================");
    println!();
    println!("Performing Groth16 circuit-specific setup...");

    let start = std::time::Instant::now();
    let prover = match seed {
        // Reproducible keys are only for local testing
        Some(seed) => Groth16Prover::setup(&mut StdRng::seed_from_u64(seed))?,
        None => Groth16Prover::setup(&mut OsRng)?,
    };
    println!("Setup complete in {:?}", start.elapsed());
    println!();

    let (pk_bytes, vk_bytes) = prover.to_bytes()?;
    write_key(&pk_path, &pk_bytes, "proving")?;
    write_key(&vk_path, &vk_bytes, "verifying")?;

    println!();
    println!("Verification key hash (blake3):");
    println!("  {}", hex::encode(prover.verification_key_hash()));
    println!();
    println!("To use with Shroud, set environment variables:");
    println!("  export SHROUD_PROVER_BACKEND=groth16");
    println!("  export SHROUD_PROVING_KEY={}", pk_path);
    println!("  export SHROUD_VERIFYING_KEY={}", vk_path);

    Ok(())
}

fn write_key(path: &str, bytes: &[u8], kind: &str) -> Result<()> {
    println!("Saving {} key to {}...", kind, path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {} key directory", kind))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {} key", kind))?;
    println!(
        "  Size: {} bytes ({:.2} MB)",
        bytes.len(),
        bytes.len() as f64 / 1024.0 / 1024.0
    );
    Ok(())
}

fn print_help() {
    println!("Shroud Action Circuit Key Generation Tool");
    println!();
    println!("USAGE:");
    println!("    keygen [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --pk-out <PATH>    Path for proving key output (default: ./keys/action.pk)");
    println!("    --vk-out <PATH>    Path for verifying key output (default: ./keys/action.vk)");
    println!("    --seed <N>         Deterministic setup (testing only)");
    println!("    --force, -f        Overwrite existing keys");
    println!("    --help, -h         Show this help message");
}
