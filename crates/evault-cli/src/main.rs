//! evault: password-based wallet vault CLI
//!
//! Commands:
//!   create            - generate a wallet and seal it under a password
//!   status            - show vault metadata without unlocking
//!   unlock            - verify the password and show the address
//!   change-password   - re-seal the vault under a new password
//!   export <path>     - write the sealed record to a file
//!   import <path>     - unlock an exported record and adopt it
//!   backup <path>     - write an encrypted full backup
//!   restore <path>    - restore the vault from an encrypted backup
//!   wipe              - delete the vault record

mod store;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::info;

use evault_core::EvaultConfig;
use evault_crypto::{strength_report, SecurityLevel, Strength, VaultRecord};
use evault_wallet::{backup, Secp256k1KeySource, VaultManager};

#[derive(Parser, Debug)]
#[command(
    name = "evault",
    version,
    about = "Password-based wallet key vault",
    long_about = "evault: create, unlock, re-seal, export, and back up an encrypted wallet credential"
)]
struct Cli {
    /// Path to evault.toml configuration file (default: ~/.config/evault/evault.toml)
    #[arg(long, short = 'c', env = "EVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Vault record path (overrides config)
    #[arg(long, env = "EVAULT_VAULT_PATH")]
    vault: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "EVAULT_LOG", default_value = "info")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "EVAULT_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a fresh wallet and seal it under a password
    Create {
        /// KDF work factor: "medium" (100k iterations) or "high" (200k)
        #[arg(long)]
        level: Option<String>,
    },

    /// Show vault metadata without unlocking
    Status,

    /// Verify the password and show the wallet address
    Unlock {
        /// Also print the decrypted private key (handle with care)
        #[arg(long)]
        reveal_key: bool,
    },

    /// Re-seal the vault under a new password
    #[command(name = "change-password")]
    ChangePassword,

    /// Write the sealed record to a file (opaque without the password)
    Export {
        /// Destination path
        path: PathBuf,
    },

    /// Unlock an exported record and adopt it as the active vault
    Import {
        /// Exported record to import
        path: PathBuf,
    },

    /// Write an encrypted full backup
    Backup {
        /// Destination path
        path: PathBuf,
    },

    /// Restore the vault from an encrypted backup
    Restore {
        /// Backup file to restore
        path: PathBuf,
    },

    /// Delete the vault record (the credential is unrecoverable without a backup)
    Wipe {
        /// Skip the confirmation check
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config = EvaultConfig::load(&config_path(&cli))?;
    let vault_path = cli.vault.clone().unwrap_or_else(|| config.vault.path.clone());
    let manager = VaultManager::new(Secp256k1KeySource);

    match cli.command {
        Commands::Create { level } => {
            let level: SecurityLevel = level
                .unwrap_or_else(|| config.vault.security_level.clone())
                .parse()?;
            cmd_create(&manager, &vault_path, level)
        }
        Commands::Status => cmd_status(&vault_path),
        Commands::Unlock { reveal_key } => cmd_unlock(&manager, &vault_path, reveal_key),
        Commands::ChangePassword => cmd_change_password(&manager, &vault_path),
        Commands::Export { path } => cmd_export(&vault_path, &path),
        Commands::Import { path } => cmd_import(&manager, &vault_path, &path),
        Commands::Backup { path } => cmd_backup(&manager, &vault_path, &path),
        Commands::Restore { path } => cmd_restore(&manager, &vault_path, &path),
        Commands::Wipe { force } => cmd_wipe(&vault_path, force),
    }
}

fn cmd_create(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
    level: SecurityLevel,
) -> Result<()> {
    if store::exists(vault_path) {
        bail!(
            "a vault already exists at {}: remove it or pass --vault for a new location",
            vault_path.display()
        );
    }

    let password = prompt_password("New vault password: ")?;
    warn_on_weak(&password);
    let confirm = prompt_password("Confirm password: ")?;

    let created = manager.create_vault(&password, &confirm, level)?;
    store::save(vault_path, &manager.export_vault(&created.record)?)?;

    info!(path = %vault_path.display(), "vault written");

    println!("Vault created ({level} security)");
    println!("Address:  {}", created.record.address);
    println!();
    println!("Recovery phrase (shown only once): write it down and store it safely:");
    println!("  {}", created.recovery.words);
    Ok(())
}

fn cmd_status(vault_path: &Path) -> Result<()> {
    let record = load_record(vault_path)?;

    println!("Vault:     {}", vault_path.display());
    println!("Address:   {}", record.address);
    println!("Cipher:    {} / {}", record.algorithm, record.kdf);
    println!(
        "Level:     {} ({} iterations)",
        record.security_level, record.iterations
    );
    println!("Created:   {} (unix ms)", record.created_at);
    Ok(())
}

fn cmd_unlock(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
    reveal_key: bool,
) -> Result<()> {
    let record = load_record(vault_path)?;
    let password = prompt_password("Vault password: ")?;

    let credential = manager.unlock_vault(&record, &password)?;

    println!("Unlocked {}", record.address);
    if reveal_key {
        println!("Private key: 0x{}", hex::encode(credential.as_bytes()));
    }
    Ok(())
}

fn cmd_change_password(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
) -> Result<()> {
    let record = load_record(vault_path)?;

    let old = prompt_password("Current password: ")?;
    let new = prompt_password("New password: ")?;
    warn_on_weak(&new);
    let confirm = prompt_password("Confirm new password: ")?;
    evault_crypto::check_new_password(&new, &confirm)?;

    let new_record = manager.change_password(&record, &old, &new)?;
    store::save(vault_path, &manager.export_vault(&new_record)?)?;

    println!("Password changed for {}", new_record.address);
    Ok(())
}

fn cmd_export(vault_path: &Path, dest: &Path) -> Result<()> {
    // Validate before copying so a corrupt file is caught here, not at import
    let record = load_record(vault_path)?;
    store::save(dest, &record.to_bytes()?)?;

    println!("Exported {} to {}", record.address, dest.display());
    Ok(())
}

fn cmd_import(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
    src: &Path,
) -> Result<()> {
    let data = store::load(src)?;
    let password = prompt_password("Vault password: ")?;

    let (_credential, record) = manager.import_vault(&data, &password)?;
    store::save(vault_path, &manager.export_vault(&record)?)?;

    println!("Imported {}", record.address);
    Ok(())
}

fn cmd_backup(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
    dest: &Path,
) -> Result<()> {
    let record = load_record(vault_path)?;
    let password = prompt_password("Vault password: ")?;

    // Prove the password opens the vault before sealing a backup under it
    manager.unlock_vault(&record, &password)?;

    let sealed = backup::create_backup(&record, &password)?;
    store::save(dest, &sealed.to_bytes()?)?;

    println!("Backup of {} written to {}", record.address, dest.display());
    Ok(())
}

fn cmd_restore(
    manager: &VaultManager<Secp256k1KeySource>,
    vault_path: &Path,
    src: &Path,
) -> Result<()> {
    let data = store::load(src)?;
    let sealed = backup::SealedBackup::from_bytes(&data)?;
    let password = prompt_password("Backup password: ")?;

    let (_credential, record) = backup::restore_backup(manager, &sealed, &password)?;
    store::save(vault_path, &record.to_bytes()?)?;

    println!("Restored {}", record.address);
    Ok(())
}

fn cmd_wipe(vault_path: &Path, force: bool) -> Result<()> {
    let record = load_record(vault_path)?;

    if !force {
        bail!(
            "this deletes the sealed credential for {} permanently; re-run with --force",
            record.address
        );
    }

    std::fs::remove_file(vault_path)
        .with_context(|| format!("removing {}", vault_path.display()))?;

    println!("Wiped vault for {}", record.address);
    Ok(())
}

fn load_record(vault_path: &Path) -> Result<VaultRecord> {
    if !store::exists(vault_path) {
        bail!(
            "no vault at {}: run `evault create` first",
            vault_path.display()
        );
    }
    let data = store::load(vault_path)?;
    Ok(VaultRecord::from_bytes(&data)?)
}

fn prompt_password(prompt: &str) -> Result<SecretString> {
    let password = rpassword::prompt_password(prompt).context("reading password")?;
    Ok(SecretString::from(password))
}

fn warn_on_weak(password: &SecretString) {
    let report = strength_report(password);
    if report.strength != Strength::Strong {
        eprintln!("warning: password scores {}/5", report.score);
        for tip in &report.recommendations {
            eprintln!("  - {tip}");
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config/evault/evault.toml")
    })
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
