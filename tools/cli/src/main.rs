//! dropweb CLI - owner-facing front end for the publishing proxy.
//!
//! This tool fetches published documents through the revalidating cache,
//! renders them, and manages the publishing account.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use dropweb_common::{Account, PageName, Password};
use dropweb_pages::{LocalPageStore, PublisherConfig, RevalidatingCache, StaticAccounts};
use dropweb_storage::HttpRemote;

#[derive(Parser)]
#[command(name = "dropweb")]
#[command(about = "dropweb - publish plaintext and encrypted documents from a remote store")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: platform config dir).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page through the cache and print it as HTML.
    Show {
        /// Page name.
        name: String,

        /// Print metadata as JSON instead of HTML.
        #[arg(short, long)]
        meta: bool,

        /// Refuse pages restricted to the owner.
        #[arg(long)]
        public_only: bool,
    },

    /// Decrypt a local encrypted text file.
    Decrypt {
        /// Encrypted file.
        input: PathBuf,

        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encrypt a local file into the legacy encrypted format.
    Encrypt {
        /// Plaintext file.
        input: PathBuf,

        /// Output file.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage the publishing account.
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Replace the account.
    Set {
        /// Document URL pattern with a %s placeholder for the page name.
        #[arg(short, long)]
        url_template: String,
    },

    /// Show the configured account.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for page output
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => PublisherConfig::default_path()?,
    };

    match cli.command {
        Commands::Show {
            name,
            meta,
            public_only,
        } => cmd_show(&config_path, &name, meta, public_only).await,

        Commands::Decrypt { input, output } => cmd_decrypt(&input, output.as_deref()).await,

        Commands::Encrypt { input, output } => cmd_encrypt(&input, &output).await,

        Commands::Account { command } => match command {
            AccountCommands::Set { url_template } => cmd_account_set(&config_path, url_template),
            AccountCommands::Show => cmd_account_show(&config_path),
        },
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(password))
}

/// Prompt for a new password twice.
fn prompt_new_password() -> Result<Zeroizing<String>> {
    let password = prompt_password("Enter password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok(password)
}

fn load_config(path: &Path) -> Result<PublisherConfig> {
    PublisherConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Wire the cache to HTTP and the on-disk page store.
fn build_cache(config: &PublisherConfig) -> Result<RevalidatingCache> {
    let cache_config = config.cache_config();
    let cache_dir = config.resolved_cache_dir()?;

    let remote = HttpRemote::with_timeout(cache_config.timeout)?;
    let store = LocalPageStore::new(&cache_dir)
        .with_context(|| format!("Failed to open page cache at {}", cache_dir.display()))?;
    let accounts = StaticAccounts::new(config.accounts.clone());

    Ok(RevalidatingCache::new(
        Arc::new(remote),
        Arc::new(store),
        Arc::new(accounts),
        cache_config,
    ))
}

/// Fetch and print a page.
async fn cmd_show(config_path: &Path, name: &str, meta_only: bool, public_only: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let cache = build_cache(&config)?;
    let name = PageName::new(name).context("Invalid page name")?;

    let page = match cache.get_page(&name).await {
        Ok(page) => page,
        Err(e) => match e.status() {
            Some(status) => anyhow::bail!("Page '{}' unavailable: remote status {}", name, status),
            None => {
                return Err(e).with_context(|| format!("Failed to load page '{}'", name))
            }
        },
    };

    let (html, meta) = page.rendered_html_and_meta();

    if public_only && meta.restricted {
        anyhow::bail!("Page '{}' is restricted to the owner", name);
    }

    if meta_only {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print!("{}", html);
    }

    Ok(())
}

/// Decrypt a local file.
async fn cmd_decrypt(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    if !dropweb_crypto::is_encrypted(&raw) {
        anyhow::bail!("{} is not an encrypted file", input.display());
    }

    let password = prompt_password("Enter password: ")?;
    let plaintext = Zeroizing::new(
        dropweb_crypto::open(&raw, password.as_bytes()).context("Not an encrypted file")?,
    );

    match output {
        Some(path) => {
            tokio::fs::write(path, plaintext.as_slice())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Decrypted {} bytes to {}", plaintext.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Encrypt a local file.
async fn cmd_encrypt(input: &Path, output: &Path) -> Result<()> {
    let plaintext = Zeroizing::new(
        tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?,
    );

    if dropweb_crypto::is_encrypted(&plaintext) {
        anyhow::bail!("{} is already encrypted", input.display());
    }

    let password = prompt_new_password()?;
    let sealed = dropweb_crypto::seal(&plaintext, password.as_bytes());

    tokio::fs::write(output, &sealed)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Encrypted {} -> {}", input.display(), output.display());
    Ok(())
}

/// Replace the publishing account.
fn cmd_account_set(config_path: &Path, url_template: String) -> Result<()> {
    let mut config = load_config(config_path)?;

    let password = prompt_new_password()?;
    let account = Account::new(url_template, Password::new(password.as_str()))
        .context("Invalid account")?;

    config.set_account(account);
    config
        .save(config_path)
        .with_context(|| format!("Failed to save configuration to {}", config_path.display()))?;

    println!("Account saved to {}", config_path.display());
    Ok(())
}

/// Show the account without its password.
fn cmd_account_show(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    match config.accounts.as_slice() {
        [] => println!("No account configured."),
        [account] => {
            println!("Account:");
            println!("  URL template: {}", account.url_template);
            println!(
                "  Password: {}",
                if account.password.is_empty() { "(none)" } else { "(set)" }
            );
        }
        accounts => println!(
            "{} accounts configured; exactly one is required.",
            accounts.len()
        ),
    }

    Ok(())
}
