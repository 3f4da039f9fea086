//! Setting metadata tool (netctl-meta)
//!
//! Inspects the setting priority registry and reads or edits the 802.1x
//! certificate and private-key fields of connection profiles.
//!
//! # Usage
//!
//! ```bash
//! # List setting types in secrets order
//! netctl-meta settings
//!
//! # Show the credential fields of a profile
//! netctl-meta cert show corp-wifi
//!
//! # Store an inline private key
//! netctl-meta cert set corp-wifi private-key --scheme blob --value ./alice.p12 --password secret
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use libnetctl_meta::config::MetaConfig;
use libnetctl_meta::credential::{
    self, blob_file_name, CredentialFieldEntry, CredentialValue, SchemeTag,
    SecretFlags, Setting8021x,
};
use libnetctl_meta::profile::{ConnectionProfile, ProfileManager};
use libnetctl_meta::setting::{self, SettingTypeEntry};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Default configuration file
const DEFAULT_CONFIG_PATH: &str = "/etc/netctl/netctl-meta.toml";

#[derive(Parser)]
#[command(name = "netctl-meta")]
#[command(version)]
#[command(about = "Setting metadata tool - setting priorities and 802.1x credential schemes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Terse output mode (colon separated)
    #[arg(short = 't', long, global = true)]
    terse: bool,

    /// JSON output
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered setting types
    Settings {
        /// Sort by name instead of priority
        #[arg(long)]
        by_name: bool,
    },

    /// Show one setting type
    Lookup {
        /// Setting name, e.g. 802-11-wireless
        name: String,
    },

    /// List profiles in the profile directory
    Profiles,

    /// Show the order in which a profile's secrets are requested
    Order {
        /// Profile name or path
        profile: String,
    },

    /// Validate a profile
    Verify {
        /// Profile name or path
        profile: String,
    },

    /// Manage 802.1x certificate and key fields
    #[command(subcommand)]
    Cert(CertCommands),
}

#[derive(Subcommand)]
enum CertCommands {
    /// Show credential fields
    Show {
        /// Profile name or path
        profile: String,
        /// Field key, e.g. ca-cert (default: all)
        field: Option<String>,
    },

    /// Store a credential value
    Set {
        /// Profile name or path
        profile: String,
        /// Field key
        field: String,
        /// Storage scheme
        #[arg(long, value_enum)]
        scheme: SchemeArg,
        /// Path, PKCS#11 URI, or for blobs a local file to inline
        #[arg(long)]
        value: String,
        /// Private-key password
        #[arg(long)]
        password: Option<String>,
    },

    /// Remove a credential value
    Clear {
        /// Profile name or path
        profile: String,
        /// Field key
        field: String,
    },

    /// Show or change private-key password flags
    Flags {
        /// Profile name or path
        profile: String,
        /// Field key
        field: String,
        /// New flags value
        #[arg(long)]
        set: Option<u32>,
    },

    /// Write an inline blob to the certificate directory and reference it by path
    Export {
        /// Profile name or path
        profile: String,
        /// Field key
        field: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Path,
    Blob,
    Uri,
}

impl From<SchemeArg> for SchemeTag {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Path => SchemeTag::Path,
            SchemeArg::Blob => SchemeTag::Blob,
            SchemeArg::Uri => SchemeTag::Uri,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    init_logging(&cli, &config);

    let result = match &cli.command {
        Commands::Settings { by_name } => handle_settings(*by_name, &cli),
        Commands::Lookup { name } => handle_lookup(name, &cli),
        Commands::Profiles => handle_profiles(&config).await,
        Commands::Order { profile } => handle_order(profile, &cli, &config).await,
        Commands::Verify { profile } => handle_verify(profile, &config).await,
        Commands::Cert(cmd) => handle_cert(cmd, &cli, &config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MetaConfig> {
    match &cli.config {
        Some(path) => MetaConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Ok(MetaConfig::load(DEFAULT_CONFIG_PATH)?)
        }
        None => Ok(MetaConfig::default()),
    }
}

fn init_logging(cli: &Cli, config: &MetaConfig) {
    let log_level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_deref().unwrap_or(&config.defaults.log_level)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("netctl_meta={},libnetctl_meta={}", log_level, log_level))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

// ============================================================================
// SETTING REGISTRY
// ============================================================================

fn print_entries(entries: &[&SettingTypeEntry], cli: &Cli) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else if cli.terse {
        for entry in entries {
            println!(
                "{}:{}:{}:{}",
                entry.name,
                entry.priority,
                entry.priority.value(),
                if entry.is_base_type { "yes" } else { "no" }
            );
        }
    } else {
        println!("{:28} {:12} {:5} {:5} {}", "NAME", "PRIORITY", "VALUE", "BASE", "TYPE");
        for entry in entries {
            println!(
                "{:28} {:12} {:5} {:5} {}",
                entry.name,
                entry.priority,
                entry.priority.value(),
                if entry.is_base_type { "yes" } else { "no" },
                entry.type_handle
            );
        }
    }
    Ok(())
}

fn handle_settings(by_name: bool, cli: &Cli) -> anyhow::Result<()> {
    let entries: Vec<&SettingTypeEntry> = if by_name {
        setting::SETTING_INFOS.iter().collect()
    } else {
        setting::iterate_by_priority().collect()
    };
    print_entries(&entries, cli)
}

fn handle_lookup(name: &str, cli: &Cli) -> anyhow::Result<()> {
    let Some(entry) = setting::lookup_by_name(name) else {
        bail!("Not found: unknown setting '{}'", name);
    };
    print_entries(&[entry], cli)
}

// ============================================================================
// PROFILES
// ============================================================================

/// Accept either a path to a profile file or a name in the profile directory
fn resolve_profile(profile: &str, config: &MetaConfig) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(profile);
    if path.exists() {
        return Ok(path);
    }
    Ok(ProfileManager::new(&config.paths.profile_dir).profile_path(profile)?)
}

async fn load_profile(profile: &str, config: &MetaConfig) -> anyhow::Result<(PathBuf, ConnectionProfile)> {
    let path = resolve_profile(profile, config)?;
    let loaded = ConnectionProfile::from_file(&path)
        .await
        .with_context(|| format!("reading profile {}", path.display()))?;
    Ok((path, loaded))
}

async fn handle_profiles(config: &MetaConfig) -> anyhow::Result<()> {
    let manager = ProfileManager::new(&config.paths.profile_dir);
    for name in manager.list_profiles().await? {
        println!("{}", name);
    }
    Ok(())
}

async fn handle_order(profile: &str, cli: &Cli, config: &MetaConfig) -> anyhow::Result<()> {
    let (_, loaded) = load_profile(profile, config).await?;
    let order = loaded.secrets_order()?;
    print_entries(&order, cli)
}

async fn handle_verify(profile: &str, config: &MetaConfig) -> anyhow::Result<()> {
    let (path, loaded) = load_profile(profile, config).await?;
    loaded.verify()?;
    let base_dir = path.parent().map(Path::to_path_buf);
    loaded.to_setting_8021x(base_dir.as_deref())?;
    println!("{}: ok", loaded.connection.id);
    Ok(())
}

// ============================================================================
// CREDENTIALS
// ============================================================================

fn field_entry(key: &str) -> anyhow::Result<&'static CredentialFieldEntry> {
    credential::lookup_by_key(key)
        .with_context(|| format!("Not found: unknown credential field '{}'", key))
}

struct LoadedSetting {
    path: PathBuf,
    profile: ConnectionProfile,
    setting: Setting8021x,
}

async fn load_setting(profile: &str, config: &MetaConfig) -> anyhow::Result<LoadedSetting> {
    let (path, profile) = load_profile(profile, config).await?;
    let base_dir = path.parent().map(Path::to_path_buf);
    let setting = profile
        .to_setting_8021x(base_dir.as_deref())?
        .unwrap_or_default();
    Ok(LoadedSetting { path, profile, setting })
}

impl LoadedSetting {
    async fn save(mut self) -> anyhow::Result<()> {
        self.profile.store_setting_8021x(&self.setting)?;
        self.profile.to_file(&self.path).await?;
        Ok(())
    }
}

fn describe(value: CredentialValue<'_>) -> String {
    match value {
        CredentialValue::None => "--".to_string(),
        CredentialValue::Path(path) => path.to_string(),
        CredentialValue::Blob(data) => format!("<{} bytes>", data.len()),
        CredentialValue::Uri(uri) => uri.to_string(),
    }
}

async fn handle_cert(cmd: &CertCommands, cli: &Cli, config: &MetaConfig) -> anyhow::Result<()> {
    match cmd {
        CertCommands::Show { profile, field } => {
            let loaded = load_setting(profile, config).await?;
            let selected: Vec<&CredentialFieldEntry> = match field {
                Some(key) => vec![field_entry(key)?],
                None => credential::entries().collect(),
            };

            if cli.json {
                let rows: Vec<_> = selected
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "field": entry.key,
                            "scheme": credential::active_scheme(entry.field, &loaded.setting),
                            "format": credential::format(entry.field, &loaded.setting),
                            "value": describe(credential::read(entry.field, &loaded.setting)),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if cli.terse {
                for entry in selected {
                    println!(
                        "{}:{}:{}:{}",
                        entry.key,
                        credential::active_scheme(entry.field, &loaded.setting),
                        credential::format(entry.field, &loaded.setting),
                        describe(credential::read(entry.field, &loaded.setting))
                    );
                }
            } else {
                println!("{:20} {:8} {:8} {}", "FIELD", "SCHEME", "FORMAT", "VALUE");
                for entry in selected {
                    println!(
                        "{:20} {:8} {:8} {}",
                        entry.key,
                        credential::active_scheme(entry.field, &loaded.setting),
                        credential::format(entry.field, &loaded.setting),
                        describe(credential::read(entry.field, &loaded.setting))
                    );
                }
            }
        }
        CertCommands::Set { profile, field, scheme, value, password } => {
            let entry = field_entry(field)?;
            let mut loaded = load_setting(profile, config).await?;
            let scheme = SchemeTag::from(*scheme);

            let data = match scheme {
                SchemeTag::Blob => tokio::fs::read(value)
                    .await
                    .with_context(|| format!("reading {}", value))?,
                _ => value.as_bytes().to_vec(),
            };

            if entry.is_secret && password.is_some() {
                credential::set_secret_flags(entry.field, &mut loaded.setting, config.password_flags()?)?;
            }

            let format = credential::write(
                entry.field,
                &mut loaded.setting,
                Some(data.as_slice()),
                scheme,
                password.as_deref(),
            )?;
            info!("Stored {} as {} ({})", entry.key, scheme, format);
            println!("{}: {} ({})", entry.key, scheme, format);
            loaded.save().await?;
        }
        CertCommands::Clear { profile, field } => {
            let entry = field_entry(field)?;
            let mut loaded = load_setting(profile, config).await?;
            credential::write(entry.field, &mut loaded.setting, None, SchemeTag::None, None)?;
            println!("{}: cleared", entry.key);
            loaded.save().await?;
        }
        CertCommands::Flags { profile, field, set } => {
            let entry = field_entry(field)?;
            let mut loaded = load_setting(profile, config).await?;
            match set {
                Some(bits) => {
                    let Some(flags) = SecretFlags::from_bits(*bits) else {
                        bail!("Invalid parameter: unknown secret flag bits {:#x}", bits);
                    };
                    credential::set_secret_flags(entry.field, &mut loaded.setting, flags)?;
                    println!("{}: {}", entry.key, flags.bits());
                    loaded.save().await?;
                }
                None => {
                    let flags = credential::secret_flags(entry.field, &loaded.setting)?;
                    println!("{}: {}", entry.key, flags.bits());
                }
            }
        }
        CertCommands::Export { profile, field } => {
            let entry = field_entry(field)?;
            let mut loaded = load_setting(profile, config).await?;
            let CredentialValue::Blob(data) = credential::read(entry.field, &loaded.setting) else {
                bail!("Invalid parameter: '{}' does not hold an inline blob", entry.key);
            };

            let uuid = loaded.profile.uuid()?;
            let format = credential::format(entry.field, &loaded.setting);
            let target = config.paths.cert_dir.join(blob_file_name(&uuid, entry.field, format));
            tokio::fs::create_dir_all(&config.paths.cert_dir).await?;
            tokio::fs::write(&target, data).await?;
            debug!("Wrote {} bytes to {}", data.len(), target.display());

            let target_str = target.to_string_lossy().into_owned();
            let password = credential::password(entry.field, &loaded.setting)
                .ok()
                .flatten()
                .map(str::to_owned);
            credential::write(
                entry.field,
                &mut loaded.setting,
                Some(target_str.as_bytes()),
                SchemeTag::Path,
                password.as_deref(),
            )?;
            println!("{}: {}", entry.key, target.display());
            loaded.save().await?;
        }
    }
    Ok(())
}
