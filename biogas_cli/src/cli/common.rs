use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use biogas_client::{
    ApiClient, ClientConfig, FileTokenStore, KeyringTokenStore, MemoryTokenStore, RefreshFailure,
    SessionContext, SessionObserver, TokenStore,
};
use biogas_core::UserProfile;
use clap::{Args, ValueEnum};
use directories::ProjectDirs;

const KEYRING_SERVICE: &str = "biogas";
const KEYRING_ACCOUNT_PREFIX: &str = "session";
const SESSION_FILE: &str = "session.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum StoreKind {
    Keyring,
    File,
    Memory,
}

/// Where the backend is and where the session lives. Flags win over the
/// `BIOGAS_*` environment variables.
#[derive(Debug, Args)]
pub(crate) struct ConnectionArgs {
    /// Backend base URL [env: BIOGAS_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session storage backend [env: BIOGAS_STORE] [default: keyring]
    #[arg(long, global = true, value_enum)]
    store: Option<StoreKind>,

    /// Session file for `--store file` [env: BIOGAS_STORE_PATH]
    #[arg(long, global = true)]
    store_path: Option<PathBuf>,

    /// Institution slug for resource commands [env: BIOGAS_INSTITUTION]
    #[arg(long, global = true)]
    institution: Option<String>,
}

impl ConnectionArgs {
    pub(crate) fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let base_url = match &self.api_url {
            Some(url) => url.clone(),
            None => env::var("BIOGAS_API_URL").map_err(|_| {
                anyhow::anyhow!("backend URL is required; pass --api-url or set BIOGAS_API_URL")
            })?,
        };

        let mut config = ClientConfig::new(base_url);
        if let Ok(user_agent) = env::var("BIOGAS_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(raw) = env::var("BIOGAS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().with_context(|| {
                format!("BIOGAS_TIMEOUT_SECS must be whole seconds, got `{raw}`")
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.login_entry_point = "biogas auth login".to_owned();
        config.validate().context("invalid client configuration")?;
        Ok(config)
    }

    pub(crate) fn store_kind(&self) -> anyhow::Result<StoreKind> {
        if let Some(kind) = self.store {
            return Ok(kind);
        }
        match env::var("BIOGAS_STORE") {
            Ok(raw) => StoreKind::from_str(raw.trim(), true)
                .map_err(|_| anyhow::anyhow!("BIOGAS_STORE must be keyring, file or memory")),
            Err(_) => Ok(StoreKind::Keyring),
        }
    }

    pub(crate) fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .or_else(|| env::var_os("BIOGAS_STORE_PATH").map(PathBuf::from))
            .unwrap_or_else(default_store_path)
    }

    pub(crate) fn build_store(&self) -> anyhow::Result<Arc<dyn TokenStore>> {
        let kind = self.store_kind()?;
        log::debug!("using {kind:?} session store");
        Ok(match kind {
            StoreKind::Keyring => Arc::new(KeyringTokenStore::new(
                KEYRING_SERVICE,
                KEYRING_ACCOUNT_PREFIX,
            )),
            StoreKind::File => Arc::new(FileTokenStore::new(self.store_path())),
            StoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }

    pub(crate) fn session(&self) -> anyhow::Result<SessionContext> {
        let session = SessionContext::new(self.build_store()?);
        if let Some(institution) = self.institution_override() {
            session
                .set_institution(&institution)
                .context("failed to store selected institution")?;
        }
        Ok(session)
    }

    pub(crate) fn client(&self) -> anyhow::Result<ApiClient> {
        let config = self.client_config()?;
        let session = self.session()?;
        ApiClient::with_observer(&config, session, Arc::new(CliObserver))
            .context("failed to create api client")
    }

    fn institution_override(&self) -> Option<String> {
        self.institution
            .clone()
            .or_else(|| env::var("BIOGAS_INSTITUTION").ok())
            .filter(|slug| !slug.trim().is_empty())
    }
}

fn default_store_path() -> PathBuf {
    match ProjectDirs::from("org", "biogas", "biogas") {
        Some(dirs) => dirs.data_dir().join(SESSION_FILE),
        None => {
            log::warn!("no platform data directory; using ./{SESSION_FILE}");
            PathBuf::from(SESSION_FILE)
        }
    }
}

/// Tells the operator to sign in again once the session cannot be renewed.
struct CliObserver;

impl SessionObserver for CliObserver {
    fn on_session_expired(&self, reason: &RefreshFailure) {
        eprintln!("Session expired ({reason}). Run `biogas auth login` to sign in again.");
    }
}

pub(crate) fn print_user(user: &UserProfile) {
    println!("User: {} ({})", user.username, user.id);
    println!("Name: {}", user.display_name());
    let email = if user.email.is_empty() {
        "<none>"
    } else {
        user.email.as_str()
    };
    println!("Email: {email}");
    println!(
        "Role: {}",
        user.profile
            .role
            .map(|role| format!("{role:?}"))
            .unwrap_or_else(|| "<none>".to_owned())
    );
    println!("Approved: {}", if user.is_approved() { "yes" } else { "no" });

    let granted: Vec<&str> = user
        .granted_permissions()
        .into_iter()
        .map(|permission| permission.as_str())
        .collect();
    if granted.is_empty() {
        println!("Permissions: <none>");
    } else {
        println!("Permissions: {}", granted.join(","));
    }
}

pub(crate) fn write_output(out: &Path, contents: &[u8]) -> anyhow::Result<()> {
    fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} bytes to {}", contents.len(), out.display());
    Ok(())
}
