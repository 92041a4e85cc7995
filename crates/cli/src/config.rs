use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use haven_client::ClientConfig;
use haven_session::{BackoffConfig, RevalidationMode, RevalidationPolicy};

use crate::cli::GlobalArgs;

/// Credential file location relative to `$HOME`.
const DEFAULT_CREDENTIALS_FILE: &str = ".haven/credentials.json";

/// Fully resolved settings: environment first, then command-line flags.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub credentials_path: PathBuf,
    pub revalidation: RevalidationPolicy,
}

/// Settings read from the environment, before flags are applied.
#[derive(Debug, Clone)]
struct EnvSettings {
    client: ClientConfig,
    credentials_path: Option<PathBuf>,
    revalidation: RevalidationPolicy,
}

impl EnvSettings {
    fn load() -> anyhow::Result<Self> {
        Ok(Self {
            client: ClientConfig::from_env().context("Invalid client configuration")?,
            credentials_path: std::env::var_os("HAVEN_CREDENTIALS_PATH").map(PathBuf::from),
            revalidation: RevalidationPolicy::from_env()
                .context("Invalid revalidation configuration")?,
        })
    }
}

impl CliConfig {
    /// | Env Var                           | Flag                | Default                      |
    /// |-----------------------------------|---------------------|------------------------------|
    /// | `HAVEN_BACKEND_URL`               | `--backend-url`     | `http://localhost:8000`      |
    /// | `HAVEN_REQUEST_TIMEOUT_SECS`      | `--timeout-secs`    | `30`                         |
    /// | `HAVEN_CREDENTIALS_PATH`          | `--credentials`     | `$HOME/.haven/credentials.json` |
    /// | `HAVEN_REVALIDATION`              | `--revalidation`    | `fail-closed`                |
    /// | `HAVEN_REVALIDATION_MAX_ATTEMPTS` | `--max-attempts`    | `3`                          |
    pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        Self::layer(EnvSettings::load()?, args)
    }

    /// Apply command-line flags on top of environment settings.
    fn layer(env: EnvSettings, args: &GlobalArgs) -> anyhow::Result<Self> {
        let mut client = env.client;
        if let Some(url) = &args.backend_url {
            client.backend_url = url.clone();
        }
        if let Some(secs) = args.timeout_secs {
            client.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        let credentials_path = match args.credentials.clone().or(env.credentials_path) {
            Some(path) => path,
            None => default_credentials_path()?,
        };

        let mut revalidation = env.revalidation;
        if args.revalidation.is_some() || args.max_attempts.is_some() {
            let (env_mode, env_attempts) = match &revalidation {
                RevalidationPolicy::FailClosed => (
                    RevalidationMode::FailClosed,
                    BackoffConfig::default().max_attempts,
                ),
                RevalidationPolicy::RetryTransient(config) => (
                    RevalidationMode::RetryTransient,
                    config.max_attempts,
                ),
            };
            revalidation = RevalidationPolicy::from_mode(
                args.revalidation.unwrap_or(env_mode),
                args.max_attempts.unwrap_or(env_attempts),
            );
        }

        Ok(Self {
            client,
            credentials_path,
            revalidation,
        })
    }
}

fn default_credentials_path() -> anyhow::Result<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home).join(DEFAULT_CREDENTIALS_FILE)),
        _ => bail!("HOME is not set; pass --credentials or set HAVEN_CREDENTIALS_PATH"),
    }
}
