//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! Layers, lowest priority first: serde defaults, `SAW_*` env vars (`__` nests),
//! then the optional TOML file. CLI flags are applied on top by the binary.

use anyhow::{Context, bail};
use aws_config::{BehaviorVersion, SdkConfig};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// 📦 The AppConfig: one struct to rule them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 🧵 How many workers, how deep the channels.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// ☁️ Where the SDK should point, when the default chain is not enough.
    #[serde(default)]
    pub aws: AwsConfig,
}

/// 🧵 The only concurrency knobs in the building. Read-only once a pipeline starts.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// 🧵 Number of workers in the pool. Must be at least 1.
    #[serde(default = "default_concurrency", alias = "workers")]
    pub concurrency: usize,
    /// 📦 Capacity of every bounded channel between stages. Must be at least 1.
    #[serde(default = "default_queue_capacity", alias = "channel_size")]
    pub queue_capacity: usize,
}

fn default_concurrency() -> usize {
    2
}

// 📦 100 items in flight per stage. small enough to stay polite, big enough to keep workers fed.
fn default_queue_capacity() -> usize {
    100
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl RuntimeConfig {
    /// 🔒 Configuration errors are caught here, before anything spawns.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            bail!("💀 runtime.concurrency must be at least 1. A pool of zero workers is a very quiet pool.");
        }
        if self.queue_capacity == 0 {
            bail!("💀 runtime.queue_capacity must be at least 1. Rendezvous channels are not on the menu.");
        }
        Ok(())
    }
}

/// ☁️ Optional overrides for the AWS SDK. Anything left `None` falls through to the
/// SDK's default chain (env vars, `~/.aws/config`, IAM role, hope).
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AwsConfig {
    /// 🌎 Region override. Otherwise the SDK picks one, or tells you it can't.
    #[serde(default)]
    pub region: Option<String>,
    /// 🪪 Named profile from the shared config files.
    #[serde(default)]
    pub profile: Option<String>,
    /// 🔗 Custom endpoint, e.g. LocalStack on `http://localhost:4566`.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// 🪣 Path-style S3 addressing (`host/bucket/key`), usually needed with custom endpoints.
    #[serde(default)]
    pub force_path_style: bool,
}

impl AwsConfig {
    /// 🚀 Resolve an `SdkConfig` from the default chain plus whatever was overridden here.
    pub(crate) async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        loader.load().await
    }
}

/// 🚀 Load the config: from a file, from env vars, or from the sheer power of hoping.
///
/// 📐 DESIGN NOTE:
///   - `config_file_name` is None  → defaults + env vars only.
///   - `config_file_name` is Some  → defaults + env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if config is unparseable, or if the file was named but isn't there.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("SAW_").split("__"));

    let config = match config_file_name {
        Some(file_name) => {
            // -- 🕵️ Toml::file is quietly optional. we are not. a named file must exist.
            if !file_name.try_exists().with_context(|| {
                format!("💀 Could not check whether '{}' exists", file_name.display())
            })? {
                bail!(
                    "💀 Configuration file '{}' does not exist. Double check the path, or use an absolute one.",
                    file_name.display()
                );
            }
            config.merge(Toml::file(file_name))
        }
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (SAW_*). \
             The file exists on disk, but not in a shape we recognize.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (SAW_*). \
                 No file was provided, this one's all on the environment. Classic."
            .to_string(),
    };

    let app_config: AppConfig = config.extract().context(context_msg)?;
    app_config.runtime.validate()?;
    Ok(app_config)
}
