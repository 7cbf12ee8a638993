use crate::deployment::{
    DeploymentEnv,
    DeploymentRecord,
    DeploymentStore,
};
use alloy::primitives::Address;
use clap::{
    ArgGroup,
    Parser,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::PathBuf,
    str::FromStr,
};
use tracing::info;
use url::Url;

pub const DEFAULT_FRAME_URL: &str = "http://127.0.0.1:1248";
pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x4e3c20bEfFC46bD089A07f554F62fF899FCfB1Fc";
pub const DEFAULT_LOG_DIR: &str = "~/.wave-portal/logs";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Wave at a WavePortal contract from the terminal",
    long_about = None,
    group(
        ArgGroup::new("wallet")
            .args(["wallet_url", "frame", "local"])
            .multiple(false)
    )
)]
pub struct Cli {
    /// JSON-RPC endpoint of the wallet that holds your account.
    #[arg(long, env = "WAVE_PORTAL_WALLET_URL")]
    pub wallet_url: Option<Url>,

    /// Use a Frame wallet on its default port.
    #[arg(long)]
    pub frame: bool,

    /// Use a local dev node with unlocked accounts.
    #[arg(long)]
    pub local: bool,

    /// WavePortal contract address.
    #[arg(long, env = "WAVE_PORTAL_CONTRACT")]
    pub contract: Option<String>,

    /// Store `--contract` as the default for this environment.
    #[arg(long, requires = "contract")]
    pub remember: bool,

    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: String,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WalletTarget {
    None,
    Frame { url: Url },
    LocalNode { url: Url },
    Custom { url: Url },
}

impl WalletTarget {
    pub fn url(&self) -> Option<&Url> {
        match self {
            WalletTarget::None => None,
            WalletTarget::Frame { url }
            | WalletTarget::LocalNode { url }
            | WalletTarget::Custom { url } => Some(url),
        }
    }

    pub fn deployment_env(&self) -> DeploymentEnv {
        match self {
            WalletTarget::LocalNode { .. } => DeploymentEnv::Local,
            _ => DeploymentEnv::Live,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub wallet: WalletTarget,
    /// `None` only when there is no wallet to reach the contract through.
    pub contract: Option<Address>,
}

impl Cli {
    pub fn wallet_target(&self) -> Result<WalletTarget> {
        let target = if let Some(url) = &self.wallet_url {
            WalletTarget::Custom { url: url.clone() }
        } else if self.frame {
            WalletTarget::Frame {
                url: Url::parse(DEFAULT_FRAME_URL)?,
            }
        } else if self.local {
            WalletTarget::LocalNode {
                url: Url::parse(DEFAULT_LOCAL_URL)?,
            }
        } else {
            WalletTarget::None
        };
        Ok(target)
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.log_dir)
            .wrap_err_with(|| format!("expanding log dir {}", self.log_dir))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn into_config(self) -> Result<AppConfig> {
        let wallet = self.wallet_target()?;
        if wallet.url().is_none() {
            info!("no wallet configured; running read-only");
            return Ok(AppConfig {
                wallet,
                contract: None,
            });
        }
        let env = wallet.deployment_env();
        let store = DeploymentStore::new(env).wrap_err("opening deployments store")?;
        let address = resolve_contract(&self, &wallet, &store)?;
        Ok(AppConfig {
            wallet,
            contract: Some(address),
        })
    }
}

fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|e| eyre!("Failed to parse contract address '{raw}': {e}"))
}

/// `--contract`, then the stored record, then the built-in live deployment.
fn resolve_contract(
    cli: &Cli,
    wallet: &WalletTarget,
    store: &DeploymentStore,
) -> Result<Address> {
    let env = wallet.deployment_env();
    if let Some(raw) = cli.contract.as_deref() {
        let address = parse_address(raw).wrap_err("parsing --contract")?;
        if cli.remember {
            let record = DeploymentRecord::new(
                address.to_string(),
                wallet.url().map(Url::to_string),
            );
            store.save(&record).wrap_err("saving deployment record")?;
            info!(%address, %env, "remembered contract address");
        }
        return Ok(address);
    }
    if let Some(record) = store.load().wrap_err("loading deployment")? {
        info!(
            contract = %record.contract_address,
            recorded_at = %record.recorded_at,
            %env,
            "using deployment record"
        );
        return parse_address(&record.contract_address);
    }
    match env {
        DeploymentEnv::Live => parse_address(DEFAULT_CONTRACT_ADDRESS),
        DeploymentEnv::Local => Err(eyre!(
            "No deployment record found for {env}; provide --contract"
        )),
    }
}
