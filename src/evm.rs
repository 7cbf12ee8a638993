//! `alloy` implementations of [`WalletProvider`] and [`WaveContract`] over a
//! wallet JSON-RPC endpoint (Frame, or a dev node with unlocked accounts).
//! Signing stays inside the wallet: writes go out as `eth_sendTransaction`.

use crate::{
    contract::{
        PendingWave,
        WaveContract,
        WaveStream,
    },
    error::{
        Error,
        Result,
    },
    wallets::WalletProvider,
    waves::{
        Account,
        RawWave,
    },
};
use alloy::{
    network::ReceiptResponse,
    primitives::{
        Address,
        U256,
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    sol,
};
use futures::{
    FutureExt,
    StreamExt,
};
use url::Url;

sol! {
    #[sol(rpc)]
    contract WavePortal {
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        event NewWave(address indexed from, uint256 timestamp, string message);

        function wave(string memory _message) public;
        function getAllWaves() public view returns (Wave[] memory);
        function getTotalWaves() public view returns (uint256);
    }
}

pub fn connect(url: Url) -> DynProvider {
    ProviderBuilder::new().connect_http(url).erased()
}

fn account_of(address: Address) -> Account {
    Account::new(address.to_string())
}

fn seconds(value: U256) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidWave(format!("timestamp {value} overflows")))
}

#[derive(Clone)]
pub struct RpcWallet {
    provider: DynProvider,
}

impl RpcWallet {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Account>> {
        let accounts = self
            .provider
            .get_accounts()
            .await
            .map_err(Error::contract_call)?;
        Ok(accounts.into_iter().map(account_of).collect())
    }

    async fn request_accounts(&self) -> Result<Vec<Account>> {
        let accounts: Vec<Address> = self
            .provider
            .raw_request("eth_requestAccounts".into(), ())
            .await
            .map_err(|err| Error::AuthorizationDenied(err.to_string()))?;
        Ok(accounts.into_iter().map(account_of).collect())
    }
}

#[derive(Clone)]
pub struct RpcWaveContract {
    provider: DynProvider,
    instance: WavePortal::WavePortalInstance<DynProvider>,
}

impl RpcWaveContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        let instance = WavePortal::new(address, provider.clone());
        Self { provider, instance }
    }

    async fn signer(&self) -> Result<Address> {
        let accounts = self
            .provider
            .get_accounts()
            .await
            .map_err(Error::contract_call)?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| Error::contract_call("wallet exposes no signing account"))
    }
}

impl WaveContract for RpcWaveContract {
    async fn wave(&self, message: String, gas_limit: u64) -> Result<PendingWave> {
        let from = self.signer().await?;
        let pending = self
            .instance
            .wave(message)
            .from(from)
            .gas(gas_limit)
            .send()
            .await
            .map_err(Error::contract_call)?;
        let hash = pending.tx_hash().to_string();
        let confirmation = async move {
            let receipt = pending
                .get_receipt()
                .await
                .map_err(Error::transaction_failure)?;
            if receipt.status() {
                Ok(())
            } else {
                Err(Error::transaction_failure(format!(
                    "transaction {} reverted",
                    receipt.transaction_hash()
                )))
            }
        }
        .boxed();
        Ok(PendingWave::new(hash, confirmation))
    }

    async fn total_waves(&self) -> Result<u64> {
        let count = self
            .instance
            .getTotalWaves()
            .call()
            .await
            .map_err(Error::contract_call)?;
        u64::try_from(count).map_err(|_| Error::contract_call(format!("count {count} overflows")))
    }

    async fn all_waves(&self) -> Result<Vec<RawWave>> {
        let waves = self
            .instance
            .getAllWaves()
            .call()
            .await
            .map_err(Error::contract_call)?;
        waves
            .into_iter()
            .map(|wave| -> Result<RawWave> {
                Ok(RawWave::new(
                    wave.waver.to_string(),
                    seconds(wave.timestamp)?,
                    wave.message,
                ))
            })
            .collect()
    }

    async fn new_waves(&self) -> Result<WaveStream> {
        let poller = self
            .instance
            .NewWave_filter()
            .watch()
            .await
            .map_err(Error::contract_call)?;
        let stream = poller.into_stream().map(|item| -> Result<RawWave> {
            let (event, _log) = item.map_err(Error::contract_call)?;
            Ok(RawWave::new(
                event.from.to_string(),
                seconds(event.timestamp)?,
                event.message,
            ))
        });
        Ok(stream.boxed())
    }
}
