use crate::{
    error::{
        Error,
        Result,
    },
    waves::Account,
};
use std::future::Future;
use tracing::{
    info,
    warn,
};

/// Account access brokered by a wallet (`eth_accounts` / `eth_requestAccounts`).
pub trait WalletProvider: Send + Sync + 'static {
    /// Accounts the user already authorized. Never prompts.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Account>>> + Send;

    /// Asks the user to authorize this client.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Account>>> + Send;
}

/// Entry point to the optional wallet. `None` means no wallet is installed.
pub struct WalletGateway<P> {
    provider: Option<P>,
}

impl<P> WalletGateway<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }
}

impl<P: WalletProvider> WalletGateway<P> {
    /// Silent check for an account authorized in an earlier session.
    ///
    /// Provider errors are logged and reported as "no account".
    pub async fn check_existing_authorization(&self) -> Option<Account> {
        let Some(provider) = self.provider.as_ref() else {
            warn!("no wallet provider; make sure a wallet endpoint is configured");
            return None;
        };
        match provider.accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "found an authorized account");
                    Some(account)
                }
                None => {
                    info!("no authorized account found");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "checking wallet authorization failed");
                None
            }
        }
    }

    pub async fn request_authorization(&self) -> Result<Account> {
        let provider = self.provider.as_ref().ok_or(Error::NoProvider)?;
        let accounts = provider
            .request_accounts()
            .await
            .map_err(|err| Error::AuthorizationDenied(err.to_string()))?;
        let account = accounts.into_iter().next().ok_or_else(|| {
            Error::AuthorizationDenied("wallet returned no accounts".to_owned())
        })?;
        info!(%account, "connected");
        Ok(account)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use std::sync::{
        Arc,
        Mutex,
    };

    #[derive(Clone, Default)]
    pub struct FakeWallet {
        authorized: Arc<Mutex<Vec<Account>>>,
        on_request: Arc<Mutex<Option<Vec<Account>>>>,
        prompts: Arc<Mutex<u32>>,
    }

    impl FakeWallet {
        pub fn with_authorized(accounts: Vec<Account>) -> Self {
            let wallet = Self::default();
            *wallet.authorized.lock().unwrap() = accounts;
            wallet
        }

        /// `None` makes the prompt fail like a user rejection.
        pub fn grants_on_request(self, accounts: Option<Vec<Account>>) -> Self {
            *self.on_request.lock().unwrap() = accounts;
            self
        }

        pub fn prompts(&self) -> u32 {
            *self.prompts.lock().unwrap()
        }
    }

    impl WalletProvider for FakeWallet {
        async fn accounts(&self) -> Result<Vec<Account>> {
            Ok(self.authorized.lock().unwrap().clone())
        }

        async fn request_accounts(&self) -> Result<Vec<Account>> {
            *self.prompts.lock().unwrap() += 1;
            let granted = self.on_request.lock().unwrap().clone();
            match granted {
                Some(accounts) => {
                    *self.authorized.lock().unwrap() = accounts.clone();
                    Ok(accounts)
                }
                None => Err(Error::contract_call("User rejected the request.")),
            }
        }
    }

    pub struct FailingWallet;

    impl WalletProvider for FailingWallet {
        async fn accounts(&self) -> Result<Vec<Account>> {
            Err(Error::contract_call("connection refused"))
        }

        async fn request_accounts(&self) -> Result<Vec<Account>> {
            Err(Error::contract_call("connection refused"))
        }
    }

    #[tokio::test]
    async fn check_existing_authorization__returns_first_account() {
        // given
        let gateway = WalletGateway::new(Some(FakeWallet::with_authorized(vec![
            Account::new("0xaaa"),
            Account::new("0xbbb"),
        ])));

        // when
        let account = gateway.check_existing_authorization().await;

        // then
        assert_eq!(account, Some(Account::new("0xaaa")));
    }

    #[tokio::test]
    async fn check_existing_authorization__no_accounts__returns_none_without_prompt() {
        // given
        let wallet = FakeWallet::default();
        let gateway = WalletGateway::new(Some(wallet.clone()));

        // when
        let account = gateway.check_existing_authorization().await;

        // then
        assert_eq!(account, None);
        assert_eq!(wallet.prompts(), 0);
    }

    #[tokio::test]
    async fn check_existing_authorization__provider_error__is_swallowed() {
        let gateway = WalletGateway::new(Some(FailingWallet));
        assert_eq!(gateway.check_existing_authorization().await, None);
    }

    #[tokio::test]
    async fn request_authorization__no_provider__fails_with_no_provider() {
        // given
        let gateway: WalletGateway<FakeWallet> = WalletGateway::new(None);

        // when
        let res = gateway.request_authorization().await;

        // then
        assert!(matches!(res, Err(Error::NoProvider)));
    }

    #[tokio::test]
    async fn request_authorization__granted__returns_account() {
        // given
        let wallet =
            FakeWallet::default().grants_on_request(Some(vec![Account::new("0xccc")]));
        let gateway = WalletGateway::new(Some(wallet.clone()));

        // when
        let account = gateway.request_authorization().await.unwrap();

        // then
        assert_eq!(account, Account::new("0xccc"));
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn request_authorization__rejected__fails_with_authorization_denied() {
        // given
        let gateway = WalletGateway::new(Some(FakeWallet::default().grants_on_request(None)));

        // when
        let res = gateway.request_authorization().await;

        // then
        assert!(matches!(res, Err(Error::AuthorizationDenied(_))));
    }

    #[tokio::test]
    async fn request_authorization__empty_grant__fails_with_authorization_denied() {
        let gateway =
            WalletGateway::new(Some(FakeWallet::default().grants_on_request(Some(vec![]))));
        let res = gateway.request_authorization().await;
        assert!(matches!(res, Err(Error::AuthorizationDenied(_))));
    }
}
