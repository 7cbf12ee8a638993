use crate::{
    config::AppConfig,
    contract::{
        ContractClient,
        WaveContract,
    },
    error::{
        Error,
        Result as WaveResult,
    },
    evm::{
        self,
        RpcWallet,
        RpcWaveContract,
    },
    lifecycle::{
        LifecycleEvent,
        run_submission,
    },
    state::{
        AppState,
        CONNECT_FIRST_TEXT,
    },
    subscriber::{
        EventSubscriber,
        LiveWave,
        Subscription,
    },
    ui,
    wallets::{
        WalletGateway,
        WalletProvider,
    },
    waves::{
        Account,
        RawWave,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    info,
    warn,
};


/// How often notice deadlines are checked.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Results of background reads, delivered back to the controller loop.
#[derive(Debug)]
pub enum AppEvent {
    Authorized(Account),
    ConnectFailed(Error),
    History(WaveResult<Vec<RawWave>>),
    TotalWaves(WaveResult<u64>),
}

/// Receiving ends of every channel the controller's tasks report on.
pub struct Inbox {
    pub events: mpsc::UnboundedReceiver<AppEvent>,
    pub live: mpsc::UnboundedReceiver<LiveWave>,
    pub lifecycle: mpsc::UnboundedReceiver<LifecycleEvent>,
}

pub struct AppController<P, C> {
    wallet: Arc<WalletGateway<P>>,
    contract: ContractClient<C>,
    subscriber: EventSubscriber,
    subscription: Option<Subscription>,
    state: AppState,
    events: mpsc::UnboundedSender<AppEvent>,
    lifecycle: mpsc::UnboundedSender<LifecycleEvent>,
}

impl<P: WalletProvider, C: WaveContract> AppController<P, C> {
    pub fn new(wallet: Option<P>, contract: Option<C>) -> (Self, Inbox) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (live_tx, live_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let controller = Self {
            wallet: Arc::new(WalletGateway::new(wallet)),
            contract: ContractClient::new(contract),
            subscriber: EventSubscriber::new(live_tx),
            subscription: None,
            state: AppState::new(),
            events: events_tx,
            lifecycle: lifecycle_tx,
        };
        let inbox = Inbox {
            events: events_rx,
            live: live_rx,
            lifecycle: lifecycle_rx,
        };
        (controller, inbox)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    /// Starts the silent authorization check (which loads history when an
    /// account is found) and the initial count read, then attaches the
    /// `NewWave` listener.
    pub async fn mount(&mut self) {
        let wallet = self.wallet.clone();
        let contract = self.contract.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let Some(account) = wallet.check_existing_authorization().await else {
                return;
            };
            let _ = tx.send(AppEvent::Authorized(account));
            let _ = tx.send(AppEvent::History(contract.all_waves().await));
        });

        if self.contract.is_available() {
            let contract = self.contract.clone();
            let tx = self.events.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::TotalWaves(contract.total_wave_count().await));
            });
        }

        if let Some(subscription) = self.subscriber.attach(&self.contract).await {
            self.state.attach_listener(subscription.id());
            self.subscription = Some(subscription);
        }
    }

    /// Detaches the listener. Anything it already delivered but the loop has
    /// not applied yet is discarded.
    pub fn unmount(&mut self) {
        self.state.detach_listener();
        self.subscription = None;
    }

    pub fn connect(&mut self, now: Instant) {
        if !self.wallet.is_available() {
            self.state.report(&Error::NoProvider, now);
            return;
        }
        let wallet = self.wallet.clone();
        let contract = self.contract.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            match wallet.request_authorization().await {
                Ok(account) => {
                    let _ = tx.send(AppEvent::Authorized(account));
                    let _ = tx.send(AppEvent::History(contract.all_waves().await));
                }
                Err(err) => {
                    let _ = tx.send(AppEvent::ConnectFailed(err));
                }
            }
        });
    }

    pub fn wave(&mut self, now: Instant) {
        if !self.contract.is_available() {
            warn!("wave requested without a wallet provider");
            self.state.flash_error(CONNECT_FIRST_TEXT, now);
            return;
        }
        match self.state.begin_submission(now) {
            Ok(message) => {
                tokio::spawn(run_submission(
                    self.contract.clone(),
                    message,
                    self.lifecycle.clone(),
                ));
            }
            Err(err) => self.state.report(&err, now),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.state.message_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.state.message_mut().pop();
    }

    /// Returns true when the screen needs a redraw.
    pub fn handle_app_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Authorized(account) => self.state.set_account(account),
            AppEvent::ConnectFailed(err) => {
                warn!(error = %err, "connecting wallet failed");
                return false;
            }
            AppEvent::History(Ok(records)) => {
                if let Err(err) = self.state.load_history(records) {
                    warn!(error = %err, "discarding wave history");
                    return false;
                }
            }
            AppEvent::History(Err(err)) => {
                warn!(error = %err, "loading waves failed");
                return false;
            }
            AppEvent::TotalWaves(Ok(total)) => self.state.set_total_waves(total),
            AppEvent::TotalWaves(Err(err)) => {
                warn!(error = %err, "reading total wave count failed");
                return false;
            }
        }
        true
    }

    pub fn handle_live_wave(&mut self, live: LiveWave) -> bool {
        self.state.apply_live_wave(live)
    }

    pub fn handle_lifecycle(&mut self, event: LifecycleEvent, now: Instant) {
        self.state.apply_lifecycle(event, now);
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.state.tick(now)
    }
}

pub async fn run_app(config: &AppConfig) -> Result<()> {
    let (wallet, contract) = match (config.wallet.url(), config.contract) {
        (Some(url), Some(address)) => {
            info!(%url, %address, "using wallet provider");
            let provider = evm::connect(url.clone());
            (
                Some(RpcWallet::new(provider.clone())),
                Some(RpcWaveContract::new(address, provider)),
            )
        }
        _ => (None, None),
    };
    let (controller, inbox) = AppController::new(wallet, contract);
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let res = run_loop(controller, inbox, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<P: WalletProvider, C: WaveContract>(
    mut controller: AppController<P, C>,
    mut inbox: Inbox,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    controller.mount().await;
    ui::draw(ui_state, controller.state()).wrap_err("initial draw failed")?;
    let mut ticker = time::interval(TICK_INTERVAL);

    loop {
        let redraw = tokio::select! {
            Some(event) = inbox.events.recv() => {
                controller.handle_app_event(event)
            }
            Some(live) = inbox.live.recv() => controller.handle_live_wave(live),
            Some(event) = inbox.lifecycle.recv() => {
                controller.handle_lifecycle(event, Instant::now());
                true
            }
            _ = ticker.tick() => controller.tick(Instant::now()),
            _ = tokio::signal::ctrl_c() => break,
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                let now = Instant::now();
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Connect => controller.connect(now),
                    ui::UserEvent::Wave => controller.wave(now),
                    ui::UserEvent::Insert(c) => controller.insert(c),
                    ui::UserEvent::Backspace => controller.backspace(),
                    ui::UserEvent::Redraw => {}
                }
                true
            }
        };
        if redraw {
            ui::draw(ui_state, controller.state()).wrap_err("draw failed")?;
        }
    }

    controller.unmount();
    info!("exiting");
    Ok(())
}
