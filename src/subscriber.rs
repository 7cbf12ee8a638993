use crate::{
    contract::{
        ContractClient,
        WaveContract,
    },
    waves::RawWave,
};
use futures::StreamExt;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Identity of one attachment of the `NewWave` listener.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A `NewWave` notification tagged with the listener that received it.
#[derive(Clone, Debug)]
pub struct LiveWave {
    pub listener: ListenerId,
    pub wave: RawWave,
}

/// Attached listener. Dropping it detaches: the forwarding task is aborted and
/// nothing more is delivered under its id.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(listener = ?self.id, "detaching NewWave listener");
        self.task.abort();
    }
}

/// Hands out listener ids and forwards every attachment into one sink.
pub struct EventSubscriber {
    next_id: u64,
    sink: mpsc::UnboundedSender<LiveWave>,
}

impl EventSubscriber {
    pub fn new(sink: mpsc::UnboundedSender<LiveWave>) -> Self {
        Self { next_id: 0, sink }
    }

    /// Attaches a listener to the contract's `NewWave` feed. Returns `None`
    /// when there is no wallet provider to listen through or the feed could
    /// not be opened.
    pub async fn attach<C: WaveContract>(
        &mut self,
        client: &ContractClient<C>,
    ) -> Option<Subscription> {
        if !client.is_available() {
            return None;
        }
        let mut stream = match client.new_waves().await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "subscribing to NewWave failed");
                return None;
            }
        };
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        info!(listener = ?id, "listening for NewWave");
        let sink = self.sink.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(wave) => {
                        debug!(?wave, "NewWave");
                        if sink.send(LiveWave { listener: id, wave }).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "dropping malformed NewWave event"),
                }
            }
            debug!(listener = ?id, "NewWave feed ended");
        });
        Some(Subscription { id, task })
    }
}
