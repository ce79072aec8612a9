//! Serializing pool service
//!
//! The pool is single-writer. `PoolService` owns it on a dedicated thread
//! and feeds it submissions one at a time from an mpsc queue, so any number
//! of async producers can share one pool. Accepted events are fanned out on
//! a broadcast channel for indexers and wallets.

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::account::AccountId;
use crate::accumulator::AccumulatorState;
use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::fees::Payout;
use crate::pool::{CallContext, MintRequest, Receipt, ShieldedPool, TransferRequest};
use crate::storage::PoolStore;

const QUEUE_DEPTH: usize = 32;
const EVENT_BUFFER: usize = 1024;

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub accumulator: Option<AccumulatorState>,
    pub total_supply: u128,
    pub fee_balance: u128,
}

type Reply<T> = oneshot::Sender<Result<T, PoolError>>;

enum Command {
    Mint {
        ctx: CallContext,
        request: MintRequest,
        reply: Reply<Receipt>,
    },
    Transfer {
        ctx: CallContext,
        request: TransferRequest,
        reply: Reply<Receipt>,
    },
    DistributeFees {
        reply: Reply<Receipt>,
    },
    Status {
        reply: oneshot::Sender<PoolStatus>,
    },
}

pub struct PoolService {
    request_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<PoolEvent>,
}

impl PoolService {
    /// Move `pool` onto its own thread. `payout` receives fee distributions.
    pub fn start<S, P>(mut pool: ShieldedPool<S>, mut payout: P) -> Self
    where
        S: PoolStore + 'static,
        P: Payout + Send + 'static,
    {
        let (request_tx, mut request_rx) = mpsc::channel::<Command>(QUEUE_DEPTH);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let publisher = events.clone();

        std::thread::spawn(move || {
            while let Some(command) = request_rx.blocking_recv() {
                match command {
                    Command::Mint { ctx, request, reply } => {
                        let result = pool.mint(&ctx, request);
                        publish(&publisher, &result);
                        let _ = reply.send(result);
                    }
                    Command::Transfer { ctx, request, reply } => {
                        let result = pool.transfer(&ctx, request);
                        publish(&publisher, &result);
                        let _ = reply.send(result);
                    }
                    Command::DistributeFees { reply } => {
                        let result = pool.distribute_fees(&mut payout);
                        publish(&publisher, &result);
                        let _ = reply.send(result);
                    }
                    Command::Status { reply } => {
                        let _ = reply.send(PoolStatus {
                            accumulator: pool.accumulator().copied(),
                            total_supply: pool.total_supply(),
                            fee_balance: pool.fee_balance(),
                        });
                    }
                }
            }
            log::debug!("Pool service queue closed, worker exiting");
        });

        Self { request_tx, events }
    }

    /// Subscribe to events of operations accepted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    pub async fn mint(
        &self,
        caller: AccountId,
        value: u128,
        request: MintRequest,
    ) -> Result<Receipt> {
        let ctx = context(caller, value);
        self.call(|reply| Command::Mint { ctx, request, reply }).await
    }

    pub async fn transfer(&self, caller: AccountId, request: TransferRequest) -> Result<Receipt> {
        let ctx = context(caller, 0);
        self.call(|reply| Command::Transfer { ctx, request, reply }).await
    }

    pub async fn distribute_fees(&self) -> Result<Receipt> {
        self.call(|reply| Command::DistributeFees { reply }).await
    }

    pub async fn status(&self) -> Result<PoolStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send(Command::Status { reply: reply_tx })
            .await
            .context("pool service unavailable")?;
        reply_rx.await.context("pool service crashed")
    }

    async fn call<F>(&self, build: F) -> Result<Receipt>
    where
        F: FnOnce(Reply<Receipt>) -> Command,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.request_tx
            .send(build(reply_tx))
            .await
            .context("pool service unavailable")?;

        Ok(reply_rx.await.context("pool service crashed")??)
    }
}

fn context(caller: AccountId, value: u128) -> CallContext {
    CallContext {
        caller,
        value,
        timestamp: chrono::Utc::now().timestamp().max(0) as u64,
    }
}

fn publish(events: &broadcast::Sender<PoolEvent>, result: &Result<Receipt, PoolError>) {
    if let Ok(receipt) = result {
        for event in &receipt.events {
            // No subscribers is fine
            let _ = events.send(event.clone());
        }
    }
}
