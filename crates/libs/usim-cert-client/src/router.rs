use std::sync::Weak;

use tokio::sync::mpsc;

use crate::dispatcher::{Completion, Delivery};
use crate::service::Shared;

/// Hands background results back to the caller's execution context.
///
/// The pump is the caller side of the handoff: whichever task or loop drives
/// it is where callbacks run. Drive it from the same context that issues
/// requests, either as a task (`run`), one item at a time (`next`), or by
/// polling from a foreign event loop (`dispatch_pending`).
pub struct DeliveryPump {
    receiver: mpsc::UnboundedReceiver<Delivery>,
    shared: Weak<Shared>,
}

impl DeliveryPump {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Delivery>, shared: Weak<Shared>) -> Self {
        Self { receiver, shared }
    }

    /// Deliver until every [`CertService`](crate::CertService) handle is gone
    /// and no background call is left running.
    pub async fn run(mut self) {
        while self.next().await {}
        log::debug!("cert-service: delivery pump finished");
    }

    /// Wait for and deliver one item. Returns `false` once the pump is closed.
    pub async fn next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(delivery) => {
                self.deliver(delivery);
                true
            }
            None => false,
        }
    }

    /// Deliver everything already queued without waiting. Returns how many
    /// items were processed, dropped stale ones included.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(delivery) = self.receiver.try_recv() {
            self.deliver(delivery);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, delivery: Delivery) {
        let Some(shared) = self.shared.upgrade() else {
            log::debug!("cert-service: proxy dropped, discarding {delivery:?}");
            return;
        };
        match delivery {
            Delivery::Completion(completion) => shared.route(completion),
            Delivery::Available { generation } => shared.announce_available(generation),
        }
    }
}

impl Shared {
    /// Give a completion to the callback waiting for it.
    ///
    /// The slot is cleared before the callback runs, so the callback may
    /// immediately submit the next request. A completion whose ticket is not
    /// the one in the slot was abandoned by a disconnect and is dropped.
    pub(crate) fn route(&self, completion: Completion) {
        let pending = {
            let mut state = self.lock_state();
            let current = state.slot.as_ref().is_some_and(|slot| slot.ticket == completion.ticket);
            if current {
                state.slot.take()
            } else {
                None
            }
        };
        let Some(pending) = pending else {
            log::debug!(
                "cert-service: dropping stale {} completion ticket={}",
                completion.method,
                completion.ticket
            );
            return;
        };

        log::debug!("cert-service: deliver {} ticket={}", pending.method, pending.ticket);
        self.errors.set(completion.error);
        pending.callback.complete(completion.result);
    }

    /// Run the readiness callback if the announced binding is still current.
    pub(crate) fn announce_available(&self, generation: u64) {
        let current = {
            let state = self.lock_state();
            state.lifecycle.state().is_bound() && state.lifecycle.generation() == generation
        };
        if !current {
            log::debug!("cert-service: binding {generation} is gone, skipping availability");
            return;
        }
        if let Some(callback) = self.available_callback() {
            callback();
        }
    }
}
