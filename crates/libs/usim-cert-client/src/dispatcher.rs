use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use usim_cert_ipc::{CertManager, ErrorRecord};

use crate::executor::BackgroundJob;
use crate::request::{RemoteMethod, Request};
use crate::result::{ResultCallback, ResultEnvelope};
use crate::service::Shared;

/// The single outstanding request.
pub(crate) struct InFlight {
    pub(crate) ticket: u64,
    pub(crate) method: RemoteMethod,
    pub(crate) callback: ResultCallback,
}

/// A finished background call on its way to the caller's context.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) ticket: u64,
    pub(crate) method: RemoteMethod,
    pub(crate) result: ResultEnvelope,
    pub(crate) error: ErrorRecord,
}

impl Completion {
    fn failed(ticket: u64, method: RemoteMethod) -> Self {
        Self {
            ticket,
            method,
            result: method.result_kind().failure(),
            error: ErrorRecord::service_connect(),
        }
    }
}

/// Posts the completion of one ticket exactly once.
///
/// Travels inside the background job. If the executor discards the job
/// without running it, dropping the guard posts a failure completion so the
/// slot is still released.
struct CompletionGuard {
    ticket: u64,
    method: RemoteMethod,
    deliveries: Option<mpsc::UnboundedSender<Delivery>>,
}

impl CompletionGuard {
    fn new(
        ticket: u64,
        method: RemoteMethod,
        deliveries: mpsc::UnboundedSender<Delivery>,
    ) -> Self {
        Self { ticket, method, deliveries: Some(deliveries) }
    }

    fn post(mut self, completion: Completion) {
        if let Some(deliveries) = self.deliveries.take() {
            send_completion(&deliveries, completion);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(deliveries) = self.deliveries.take() {
            log::warn!(
                "cert-service: background call for {} ticket={} was discarded",
                self.method,
                self.ticket
            );
            send_completion(&deliveries, Completion::failed(self.ticket, self.method));
        }
    }
}

fn send_completion(deliveries: &mpsc::UnboundedSender<Delivery>, completion: Completion) {
    let (method, ticket) = (completion.method, completion.ticket);
    if deliveries.send(Delivery::Completion(completion)).is_err() {
        log::debug!("cert-service: delivery pump gone, dropping {method} ticket={ticket}");
    }
}

/// Items the delivery pump runs on the caller's context.
#[derive(Debug)]
pub(crate) enum Delivery {
    Completion(Completion),
    /// The binding with this generation became usable.
    Available { generation: u64 },
}

impl Shared {
    /// Check readiness, claim the in-flight slot and start the remote call.
    ///
    /// A request that is not ready completes right here, on the calling
    /// thread, before this returns.
    pub(crate) fn submit(&self, request: Request, callback: ResultCallback) {
        let method = request.method();
        let (ticket, remote) = {
            let mut state = self.lock_state();
            let verdict = state.readiness();
            match verdict {
                Ok(remote) => {
                    self.errors.set(ErrorRecord::normal());
                    let ticket = state.issue_ticket();
                    state.slot = Some(InFlight { ticket, method, callback });
                    (ticket, remote)
                }
                Err(record) => {
                    self.errors.set(record.clone());
                    drop(state);
                    log::debug!("cert-service: {method} rejected: {}", record.code);
                    callback.reject(&record);
                    return;
                }
            }
        };

        log::debug!("cert-service: submit {method} ticket={ticket}");
        let guard = CompletionGuard::new(ticket, method, self.deliveries.clone());
        let job: BackgroundJob = Box::new(move || {
            let completion = execute(ticket, &request, remote.as_ref());
            guard.post(completion);
        });

        // A refused job has been dropped, and its guard already posted the failure.
        if let Err(err) = self.executor.spawn(job) {
            log::warn!("cert-service: could not start background call for {method}: {err}");
        }
    }
}

/// Runs on the background executor. Never panics: a panicking remote call is
/// reported as a transport failure so the slot is always released.
fn execute(ticket: u64, request: &Request, remote: &dyn CertManager) -> Completion {
    let method = request.method();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        request.invoke(remote).map(|result| (result, remote.last_error()))
    }));

    let (result, error) = match outcome {
        Ok(Ok((result, Ok(remote_error)))) => (result, remote_error),
        Ok(Ok((result, Err(err)))) => {
            log::warn!("cert-service: {method} answered but last_error failed: {err}");
            (result, ErrorRecord::service_connect())
        }
        Ok(Err(err)) => {
            log::warn!("cert-service: {method} failed: {err}");
            return Completion::failed(ticket, method);
        }
        Err(_) => {
            log::error!("cert-service: {method} panicked in the remote handle");
            return Completion::failed(ticket, method);
        }
    };
    Completion { ticket, method, result, error }
}
