use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use usim_cert_ipc::{
    CertManager, Certificate, CertificateAuthority, CertificateFilter, ErrorRecord, TokenInfo,
};
use zeroize::Zeroizing;

use crate::binder::{ConnectionEvents, ServiceBinder};
use crate::config::{EndpointDescriptor, ServiceConfig};
use crate::dispatcher::{Delivery, InFlight};
use crate::error::{ConfigError, ErrorState};
use crate::executor::BackgroundExecutor;
use crate::lifecycle::{ConnectionState, Lifecycle};
use crate::request::{Request, SignArgs};
use crate::result::ResultCallback;
use crate::router::DeliveryPump;

type AvailableCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Result of [`CertService::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The transport accepted the binding request; `on_bound` follows later.
    RequestAccepted,
    /// A connection was already requested. Nothing was done.
    AlreadyConnected,
    /// The transport refused. The error record says `SERVICE_CONNECT`.
    RequestFailed,
}

pub(crate) struct ProxyState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) slot: Option<InFlight>,
    next_ticket: u64,
}

impl ProxyState {
    /// The bound handle, or the record explaining why no request may start.
    pub(crate) fn readiness(&self) -> Result<Arc<dyn CertManager>, ErrorRecord> {
        match self.lifecycle.handle() {
            None => Err(ErrorRecord::service_connect()),
            Some(_) if self.slot.is_some() => Err(ErrorRecord::in_use()),
            Some(handle) => Ok(handle),
        }
    }

    pub(crate) fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

pub(crate) struct Shared {
    endpoint: EndpointDescriptor,
    app_identifier: String,
    binder: Arc<dyn ServiceBinder>,
    pub(crate) executor: Arc<dyn BackgroundExecutor>,
    state: Mutex<ProxyState>,
    pub(crate) errors: ErrorState,
    pub(crate) deliveries: mpsc::UnboundedSender<Delivery>,
    on_available: Mutex<Option<AvailableCallback>>,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ProxyState> {
        self.state.lock().expect("proxy state mutex poisoned")
    }

    pub(crate) fn available_callback(&self) -> Option<AvailableCallback> {
        self.on_available.lock().expect("on_available mutex poisoned").clone()
    }

    fn request_binding(self: &Arc<Self>) -> ConnectOutcome {
        let events = ConnectionEvents::new(Arc::downgrade(self));
        match self.binder.bind(&self.endpoint, events) {
            Ok(()) => {
                log::info!("cert-service: bind requested endpoint={}", self.endpoint);
                ConnectOutcome::RequestAccepted
            }
            Err(err) => {
                log::warn!("cert-service: bind to {} failed: {err}", self.endpoint);
                self.lock_state().lifecycle.rollback_connecting();
                self.errors.set(ErrorRecord::service_connect());
                ConnectOutcome::RequestFailed
            }
        }
    }

    pub(crate) fn handle_bound(&self, handle: Arc<dyn CertManager>) {
        let (generation, abandoned) = {
            let mut state = self.lock_state();
            match state.lifecycle.mark_bound(handle) {
                Ok(generation) => (generation, state.slot.take()),
                Err(err) => {
                    log::warn!("cert-service: ignoring bind event: {err}");
                    return;
                }
            }
        };
        if let Some(pending) = abandoned {
            log::debug!(
                "cert-service: rebind abandons {} ticket={}",
                pending.method,
                pending.ticket
            );
        }
        log::info!("cert-service: bound endpoint={} generation={generation}", self.endpoint);
        if self.deliveries.send(Delivery::Available { generation }).is_err() {
            log::debug!("cert-service: delivery pump gone, availability not announced");
        }
    }

    pub(crate) fn handle_unbound(&self) {
        let abandoned = {
            let mut state = self.lock_state();
            if !state.lifecycle.mark_unbound() {
                log::debug!("cert-service: unbind event while {}", state.lifecycle.state());
                return;
            }
            state.slot.take()
        };
        if let Some(pending) = abandoned {
            log::debug!(
                "cert-service: unbind abandons {} ticket={}",
                pending.method,
                pending.ticket
            );
        }
        log::info!("cert-service: endpoint {} went away", self.endpoint);
    }
}

/// Proxy facade for the remote certificate service.
///
/// Cheap to clone; clones share one connection and one in-flight slot.
/// Every operation calls its callback exactly once, unless a disconnect
/// abandons the request first:
///
/// - not ready: immediately, on the calling thread, with a failure sentinel;
/// - otherwise: from the [`DeliveryPump`], after the remote call finished.
///
/// Failure sentinels are `None`, `false` or [`COUNT_UNAVAILABLE`](crate::COUNT_UNAVAILABLE).
#[derive(Clone)]
pub struct CertService {
    shared: Arc<Shared>,
}

impl CertService {
    /// Build the proxy and the pump that delivers its results.
    pub fn new(
        config: ServiceConfig,
        binder: Arc<dyn ServiceBinder>,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Result<(Self, DeliveryPump), ConfigError> {
        config.validate()?;
        let (deliveries, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            endpoint: config.endpoint,
            app_identifier: config.app_identifier,
            binder,
            executor,
            state: Mutex::new(ProxyState {
                lifecycle: Lifecycle::default(),
                slot: None,
                next_ticket: 0,
            }),
            errors: ErrorState::default(),
            deliveries,
            on_available: Mutex::new(None),
        });
        let pump = DeliveryPump::new(receiver, Arc::downgrade(&shared));
        Ok((Self { shared }, pump))
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.shared.endpoint
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.lock_state().lifecycle.state()
    }

    // ── Connection lifecycle ──────────────────────────────────────────────

    /// Ask the transport to bind to the endpoint. Idempotent while a
    /// connection is requested.
    pub fn connect(&self) -> ConnectOutcome {
        if !self.shared.lock_state().lifecycle.mark_connecting() {
            log::debug!("cert-service: connect ignored, already requested");
            return ConnectOutcome::AlreadyConnected;
        }
        self.shared.request_binding()
    }

    /// Drop the binding. Any request in flight is abandoned: its callback is
    /// never invoked. Does nothing unless an endpoint is bound.
    pub fn disconnect(&self) {
        let abandoned = {
            let mut state = self.shared.lock_state();
            if state.lifecycle.begin_unbinding().is_none() {
                log::debug!("cert-service: disconnect ignored while {}", state.lifecycle.state());
                return;
            }
            state.slot.take()
        };
        if let Some(pending) = abandoned {
            log::debug!(
                "cert-service: disconnect abandons {} ticket={}",
                pending.method,
                pending.ticket
            );
        }
        self.shared.binder.unbind(&self.shared.endpoint);
        self.shared.lock_state().lifecycle.finish_unbinding();
        log::info!("cert-service: disconnected from {}", self.shared.endpoint);
    }

    /// Recover from an external teardown: when a binding was lost without the
    /// caller asking, ask the transport to bind again. A bind that is still
    /// pending is left alone.
    pub fn on_resume(&self) {
        if !self.shared.lock_state().lifecycle.begin_rebind() {
            return;
        }
        log::info!("cert-service: resuming, re-requesting {}", self.shared.endpoint);
        self.shared.request_binding();
    }

    /// Transport callback: the endpoint is available through `handle`.
    pub fn on_bound(&self, handle: Arc<dyn CertManager>) {
        self.shared.handle_bound(handle);
    }

    /// Transport callback: the endpoint went away.
    pub fn on_unbound(&self) {
        self.shared.handle_unbound();
    }

    /// Register the callback run (through the pump) each time a binding
    /// becomes usable. Replaces any previous one.
    ///
    /// The proxy owns the callback. One that captures a `CertService` clone
    /// keeps the proxy alive until [`clear_on_available`](Self::clear_on_available).
    pub fn set_on_available<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.on_available.lock().expect("on_available mutex poisoned") =
            Some(Arc::new(callback));
    }

    pub fn clear_on_available(&self) {
        *self.shared.on_available.lock().expect("on_available mutex poisoned") = None;
    }

    /// Whether a request could start right now. Always records why in the
    /// error state: `NORMAL`, `IN_USE` or `SERVICE_CONNECT`.
    pub fn is_ready(&self) -> bool {
        let verdict = self.shared.lock_state().readiness();
        match verdict {
            Ok(_) => {
                self.shared.errors.set(ErrorRecord::normal());
                true
            }
            Err(record) => {
                self.shared.errors.set(record);
                false
            }
        }
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    pub fn last_error(&self) -> ErrorRecord {
        self.shared.errors.get()
    }

    pub fn error_code(&self) -> String {
        self.shared.errors.get().code
    }

    pub fn error_message(&self) -> String {
        self.shared.errors.get().message
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn get_certificate<F>(&self, index: i32, callback: F)
    where
        F: FnOnce(Option<Certificate>) + Send + 'static,
    {
        let callback = ResultCallback::Certificate(Box::new(callback));
        self.shared.submit(Request::GetCertificate { index }, callback);
    }

    pub fn certificate_count<F>(&self, callback: F)
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.shared.submit(Request::CertificateCount, ResultCallback::Count(Box::new(callback)));
    }

    pub fn free_slot_count<F>(&self, callback: F)
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.shared.submit(Request::FreeSlotCount, ResultCallback::Count(Box::new(callback)));
    }

    pub fn list_certificates<F>(&self, callback: F)
    where
        F: FnOnce(Option<Vec<Certificate>>) + Send + 'static,
    {
        self.shared
            .submit(Request::ListCertificates, ResultCallback::CertificateList(Box::new(callback)));
    }

    pub fn list_certificates_filtered<F>(&self, filter: CertificateFilter, callback: F)
    where
        F: FnOnce(Option<Vec<Certificate>>) + Send + 'static,
    {
        self.shared.submit(
            Request::ListCertificatesFiltered { filter },
            ResultCallback::CertificateList(Box::new(callback)),
        );
    }

    /// Certificates found on external storage rather than on the token.
    pub fn list_external_certificates<F>(&self, callback: F)
    where
        F: FnOnce(Option<Vec<Certificate>>) + Send + 'static,
    {
        self.shared.submit(
            Request::ListExternalCertificates,
            ResultCallback::CertificateList(Box::new(callback)),
        );
    }

    pub fn token_info<F>(&self, callback: F)
    where
        F: FnOnce(Option<TokenInfo>) + Send + 'static,
    {
        self.shared.submit(Request::TokenInfo, ResultCallback::TokenInfo(Box::new(callback)));
    }

    // ── Signing ───────────────────────────────────────────────────────────

    pub fn sign_pkcs1<F>(
        &self,
        plaintext: &[u8],
        index: i32,
        passcode: &[u8],
        timestamp: &str,
        callback: F,
    ) where
        F: FnOnce(Option<Vec<u8>>) + Send + 'static,
    {
        let args = sign_args(plaintext, index, passcode, timestamp);
        let callback = ResultCallback::SignedBytes(Box::new(callback));
        self.shared.submit(Request::SignPkcs1(args), callback);
    }

    pub fn sign_pkcs7<F>(
        &self,
        plaintext: &[u8],
        index: i32,
        passcode: &[u8],
        timestamp: &str,
        callback: F,
    ) where
        F: FnOnce(Option<Vec<u8>>) + Send + 'static,
    {
        let args = sign_args(plaintext, index, passcode, timestamp);
        let callback = ResultCallback::SignedBytes(Box::new(callback));
        self.shared.submit(Request::SignPkcs7(args), callback);
    }

    pub fn add_unauthenticated_attribute<F>(
        &self,
        signed: &[u8],
        oid: &str,
        value: &[u8],
        callback: F,
    ) where
        F: FnOnce(Option<Vec<u8>>) + Send + 'static,
    {
        let request = Request::AddUnauthenticatedAttribute {
            signed: signed.to_vec(),
            oid: oid.to_owned(),
            value: value.to_vec(),
        };
        self.shared.submit(request, ResultCallback::SignedBytes(Box::new(callback)));
    }

    pub fn private_key_random<F>(&self, index: i32, passcode: &[u8], callback: F)
    where
        F: FnOnce(Option<Vec<u8>>) + Send + 'static,
    {
        let request =
            Request::PrivateKeyRandom { index, passcode: Zeroizing::new(passcode.to_vec()) };
        self.shared.submit(request, ResultCallback::SignedBytes(Box::new(callback)));
    }

    // ── Provisioning ──────────────────────────────────────────────────────

    pub fn issue_certificate<F>(
        &self,
        ca: CertificateAuthority,
        ref_number: &str,
        auth_code: &str,
        passcode: &[u8],
        callback: F,
    ) where
        F: FnOnce(bool) + Send + 'static,
    {
        let request = Request::IssueCertificate {
            ca,
            ref_number: ref_number.to_owned(),
            auth_code: auth_code.to_owned(),
            passcode: Zeroizing::new(passcode.to_vec()),
        };
        self.shared.submit(request, ResultCallback::Outcome(Box::new(callback)));
    }

    pub fn update_certificate<F>(
        &self,
        index: i32,
        ca: CertificateAuthority,
        passcode: &[u8],
        callback: F,
    ) where
        F: FnOnce(bool) + Send + 'static,
    {
        let request =
            Request::UpdateCertificate { index, ca, passcode: Zeroizing::new(passcode.to_vec()) };
        self.shared.submit(request, ResultCallback::Outcome(Box::new(callback)));
    }

    /// Copy a certificate and its key from external storage onto the token.
    pub fn import_certificate<F>(
        &self,
        cert_path: &str,
        key_path: &str,
        cert_passcode: &[u8],
        passcode: &[u8],
        callback: F,
    ) where
        F: FnOnce(bool) + Send + 'static,
    {
        let request = Request::ImportCertificate {
            cert_path: cert_path.to_owned(),
            key_path: key_path.to_owned(),
            cert_passcode: Zeroizing::new(cert_passcode.to_vec()),
            passcode: Zeroizing::new(passcode.to_vec()),
        };
        self.shared.submit(request, ResultCallback::Outcome(Box::new(callback)));
    }

    pub fn delete_certificate<F>(&self, index: i32, passcode: &[u8], callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let request =
            Request::DeleteCertificate { index, passcode: Zeroizing::new(passcode.to_vec()) };
        self.shared.submit(request, ResultCallback::Outcome(Box::new(callback)));
    }

    // ── Subscription ──────────────────────────────────────────────────────

    /// Ask whether this application is subscribed to the service. The
    /// callback receives a service result code; when the proxy is not ready
    /// it receives the readiness error code instead.
    pub fn check_subscription<F>(&self, callback: F)
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        let request =
            Request::CheckSubscription { app_identifier: self.shared.app_identifier.clone() };
        self.shared.submit(request, ResultCallback::Text(Box::new(callback)));
    }
}

fn sign_args(plaintext: &[u8], index: i32, passcode: &[u8], timestamp: &str) -> SignArgs {
    SignArgs {
        plaintext: plaintext.to_vec(),
        index,
        passcode: Zeroizing::new(passcode.to_vec()),
        timestamp: timestamp.to_owned(),
    }
}
