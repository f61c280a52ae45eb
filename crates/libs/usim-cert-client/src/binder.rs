use std::sync::{Arc, Weak};

use usim_cert_ipc::CertManager;

use crate::config::EndpointDescriptor;
use crate::error::BindError;
use crate::service::Shared;

/// Transport that knows how to reach the certificate service process.
///
/// `bind` only starts the binding. Once the remote endpoint is actually
/// available the transport reports it through the supplied
/// [`ConnectionEvents`], from any thread and at any later time.
pub trait ServiceBinder: Send + Sync {
    fn bind(
        &self,
        endpoint: &EndpointDescriptor,
        events: ConnectionEvents,
    ) -> Result<(), BindError>;

    fn unbind(&self, endpoint: &EndpointDescriptor);
}

/// Sink for connect/disconnect notifications coming from the transport.
///
/// Holds the proxy weakly; events arriving after the proxy is gone are ignored.
#[derive(Clone)]
pub struct ConnectionEvents {
    shared: Weak<Shared>,
}

impl ConnectionEvents {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// The remote endpoint is available through `handle`.
    pub fn bound(&self, handle: Arc<dyn CertManager>) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_bound(handle),
            None => log::debug!("cert-service: bind event after proxy was dropped"),
        }
    }

    /// The remote endpoint went away without the caller asking for it.
    pub fn unbound(&self) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_unbound(),
            None => log::debug!("cert-service: unbind event after proxy was dropped"),
        }
    }
}
