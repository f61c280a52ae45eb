use usim_cert_ipc::{Certificate, ErrorRecord, TokenInfo};

/// Count reported to the callback when no real count is available.
pub const COUNT_UNAVAILABLE: i32 = -1;

/// The result shapes an operation can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResultKind {
    Certificate,
    CertificateList,
    Count,
    SignedBytes,
    TokenInfo,
    Outcome,
    Text,
}

impl ResultKind {
    /// The failure sentinel for this shape.
    pub(crate) fn failure(self) -> ResultEnvelope {
        match self {
            Self::Certificate => ResultEnvelope::Certificate(None),
            Self::CertificateList => ResultEnvelope::CertificateList(None),
            Self::Count => ResultEnvelope::Count(COUNT_UNAVAILABLE),
            Self::SignedBytes => ResultEnvelope::SignedBytes(None),
            Self::TokenInfo => ResultEnvelope::TokenInfo(None),
            Self::Outcome => ResultEnvelope::Outcome(false),
            Self::Text => ResultEnvelope::Text(None),
        }
    }
}

/// A finished remote call's value, produced once in the background and
/// consumed once by the router.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ResultEnvelope {
    Certificate(Option<Certificate>),
    CertificateList(Option<Vec<Certificate>>),
    Count(i32),
    SignedBytes(Option<Vec<u8>>),
    TokenInfo(Option<TokenInfo>),
    Outcome(bool),
    Text(Option<String>),
}

impl ResultEnvelope {
    pub(crate) fn kind(&self) -> ResultKind {
        match self {
            Self::Certificate(_) => ResultKind::Certificate,
            Self::CertificateList(_) => ResultKind::CertificateList,
            Self::Count(_) => ResultKind::Count,
            Self::SignedBytes(_) => ResultKind::SignedBytes,
            Self::TokenInfo(_) => ResultKind::TokenInfo,
            Self::Outcome(_) => ResultKind::Outcome,
            Self::Text(_) => ResultKind::Text,
        }
    }
}

pub(crate) type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// A caller's completion callback, tagged with the shape it expects.
pub(crate) enum ResultCallback {
    Certificate(Callback<Option<Certificate>>),
    CertificateList(Callback<Option<Vec<Certificate>>>),
    Count(Callback<i32>),
    SignedBytes(Callback<Option<Vec<u8>>>),
    TokenInfo(Callback<Option<TokenInfo>>),
    Outcome(Callback<bool>),
    Text(Callback<Option<String>>),
}

impl ResultCallback {
    pub(crate) fn kind(&self) -> ResultKind {
        match self {
            Self::Certificate(_) => ResultKind::Certificate,
            Self::CertificateList(_) => ResultKind::CertificateList,
            Self::Count(_) => ResultKind::Count,
            Self::SignedBytes(_) => ResultKind::SignedBytes,
            Self::TokenInfo(_) => ResultKind::TokenInfo,
            Self::Outcome(_) => ResultKind::Outcome,
            Self::Text(_) => ResultKind::Text,
        }
    }

    /// Invoke with `envelope`. A shape mismatch still invokes the callback,
    /// with its failure sentinel.
    pub(crate) fn complete(self, envelope: ResultEnvelope) {
        match (self, envelope) {
            (Self::Certificate(cb), ResultEnvelope::Certificate(value)) => cb(value),
            (Self::CertificateList(cb), ResultEnvelope::CertificateList(value)) => cb(value),
            (Self::Count(cb), ResultEnvelope::Count(value)) => cb(value),
            (Self::SignedBytes(cb), ResultEnvelope::SignedBytes(value)) => cb(value),
            (Self::TokenInfo(cb), ResultEnvelope::TokenInfo(value)) => cb(value),
            (Self::Outcome(cb), ResultEnvelope::Outcome(value)) => cb(value),
            (Self::Text(cb), ResultEnvelope::Text(value)) => cb(value),
            (callback, envelope) => {
                log::error!(
                    "cert-service: result shape {:?} does not match callback shape {:?}",
                    envelope.kind(),
                    callback.kind()
                );
                callback.fail();
            }
        }
    }

    pub(crate) fn fail(self) {
        let failure = self.kind().failure();
        self.complete(failure);
    }

    /// Not-ready completion. Subscription checks receive the readiness code
    /// itself; every other shape gets its failure sentinel.
    pub(crate) fn reject(self, record: &ErrorRecord) {
        match self {
            Self::Text(cb) => cb(Some(record.code.clone())),
            other => other.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn capture<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Callback<T>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |value| sink.lock().expect("capture mutex poisoned").push(value)))
    }

    #[test]
    fn failure_sentinels_per_shape() {
        assert_eq!(ResultKind::Count.failure(), ResultEnvelope::Count(-1));
        assert_eq!(ResultKind::Outcome.failure(), ResultEnvelope::Outcome(false));
        assert_eq!(ResultKind::Certificate.failure(), ResultEnvelope::Certificate(None));
        assert_eq!(ResultKind::CertificateList.failure(), ResultEnvelope::CertificateList(None));
        assert_eq!(ResultKind::SignedBytes.failure(), ResultEnvelope::SignedBytes(None));
        assert_eq!(ResultKind::TokenInfo.failure(), ResultEnvelope::TokenInfo(None));
        assert_eq!(ResultKind::Text.failure(), ResultEnvelope::Text(None));
    }

    #[test]
    fn matching_envelope_reaches_callback() {
        let (seen, cb) = capture::<Option<Vec<u8>>>();
        ResultCallback::SignedBytes(cb).complete(ResultEnvelope::SignedBytes(Some(vec![7, 7])));
        assert_eq!(*seen.lock().expect("seen"), vec![Some(vec![7, 7])]);
    }

    #[test]
    fn mismatched_envelope_delivers_sentinel_once() {
        let (seen, cb) = capture::<i32>();
        ResultCallback::Count(cb).complete(ResultEnvelope::Outcome(true));
        assert_eq!(*seen.lock().expect("seen"), vec![COUNT_UNAVAILABLE]);
    }

    #[test]
    fn reject_gives_text_callbacks_the_code() {
        let (seen, cb) = capture::<Option<String>>();
        ResultCallback::Text(cb).reject(&ErrorRecord::in_use());
        assert_eq!(*seen.lock().expect("seen"), vec![Some(usim_cert_ipc::code::IN_USE.to_owned())]);

        let (seen, cb) = capture::<bool>();
        ResultCallback::Outcome(cb).reject(&ErrorRecord::service_connect());
        assert_eq!(*seen.lock().expect("seen"), vec![false]);
    }
}
