use std::fmt;
use std::sync::Arc;

use usim_cert_ipc::CertManager;

/// Where the proxy stands with respect to the remote endpoint.
///
/// `Connecting`, `Bound` and `Lost` are the "requested" states; a handle only
/// exists in `Bound`, so a bound endpoint is always a requested one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    /// A bind was requested and its first `on_bound` has not arrived yet.
    Connecting,
    Bound,
    /// Was bound, then the endpoint went away without the caller asking.
    /// `on_resume` requests a new binding from here.
    Lost,
    Unbinding,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Bound => "bound",
            Self::Lost => "lost",
            Self::Unbinding => "unbinding",
        }
    }

    pub fn is_requested(self) -> bool {
        matches!(self, Self::Connecting | Self::Bound | Self::Lost)
    }

    pub fn is_bound(self) -> bool {
        self == Self::Bound
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("event '{event}' is not legal in state '{state}'")]
pub(crate) struct TransitionError {
    pub(crate) event: &'static str,
    pub(crate) state: ConnectionState,
}

enum Link {
    Disconnected,
    Connecting,
    Bound(Arc<dyn CertManager>),
    Lost,
    Unbinding,
}

/// Connection state machine. Pure bookkeeping: the caller performs the
/// transport calls around the transitions.
pub(crate) struct Lifecycle {
    link: Link,
    generation: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { link: Link::Disconnected, generation: 0 }
    }
}

impl Lifecycle {
    pub(crate) fn state(&self) -> ConnectionState {
        match self.link {
            Link::Disconnected => ConnectionState::Disconnected,
            Link::Connecting => ConnectionState::Connecting,
            Link::Bound(_) => ConnectionState::Bound,
            Link::Lost => ConnectionState::Lost,
            Link::Unbinding => ConnectionState::Unbinding,
        }
    }

    /// Counts successful binds; identifies the binding a notification refers to.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn handle(&self) -> Option<Arc<dyn CertManager>> {
        match &self.link {
            Link::Bound(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Returns `false` when a connection is already requested.
    pub(crate) fn mark_connecting(&mut self) -> bool {
        if self.state().is_requested() {
            return false;
        }
        self.link = Link::Connecting;
        true
    }

    /// Moves a lost binding back to `Connecting`. Returns `false` in every
    /// other state, a pending first bind included.
    pub(crate) fn begin_rebind(&mut self) -> bool {
        if !matches!(self.link, Link::Lost) {
            return false;
        }
        self.link = Link::Connecting;
        true
    }

    pub(crate) fn rollback_connecting(&mut self) {
        if matches!(self.link, Link::Connecting) {
            self.link = Link::Disconnected;
        }
    }

    pub(crate) fn mark_bound(
        &mut self,
        handle: Arc<dyn CertManager>,
    ) -> Result<u64, TransitionError> {
        if !self.state().is_requested() {
            return Err(TransitionError { event: "bound", state: self.state() });
        }
        self.generation += 1;
        self.link = Link::Bound(handle);
        Ok(self.generation)
    }

    /// Returns `false` when nothing was bound. The request itself survives.
    pub(crate) fn mark_unbound(&mut self) -> bool {
        if !matches!(self.link, Link::Bound(_)) {
            return false;
        }
        self.link = Link::Lost;
        true
    }

    /// Starts a caller-initiated teardown; `None` when nothing is bound.
    pub(crate) fn begin_unbinding(&mut self) -> Option<Arc<dyn CertManager>> {
        match std::mem::replace(&mut self.link, Link::Unbinding) {
            Link::Bound(handle) => Some(handle),
            other => {
                self.link = other;
                None
            }
        }
    }

    pub(crate) fn finish_unbinding(&mut self) {
        if matches!(self.link, Link::Unbinding) {
            self.link = Link::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usim_cert_ipc::StubCertManager;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct ModelState {
        requested: bool,
        bound: bool,
        lost: bool,
        unbinding: bool,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum ModelOp {
        Connect,
        Rollback,
        Rebind,
        Bind,
        Unbound,
        BeginUnbind,
        FinishUnbind,
    }

    const MODEL_OPS: [ModelOp; 7] = [
        ModelOp::Connect,
        ModelOp::Rollback,
        ModelOp::Rebind,
        ModelOp::Bind,
        ModelOp::Unbound,
        ModelOp::BeginUnbind,
        ModelOp::FinishUnbind,
    ];

    /// Reference model using the two independent flags plus lost and teardown markers.
    /// Returns whether the operation took effect.
    fn apply_model(state: &mut ModelState, op: ModelOp) -> bool {
        match op {
            ModelOp::Connect if !state.requested => {
                state.requested = true;
                state.unbinding = false;
                true
            }
            ModelOp::Rollback if state.requested && !state.bound && !state.lost => {
                state.requested = false;
                true
            }
            ModelOp::Rebind if state.lost => {
                state.lost = false;
                true
            }
            ModelOp::Bind if state.requested => {
                state.bound = true;
                state.lost = false;
                true
            }
            ModelOp::Unbound if state.bound => {
                state.bound = false;
                state.lost = true;
                true
            }
            ModelOp::BeginUnbind if state.bound => {
                *state = ModelState { unbinding: true, ..ModelState::default() };
                true
            }
            ModelOp::FinishUnbind if state.unbinding => {
                state.unbinding = false;
                true
            }
            _ => false,
        }
    }

    fn apply_lifecycle(lifecycle: &mut Lifecycle, op: ModelOp) -> bool {
        match op {
            ModelOp::Connect => lifecycle.mark_connecting(),
            ModelOp::Rollback => {
                let applies = lifecycle.state() == ConnectionState::Connecting;
                lifecycle.rollback_connecting();
                applies
            }
            ModelOp::Rebind => lifecycle.begin_rebind(),
            ModelOp::Bind => lifecycle.mark_bound(Arc::new(StubCertManager)).is_ok(),
            ModelOp::Unbound => lifecycle.mark_unbound(),
            ModelOp::BeginUnbind => lifecycle.begin_unbinding().is_some(),
            ModelOp::FinishUnbind => {
                let applies = lifecycle.state() == ConnectionState::Unbinding;
                lifecycle.finish_unbinding();
                applies
            }
        }
    }

    fn model_to_state(model: ModelState) -> ConnectionState {
        if model.unbinding {
            ConnectionState::Unbinding
        } else if model.bound {
            ConnectionState::Bound
        } else if model.lost {
            ConnectionState::Lost
        } else if model.requested {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    fn generate_sequences(max_len: usize) -> Vec<Vec<ModelOp>> {
        fn recurse(target_len: usize, current: &mut Vec<ModelOp>, out: &mut Vec<Vec<ModelOp>>) {
            if current.len() == target_len {
                out.push(current.clone());
                return;
            }
            for op in MODEL_OPS {
                current.push(op);
                recurse(target_len, current, out);
                current.pop();
            }
        }

        let mut out = Vec::new();
        for len in 1..=max_len {
            let mut current = Vec::new();
            recurse(len, &mut current, &mut out);
        }
        out
    }

    #[test]
    fn starts_disconnected_without_handle() {
        let lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.state(), ConnectionState::Disconnected);
        assert!(lifecycle.handle().is_none());
        assert_eq!(lifecycle.generation(), 0);
    }

    #[test]
    fn bind_without_request_is_rejected() {
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle.mark_bound(Arc::new(StubCertManager)).expect_err("must reject");
        assert_eq!(err, TransitionError { event: "bound", state: ConnectionState::Disconnected });
        assert!(lifecycle.handle().is_none());
    }

    #[test]
    fn each_bind_gets_a_new_generation() {
        let mut lifecycle = Lifecycle::default();
        assert!(lifecycle.mark_connecting());
        assert_eq!(lifecycle.mark_bound(Arc::new(StubCertManager)), Ok(1));
        assert!(lifecycle.mark_unbound());
        assert_eq!(lifecycle.state(), ConnectionState::Lost);
        assert_eq!(lifecycle.mark_bound(Arc::new(StubCertManager)), Ok(2));
    }

    #[test]
    fn pending_first_bind_is_not_a_rebind_candidate() {
        let mut lifecycle = Lifecycle::default();
        assert!(lifecycle.mark_connecting());
        assert!(!lifecycle.begin_rebind());
        assert_eq!(lifecycle.state(), ConnectionState::Connecting);

        assert_eq!(lifecycle.mark_bound(Arc::new(StubCertManager)), Ok(1));
        assert!(lifecycle.mark_unbound());
        assert!(lifecycle.begin_rebind());
        assert_eq!(lifecycle.state(), ConnectionState::Connecting);
        assert!(!lifecycle.begin_rebind());
    }

    #[test]
    fn lifecycle_transitions_match_reference_model() {
        for sequence in generate_sequences(5) {
            let mut lifecycle = Lifecycle::default();
            let mut model = ModelState::default();

            for op in &sequence {
                let expected = apply_model(&mut model, *op);
                let actual = apply_lifecycle(&mut lifecycle, *op);

                assert_eq!(
                    actual, expected,
                    "operation mismatch: op={:?}, sequence={:?}, state={:?}, model={:?}",
                    op, sequence, lifecycle.state(), model
                );
                assert_eq!(
                    lifecycle.state(),
                    model_to_state(model),
                    "state mismatch after op {:?} in sequence {:?}",
                    op,
                    sequence
                );
                assert!(!model.bound || model.requested, "model broke bound => requested");
                assert!(!model.lost || model.requested, "model broke lost => requested");
                assert_eq!(lifecycle.handle().is_some(), lifecycle.state().is_bound());
            }
        }
    }
}
