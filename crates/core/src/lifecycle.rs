use dispenser_types::{DispenserError, LifecycleState, Result};
use tracing::info;

/// Forward-only lifecycle of one dispenser run.
///
/// Valid transitions:
/// - Unknown -> any state (seeding the initial state)
/// - any state -> Unknown (reset at boot)
/// - NoActiveRound -> AwaitingTransfers -> ProvidingWarranties ->
///   AwaitingUnblinding -> DistributingFunds -> Done
///
/// Callers that share a `Lifecycle` must serialize `advance` themselves.
#[derive(Debug)]
pub struct Lifecycle {
    current: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current: LifecycleState::Unknown,
        }
    }

    pub fn current_state(&self) -> LifecycleState {
        self.current
    }

    /// Seed the state of a freshly booted service.
    ///
    /// Always assumes no round is running; there is no recovery from chain
    /// history.
    pub fn determine_initial_state(&mut self) -> Result<()> {
        if self.current != LifecycleState::Unknown {
            return Err(DispenserError::AlreadyInitialized(self.current));
        }
        self.advance(LifecycleState::NoActiveRound)
    }

    pub fn advance(&mut self, target: LifecycleState) -> Result<()> {
        self.check(target)?;

        info!("Lifecycle transition: {} -> {}", self.current, target);
        self.current = target;
        Ok(())
    }

    /// Fail with `InvalidTransition` unless `target` is reachable from the
    /// current state. Does not change the state.
    pub fn check(&self, target: LifecycleState) -> Result<()> {
        if !Self::is_allowed(self.current, target) {
            return Err(DispenserError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }
        Ok(())
    }

    pub fn is_allowed(from: LifecycleState, to: LifecycleState) -> bool {
        from == LifecycleState::Unknown
            || to == LifecycleState::Unknown
            || from.successor() == Some(to)
    }

    /// Admission gate for join requests. Currently permissive in every state.
    pub fn can_accept_join_request(&self) -> bool {
        true
    }

    /// Admission gate for deposits. Currently permissive in every state.
    pub fn can_accept_deposit(&self) -> bool {
        true
    }

    pub fn is_round_active(&self) -> bool {
        !matches!(
            self.current,
            LifecycleState::Unknown | LifecycleState::NoActiveRound | LifecycleState::Done
        )
    }
}
