/// Parameters of the rounds this dispenser starts, and gas limits for the
/// transactions it sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixParams {
    /// Required deposit in wei.
    pub deposit: u128,
    pub deadline_join: u64,
    pub deadline_warranty: u64,
    pub deadline_unblind: u64,
    pub deadline_distribute: u64,
    /// Confirmations the contract waits for before releasing funds.
    pub confirmations: u64,
    pub start_gas: u64,
    pub ballot_gas: u64,
    /// Upper bound on clients accepted but not yet paid.
    pub max_accepted_clients: usize,
}

impl Default for MixParams {
    fn default() -> Self {
        Self {
            deposit: 100_000_000_000_000_000,
            deadline_join: 15,
            deadline_warranty: 15,
            deadline_unblind: 15,
            deadline_distribute: 15,
            confirmations: 1,
            start_gas: 200_000,
            ballot_gas: 200_000,
            max_accepted_clients: 1024,
        }
    }
}
