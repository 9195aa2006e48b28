//! Trait interfaces between the engine and its collaborators.
//!
//! - [`OwnershipView`]: read-only ownership facts (the supply ledger implements,
//!   the eligibility companion consumes)
//! - [`PayoutSink`]: moves value to a holder, the one externally observable effect

use crate::error::TransferError;
use crate::types::{Amount, HolderId, TokenId};

/// Read-only view of who holds which tokens.
pub trait OwnershipView {
    /// Current owner of `id`. Returns `None` if the token has not been issued.
    fn owner_of(&self, id: TokenId) -> Option<HolderId>;

    /// Number of tokens held by `holder`.
    fn ownership_count(&self, holder: &HolderId) -> u64;

    /// Ids held by `holder`, in issuance order.
    fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId>;

    /// Total number of tokens issued so far.
    fn total_issued(&self) -> u64;

    /// Whether `holder` currently owns `id`.
    ///
    /// Default implementation delegates to [`owner_of`](Self::owner_of).
    fn owns(&self, holder: &HolderId, id: TokenId) -> bool {
        self.owner_of(id).as_ref() == Some(holder)
    }
}

/// Destination for redemption payouts.
///
/// Called only after the claim ledger has been committed, so an
/// implementation that calls back into the engine observes the updated
/// claim. Returning an error makes the engine roll the claim back.
pub trait PayoutSink: Send + Sync {
    fn transfer(&self, to: &HolderId, amount: Amount) -> Result<(), TransferError>;
}

impl<T: PayoutSink + ?Sized> PayoutSink for std::sync::Arc<T> {
    fn transfer(&self, to: &HolderId, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockOwnership {
        owners: HashMap<TokenId, HolderId>,
    }

    impl OwnershipView for MockOwnership {
        fn owner_of(&self, id: TokenId) -> Option<HolderId> {
            self.owners.get(&id).copied()
        }

        fn ownership_count(&self, holder: &HolderId) -> u64 {
            self.owners.values().filter(|h| *h == holder).count() as u64
        }

        fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId> {
            let mut ids: Vec<TokenId> = self
                .owners
                .iter()
                .filter(|(_, h)| *h == holder)
                .map(|(id, _)| *id)
                .collect();
            ids.sort();
            ids
        }

        fn total_issued(&self) -> u64 {
            self.owners.len() as u64
        }
    }

    #[test]
    fn owns_default_delegates_to_owner_of() {
        let a = HolderId([1; 20]);
        let b = HolderId([2; 20]);
        let view = MockOwnership {
            owners: HashMap::from([(TokenId(0), a), (TokenId(1), b)]),
        };
        assert!(view.owns(&a, TokenId(0)));
        assert!(!view.owns(&a, TokenId(1)));
        assert!(!view.owns(&a, TokenId(7)));
        assert_eq!(view.tokens_of(&b), vec![TokenId(1)]);
    }

    struct Refusing;

    impl PayoutSink for Refusing {
        fn transfer(&self, _to: &HolderId, _amount: Amount) -> Result<(), TransferError> {
            Err(TransferError("refused".into()))
        }
    }

    #[test]
    fn arc_sink_forwards() {
        let sink = std::sync::Arc::new(Refusing);
        assert_eq!(
            sink.transfer(&HolderId::ZERO, 1),
            Err(TransferError("refused".into()))
        );
    }
}
