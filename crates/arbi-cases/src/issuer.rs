//! One-time companion issuance gated by allowlisted ownership.

use std::collections::{HashMap, HashSet};

use arbi_core::event::Event;
use arbi_core::traits::OwnershipView;
use arbi_core::types::{HolderId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::allowlist::Allowlist;
use crate::error::CaseError;

/// A companion issued against an original token.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redemption {
    pub original_id: TokenId,
    pub companion_id: TokenId,
}

/// Companion ledger: which original ids are spent and who holds each companion.
#[derive(Clone, Debug)]
pub struct CaseIssuer {
    allowlist: Allowlist,
    consumed: HashSet<TokenId>,
    /// Companion id → (owner, original id it was issued against).
    companions: Vec<(HolderId, TokenId)>,
    counts: HashMap<HolderId, u64>,
    events: Vec<Event>,
}

impl CaseIssuer {
    pub fn new(allowlist: Allowlist) -> Self {
        Self {
            allowlist,
            consumed: HashSet::new(),
            companions: Vec::new(),
            counts: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// `true` if `id` is allowlisted and no companion has been issued for it.
    pub fn redeemable(&self, id: TokenId) -> bool {
        self.allowlist.contains(id) && !self.consumed.contains(&id)
    }

    /// Issue one companion to `holder` against original `id`.
    ///
    /// # Errors
    ///
    /// - [`CaseError::NotOwner`] if `holder` does not own `id` (checked first)
    /// - [`CaseError::NotEligible`] if `id` is not allowlisted
    /// - [`CaseError::AlreadyRedeemed`] if a companion was already issued for `id`
    pub fn redeem_individual<V: OwnershipView + ?Sized>(
        &mut self,
        ownership: &V,
        holder: HolderId,
        id: TokenId,
    ) -> Result<TokenId, CaseError> {
        if !ownership.owns(&holder, id) {
            return Err(CaseError::NotOwner { holder, id });
        }
        if !self.allowlist.contains(id) {
            return Err(CaseError::NotEligible(id));
        }
        if self.consumed.contains(&id) {
            return Err(CaseError::AlreadyRedeemed(id));
        }
        Ok(self.issue(holder, id))
    }

    /// Redeem every eligible, unconsumed id `holder` owns.
    ///
    /// Ineligible and already consumed ids are skipped; an empty result is
    /// not an error.
    pub fn redeem<V: OwnershipView + ?Sized>(
        &mut self,
        ownership: &V,
        holder: HolderId,
    ) -> Vec<Redemption> {
        let eligible: Vec<TokenId> = ownership
            .tokens_of(&holder)
            .into_iter()
            .filter(|id| self.redeemable(*id))
            .collect();
        let issued: Vec<Redemption> = eligible
            .into_iter()
            .map(|original_id| Redemption {
                original_id,
                companion_id: self.issue(holder, original_id),
            })
            .collect();
        if issued.is_empty() {
            debug!(%holder, "no redeemable ids");
        }
        issued
    }

    fn issue(&mut self, holder: HolderId, original_id: TokenId) -> TokenId {
        let companion_id = TokenId(self.companions.len() as u64);
        self.consumed.insert(original_id);
        self.companions.push((holder, original_id));
        *self.counts.entry(holder).or_insert(0) += 1;
        info!(%holder, %original_id, %companion_id, "companion issued");
        self.events.push(Event::CompanionIssued {
            holder,
            original_id,
            companion_id,
        });
        companion_id
    }

    /// Number of companions issued so far.
    pub fn companion_supply(&self) -> u64 {
        self.companions.len() as u64
    }

    pub fn companion_count(&self, holder: &HolderId) -> u64 {
        self.counts.get(holder).copied().unwrap_or(0)
    }

    pub fn owner_of_companion(&self, companion_id: TokenId) -> Option<HolderId> {
        self.companion(companion_id).map(|(owner, _)| owner)
    }

    /// Original id a companion was issued against.
    pub fn origin_of(&self, companion_id: TokenId) -> Option<TokenId> {
        self.companion(companion_id).map(|(_, origin)| origin)
    }

    fn companion(&self, companion_id: TokenId) -> Option<(HolderId, TokenId)> {
        usize::try_from(companion_id.0)
            .ok()
            .and_then(|idx| self.companions.get(idx))
            .copied()
    }

    /// Hand out buffered events in emission order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbi_core::constants::START_PRICE;
    use arbi_core::{Collection, CollectionParams};
    use proptest::prelude::*;

    fn holder(seed: u8) -> HolderId {
        HolderId([seed; 20])
    }

    fn allowlist() -> Allowlist {
        Allowlist::new([TokenId(0), TokenId(5), TokenId(10), TokenId(17)])
    }

    /// Collection where `holder(1)` owns ids 0..=9 and `holder(2)` owns 10..=19.
    fn minted() -> Collection {
        let mut c = Collection::new(CollectionParams::default(), 0).unwrap();
        for i in 0..20u8 {
            let who = if i < 10 { holder(1) } else { holder(2) };
            c.purchase(who, START_PRICE, 0).unwrap();
        }
        c
    }

    #[test]
    fn redeemable_reflects_allowlist() {
        let issuer = CaseIssuer::new(allowlist());
        assert!(issuer.redeemable(TokenId(5)));
        assert!(!issuer.redeemable(TokenId(6)));
    }

    #[test]
    fn redeem_individual_once() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        let owner = c.owner_of(TokenId(5)).unwrap();
        assert_eq!(issuer.redeem_individual(&c, owner, TokenId(5)).unwrap(), TokenId(0));
        assert!(!issuer.redeemable(TokenId(5)));
        assert_eq!(
            issuer.redeem_individual(&c, owner, TokenId(5)),
            Err(CaseError::AlreadyRedeemed(TokenId(5)))
        );
        assert_eq!(issuer.companion_supply(), 1);
        assert_eq!(issuer.companion_count(&owner), 1);
        assert_eq!(issuer.owner_of_companion(TokenId(0)), Some(owner));
        assert_eq!(issuer.origin_of(TokenId(0)), Some(TokenId(5)));
    }

    #[test]
    fn redeem_individual_requires_ownership() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        assert_eq!(
            issuer.redeem_individual(&c, holder(1), TokenId(10)),
            Err(CaseError::NotOwner {
                holder: holder(1),
                id: TokenId(10)
            })
        );
        // Unissued ids have no owner.
        assert!(matches!(
            issuer.redeem_individual(&c, holder(1), TokenId(1500)),
            Err(CaseError::NotOwner { .. })
        ));
        assert!(issuer.redeemable(TokenId(10)));
        assert_eq!(issuer.companion_supply(), 0);
    }

    #[test]
    fn redeem_individual_rejects_ineligible() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        assert_eq!(
            issuer.redeem_individual(&c, holder(1), TokenId(3)),
            Err(CaseError::NotEligible(TokenId(3)))
        );
        assert!(issuer.drain_events().is_empty());
    }

    #[test]
    fn batch_redeem_takes_every_eligible_id() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        let got = issuer.redeem(&c, holder(2));
        assert_eq!(
            got,
            vec![
                Redemption { original_id: TokenId(10), companion_id: TokenId(0) },
                Redemption { original_id: TokenId(17), companion_id: TokenId(1) },
            ]
        );
        assert_eq!(issuer.companion_count(&holder(2)), 2);
        assert!(issuer.redeem(&c, holder(2)).is_empty());
    }

    #[test]
    fn batch_redeem_skips_consumed() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        issuer.redeem_individual(&c, holder(1), TokenId(0)).unwrap();
        let got = issuer.redeem(&c, holder(1));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].original_id, TokenId(5));
    }

    #[test]
    fn batch_redeem_without_holdings_is_empty() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        assert!(issuer.redeem(&c, holder(9)).is_empty());
        assert_eq!(issuer.companion_supply(), 0);
    }

    #[test]
    fn events_record_each_issue() {
        let c = minted();
        let mut issuer = CaseIssuer::new(allowlist());
        issuer.redeem(&c, holder(1));
        let events = issuer.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Event::CompanionIssued {
                holder: holder(1),
                original_id: TokenId(0),
                companion_id: TokenId(0)
            }
        );
    }

    proptest! {
        #[test]
        fn companion_supply_bounded_by_allowlist(
            listed in prop::collection::btree_set(0u64..20, 0..20),
            attempts in prop::collection::vec((1u8..3, 0u64..25), 0..60),
        ) {
            let c = minted();
            let mut issuer = CaseIssuer::new(Allowlist::new(listed.iter().copied().map(TokenId)));
            for (who, id) in attempts {
                let _ = issuer.redeem_individual(&c, holder(who), TokenId(id));
                issuer.redeem(&c, holder(who));
            }
            prop_assert!(issuer.companion_supply() <= listed.len() as u64);
            let origins: HashSet<TokenId> = (0..issuer.companion_supply())
                .filter_map(|i| issuer.origin_of(TokenId(i)))
                .collect();
            prop_assert_eq!(origins.len() as u64, issuer.companion_supply());
        }
    }
}
