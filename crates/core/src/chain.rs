//! Ownership chain projection.
//!
//! A read-only merge of everything that ever touched an order's
//! ownership: the original owner, each transfer request, each
//! collaborator invite, and the assigned executing manager -- flattened
//! into one timestamp-ordered sequence for audit display. Nothing here
//! mutates; the API handler gathers the rows and delegates to
//! [`merge_chain`].

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// What kind of event a chain entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainItemKind {
    OriginalOwner,
    Transfer,
    Collaborator,
    AssignedManager,
}

/// One entry in the ownership chain.
#[derive(Debug, Clone, Serialize)]
pub struct OwnershipChainItem {
    pub kind: ChainItemKind,
    /// The user this entry is about (owner, recipient, invitee, manager).
    pub user_id: Option<DbId>,
    /// Display name when resolvable at read time.
    pub display_name: Option<String>,
    /// Status carried by the underlying record, where one exists
    /// (transfer/collaborator statuses; `None` for owner and manager).
    pub status: Option<String>,
    pub occurred_at: Timestamp,
}

/// Merge chain entries from all sources into one temporal sequence.
///
/// Sorting is stable, so entries with identical timestamps keep their
/// input order (owner first, then transfers, collaborators, manager --
/// the order callers pass the slices in).
pub fn merge_chain(
    original_owner: OwnershipChainItem,
    transfers: Vec<OwnershipChainItem>,
    collaborators: Vec<OwnershipChainItem>,
    assigned_manager: Option<OwnershipChainItem>,
) -> Vec<OwnershipChainItem> {
    let mut items = Vec::with_capacity(2 + transfers.len() + collaborators.len());
    items.push(original_owner);
    items.extend(transfers);
    items.extend(collaborators);
    items.extend(assigned_manager);
    items.sort_by_key(|item| item.occurred_at);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn item(kind: ChainItemKind, user_id: DbId, offset_mins: i64) -> OwnershipChainItem {
        OwnershipChainItem {
            kind,
            user_id: Some(user_id),
            display_name: None,
            status: None,
            occurred_at: Utc::now() + Duration::minutes(offset_mins),
        }
    }

    #[test]
    fn test_merge_orders_by_timestamp() {
        let owner = item(ChainItemKind::OriginalOwner, 1, 0);
        let transfers = vec![item(ChainItemKind::Transfer, 2, 30)];
        let collaborators = vec![item(ChainItemKind::Collaborator, 3, 10)];
        let manager = Some(item(ChainItemKind::AssignedManager, 4, 20));

        let chain = merge_chain(owner, transfers, collaborators, manager);

        let kinds: Vec<_> = chain.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChainItemKind::OriginalOwner,
                ChainItemKind::Collaborator,
                ChainItemKind::AssignedManager,
                ChainItemKind::Transfer,
            ]
        );
    }

    #[test]
    fn test_merge_with_only_owner() {
        let owner = item(ChainItemKind::OriginalOwner, 1, 0);
        let chain = merge_chain(owner, vec![], vec![], None);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].kind, ChainItemKind::OriginalOwner);
    }

    #[test]
    fn test_merge_is_stable_for_equal_timestamps() {
        let now = Utc::now();
        let mk = |kind, user_id| OwnershipChainItem {
            kind,
            user_id: Some(user_id),
            display_name: None,
            status: None,
            occurred_at: now,
        };

        let chain = merge_chain(
            mk(ChainItemKind::OriginalOwner, 1),
            vec![mk(ChainItemKind::Transfer, 2)],
            vec![mk(ChainItemKind::Collaborator, 3)],
            None,
        );

        // Equal timestamps keep input order: owner, transfers, collaborators.
        let users: Vec<_> = chain.iter().map(|i| i.user_id.unwrap()).collect();
        assert_eq!(users, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_preserves_all_entries() {
        let owner = item(ChainItemKind::OriginalOwner, 1, 0);
        let transfers = vec![
            item(ChainItemKind::Transfer, 2, 5),
            item(ChainItemKind::Transfer, 3, 15),
        ];
        let collaborators = vec![
            item(ChainItemKind::Collaborator, 4, 7),
            item(ChainItemKind::Collaborator, 5, 2),
        ];

        let chain = merge_chain(owner, transfers, collaborators, None);
        assert_eq!(chain.len(), 5);
    }
}
