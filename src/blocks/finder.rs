use crate::model::account::AccountId;
use crate::repository::group::{BackendError, GroupResolveError, GroupService};
use revgate_blocks::{BlockRule, BlockTable, PolicyType};
use std::sync::Arc;

/// First match resolution over a block table snapshot.
///
/// Stateless: every call works on the snapshot it is handed and the
/// memberships it fetches, nothing is memoized between calls.
pub struct BlockFinder {
    groups: Arc<dyn GroupService + Send + Sync>,
}

impl BlockFinder {
    pub fn new(groups: Arc<dyn GroupService + Send + Sync>) -> Self {
        Self { groups }
    }

    /// Find the first configured rule, in table order, whose group the
    /// account belongs to.
    ///
    /// Rows naming a group that is unknown, not visible or not internal
    /// are reported and skipped, one bad row never hides the remaining
    /// ones. Without any configured row the group directory is not
    /// consulted at all.
    #[tracing::instrument(skip(self, table))]
    pub async fn first_matching(
        &self,
        policy: PolicyType,
        table: &BlockTable,
        account: &AccountId,
    ) -> Result<Option<BlockRule>, BackendError> {
        let Some(rules) = table.rules(policy) else {
            return Ok(None);
        };
        let membership = self.groups.effective_groups(account).await?;
        for (group_name, rule) in rules {
            match self.groups.resolve_group(group_name).await {
                Ok(group) => {
                    if membership.contains(&group.id) {
                        return Ok(Some(*rule));
                    }
                }
                Err(GroupResolveError::NotFound) => {
                    tracing::error!("ignoring rule for unknown group {group_name:?}");
                }
                Err(GroupResolveError::NotVisible) => {
                    tracing::error!("ignoring rule for non-visible group {group_name:?}");
                }
                Err(GroupResolveError::NotInternal) => {
                    tracing::error!("ignoring rule for non-internal group {group_name:?}");
                }
                Err(GroupResolveError::Backend(inner)) => return Err(inner),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::BlockFinder;
    use crate::model::account::AccountId;
    use crate::model::group::{GroupId, MembershipSet};
    use crate::repository::group::{BackendError, GroupResolveError, GroupService, MemoryGroupService};
    use revgate_blocks::{BlockTable, PolicyType};
    use std::sync::Arc;

    /// Directory that fails the test when consulted at all.
    #[derive(Debug, Default)]
    struct UnreachableGroupService;

    #[async_trait::async_trait]
    impl GroupService for UnreachableGroupService {
        async fn resolve_group(
            &self,
            _name: &str,
        ) -> Result<crate::model::group::InternalGroup, GroupResolveError> {
            panic!("group directory should not be consulted")
        }

        async fn effective_groups(
            &self,
            _account: &AccountId,
        ) -> Result<MembershipSet, BackendError> {
            panic!("group directory should not be consulted")
        }
    }

    fn table(input: &str) -> BlockTable {
        BlockTable::from_text(input).unwrap()
    }

    #[tokio::test]
    async fn should_skip_directory_without_rules() {
        crate::init_logs();

        let finder = BlockFinder::new(Arc::new(UnreachableGroupService));
        let found = finder
            .first_matching(PolicyType::Blocks, &table(""), &AccountId::new("alice"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn should_miss_for_account_outside_configured_groups() {
        crate::init_logs();

        let ops = GroupId::random();
        let groups = MemoryGroupService::default().with_group("ops", ops);
        let finder = BlockFinder::new(Arc::new(groups));
        let found = finder
            .first_matching(
                PolicyType::Blocks,
                &table("[block \"ops\"]\nblocks = true\n"),
                &AccountId::new("alice"),
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn should_return_flag_of_single_matching_group() {
        crate::init_logs();

        let ops = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("ops", ops)
            .with_member("alice", ops);
        let finder = BlockFinder::new(Arc::new(groups));
        let found = finder
            .first_matching(
                PolicyType::Blocks,
                &table("[block \"ops\"]\nblocks = true\n"),
                &AccountId::new("alice"),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(found.blocked);

        let found = finder
            .first_matching(
                PolicyType::Blocks,
                &table("[block \"ops\"]\nblocks = false\n"),
                &AccountId::new("alice"),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!found.blocked);
    }

    #[tokio::test]
    async fn should_pick_first_rule_in_table_order() {
        crate::init_logs();

        let first = GroupId::random();
        let second = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("alpha", first)
            .with_group("zulu", second)
            .with_member("alice", first)
            .with_member("alice", second);
        let finder = BlockFinder::new(Arc::new(groups));
        let input = "[block \"zulu\"]\nblocks = true\n[block \"alpha\"]\nblocks = false\n";

        // rows iterate sorted by group name, the decision is reproducible
        for _ in 0..5 {
            let found = finder
                .first_matching(PolicyType::Blocks, &table(input), &AccountId::new("alice"))
                .await
                .unwrap()
                .unwrap();
            assert!(!found.blocked);
        }
    }

    #[tokio::test]
    async fn should_skip_unresolvable_groups_and_continue() {
        crate::init_logs();

        let ops = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_hidden_group("cabal")
            .with_external_group("federated")
            .with_group("ops", ops)
            .with_member("alice", ops);
        let finder = BlockFinder::new(Arc::new(groups));
        let input = concat!(
            "[block \"absent\"]\nblocks = true\n",
            "[block \"cabal\"]\nblocks = true\n",
            "[block \"federated\"]\nblocks = true\n",
            "[block \"ops\"]\nblocks = true\n",
        );
        let found = finder
            .first_matching(PolicyType::Blocks, &table(input), &AccountId::new("alice"))
            .await
            .unwrap()
            .unwrap();
        assert!(found.blocked);
    }

    #[tokio::test]
    async fn should_propagate_backend_failure() {
        crate::init_logs();

        #[derive(Debug, Default)]
        struct BrokenGroupService;

        #[async_trait::async_trait]
        impl GroupService for BrokenGroupService {
            async fn resolve_group(
                &self,
                _name: &str,
            ) -> Result<crate::model::group::InternalGroup, GroupResolveError> {
                Err(GroupResolveError::Backend("directory down".into()))
            }

            async fn effective_groups(
                &self,
                _account: &AccountId,
            ) -> Result<MembershipSet, BackendError> {
                Ok(MembershipSet::default())
            }
        }

        let finder = BlockFinder::new(Arc::new(BrokenGroupService));
        let result = finder
            .first_matching(
                PolicyType::Blocks,
                &table("[block \"ops\"]\nblocks = true\n"),
                &AccountId::new("alice"),
            )
            .await;
        assert!(result.is_err());
    }
}
