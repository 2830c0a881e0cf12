use crate::model::account::Principal;
use crate::repository::group::BackendError;
use crate::repository::source::{ConfigSource, SourceError};
use revgate_blocks::PolicyType;
use std::sync::Arc;

pub mod config;
pub mod finder;

use finder::BlockFinder;

#[derive(Debug)]
pub enum GateError {
    Source(SourceError),
    Directory(BackendError),
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(inner) => inner.fmt(f),
            Self::Directory(inner) => write!(f, "group directory failure: {inner}"),
        }
    }
}

impl std::error::Error for GateError {}

impl From<SourceError> for GateError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Single decision point consumed by every enforcement hook.
pub struct BlockGate {
    message: String,
    source: Arc<dyn ConfigSource + Send + Sync>,
    finder: BlockFinder,
}

impl BlockGate {
    pub fn new(
        message: String,
        source: Arc<dyn ConfigSource + Send + Sync>,
        finder: BlockFinder,
    ) -> Self {
        Self {
            message,
            source,
            finder,
        }
    }

    /// Rejection text shown to blocked users.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether a block rule applies to the acting principal.
    ///
    /// Anonymous callers are never blocked. Identified callers are
    /// evaluated against a fresh table snapshot, the flag of the first
    /// matching group wins and no match means not blocked.
    #[tracing::instrument(skip(self))]
    pub async fn is_blocked(&self, principal: &Principal) -> Result<bool, GateError> {
        let account = match principal {
            Principal::Anonymous => return Ok(false),
            Principal::Identified(account) => account,
        };
        let table = self.source.load_block_table().await?;
        let found = self
            .finder
            .first_matching(PolicyType::Blocks, &table, account)
            .await
            .map_err(GateError::Directory)?;
        Ok(found.map(|rule| rule.blocked).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::finder::BlockFinder;
    use super::BlockGate;
    use crate::model::account::Principal;
    use crate::model::group::GroupId;
    use crate::repository::group::MemoryGroupService;
    use crate::repository::source::StaticConfigSource;
    use std::sync::Arc;

    const SCENARIO: &str = concat!(
        "[block \"sockpuppets\"]\n\tblocks = true\n",
        "[block \"trusted\"]\n\tblocks = false\n",
    );

    fn gate(groups: MemoryGroupService, table: &str) -> BlockGate {
        BlockGate::new(
            super::config::Config::default_message(),
            Arc::new(StaticConfigSource::new(table)),
            BlockFinder::new(Arc::new(groups)),
        )
    }

    #[tokio::test]
    async fn should_not_block_anyone_without_configuration() {
        crate::init_logs();

        // an empty table never reaches the group directory
        let gate = gate(MemoryGroupService::default(), "");
        assert!(!gate.is_blocked(&Principal::identified("alice")).await.unwrap());
        assert!(!gate.is_blocked(&Principal::Anonymous).await.unwrap());
    }

    #[tokio::test]
    async fn should_not_block_anonymous_caller() {
        crate::init_logs();

        let sockpuppets = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("sockpuppets", sockpuppets)
            .with_group("trusted", GroupId::random());
        let gate = gate(groups, SCENARIO);
        assert!(!gate.is_blocked(&Principal::Anonymous).await.unwrap());
    }

    #[tokio::test]
    async fn should_apply_first_matching_rule() {
        crate::init_logs();

        let sockpuppets = GroupId::random();
        let trusted = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("sockpuppets", sockpuppets)
            .with_group("trusted", trusted)
            // member of the blocking group only
            .with_member("a", sockpuppets)
            // member of the exempted group only
            .with_member("b", trusted)
            // member of both, "sockpuppets" sorts first and wins
            .with_member("d", sockpuppets)
            .with_member("d", trusted);
        let gate = gate(groups, SCENARIO);

        assert!(gate.is_blocked(&Principal::identified("a")).await.unwrap());
        assert!(!gate.is_blocked(&Principal::identified("b")).await.unwrap());
        assert!(!gate.is_blocked(&Principal::identified("c")).await.unwrap());
        assert!(gate.is_blocked(&Principal::identified("d")).await.unwrap());
    }

    #[tokio::test]
    async fn should_win_with_exempting_rule_sorting_first() {
        crate::init_logs();

        let blocked = GroupId::random();
        let exempt = GroupId::random();
        let groups = MemoryGroupService::default()
            .with_group("zz-blocked", blocked)
            .with_group("aa-exempt", exempt)
            .with_member("dual", blocked)
            .with_member("dual", exempt);
        let input = concat!(
            "[block \"zz-blocked\"]\n\tblocks = true\n",
            "[block \"aa-exempt\"]\n\tblocks = false\n",
        );
        let gate = gate(groups, input);
        assert!(!gate.is_blocked(&Principal::identified("dual")).await.unwrap());
    }

    #[tokio::test]
    async fn should_surface_unloadable_table() {
        crate::init_logs();

        let gate = gate(MemoryGroupService::default(), "[block \"ops\"\nblocks = true\n");
        assert!(gate.is_blocked(&Principal::identified("alice")).await.is_err());
    }
}
