use crate::model::account::AccountId;
use crate::model::group::{GroupId, InternalGroup, MembershipSet};
use crate::service::database::Pool;
use std::collections::{HashMap, HashSet};

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Why a configured group name could not be used for membership testing.
///
/// The first three variants are tolerated during resolution: the row is
/// reported and skipped. A backend failure aborts the evaluation instead,
/// an unreachable directory must never degrade into a silent pass.
#[derive(Debug)]
pub enum GroupResolveError {
    NotFound,
    NotVisible,
    NotInternal,
    Backend(BackendError),
}

impl std::fmt::Display for GroupResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "unknown group"),
            Self::NotVisible => write!(f, "group not visible"),
            Self::NotInternal => write!(f, "group not internal"),
            Self::Backend(inner) => write!(f, "group backend failure: {inner}"),
        }
    }
}

impl std::error::Error for GroupResolveError {}

#[async_trait::async_trait]
pub trait GroupService {
    /// Resolve a human readable group name to a concrete internal group.
    async fn resolve_group(&self, name: &str) -> Result<InternalGroup, GroupResolveError>;

    /// Effective group memberships of an account.
    async fn effective_groups(&self, account: &AccountId) -> Result<MembershipSet, BackendError>;
}

#[derive(Clone, Debug)]
pub struct DatabaseGroupService {
    database: Pool,
}

impl DatabaseGroupService {
    pub fn new(database: Pool) -> Self {
        Self { database }
    }
}

#[async_trait::async_trait]
impl GroupService for DatabaseGroupService {
    #[tracing::instrument(skip(self))]
    async fn resolve_group(&self, name: &str) -> Result<InternalGroup, GroupResolveError> {
        let row: Option<(String, String, bool, bool)> =
            sqlx::query_as("SELECT uuid, name, visible, external FROM groups WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.database)
                .await
                .map_err(|err| GroupResolveError::Backend(err.into()))?;
        let (uuid, name, visible, external) = row.ok_or(GroupResolveError::NotFound)?;
        if !visible {
            return Err(GroupResolveError::NotVisible);
        }
        if external {
            return Err(GroupResolveError::NotInternal);
        }
        let id = GroupId::parse(&uuid).map_err(|err| GroupResolveError::Backend(err.into()))?;
        Ok(InternalGroup { id, name })
    }

    #[tracing::instrument(skip(self))]
    async fn effective_groups(&self, account: &AccountId) -> Result<MembershipSet, BackendError> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT group_uuid FROM group_members WHERE account = $1")
                .bind(account.as_str())
                .fetch_all(&self.database)
                .await?;
        rows.iter()
            .map(|uuid| GroupId::parse(uuid).map_err(Into::into))
            .collect()
    }
}

/// In memory directory used by tests and by offline evaluation.
#[derive(Debug, Default)]
pub struct MemoryGroupService {
    groups: HashMap<String, MemoryGroup>,
    members: HashMap<String, HashSet<GroupId>>,
}

#[derive(Debug)]
enum MemoryGroup {
    Internal(InternalGroup),
    Hidden,
    External,
}

impl MemoryGroupService {
    pub fn with_group<N: Into<String>>(mut self, name: N, id: GroupId) -> Self {
        let name = name.into();
        self.groups
            .insert(name.clone(), MemoryGroup::Internal(InternalGroup { id, name }));
        self
    }

    pub fn with_hidden_group<N: Into<String>>(mut self, name: N) -> Self {
        self.groups.insert(name.into(), MemoryGroup::Hidden);
        self
    }

    pub fn with_external_group<N: Into<String>>(mut self, name: N) -> Self {
        self.groups.insert(name.into(), MemoryGroup::External);
        self
    }

    pub fn with_member<A: Into<String>>(mut self, account: A, group: GroupId) -> Self {
        self.members.entry(account.into()).or_default().insert(group);
        self
    }
}

#[async_trait::async_trait]
impl GroupService for MemoryGroupService {
    async fn resolve_group(&self, name: &str) -> Result<InternalGroup, GroupResolveError> {
        match self.groups.get(name) {
            None => Err(GroupResolveError::NotFound),
            Some(MemoryGroup::Hidden) => Err(GroupResolveError::NotVisible),
            Some(MemoryGroup::External) => Err(GroupResolveError::NotInternal),
            Some(MemoryGroup::Internal(group)) => Ok(group.clone()),
        }
    }

    async fn effective_groups(&self, account: &AccountId) -> Result<MembershipSet, BackendError> {
        Ok(self
            .members
            .get(account.as_str())
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default())
    }
}
