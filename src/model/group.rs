use crate::service::database::{Error, Transaction};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identity of a concrete group, usable for membership testing.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GroupId(Uuid);

impl GroupId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(input).map(Self)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A group with a locally resolvable identity, as opposed to hidden,
/// synthetic or federated groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalGroup {
    pub id: GroupId,
    pub name: String,
}

/// Effective group memberships of an account, transitive closure included.
#[derive(Debug, Default)]
pub struct MembershipSet {
    inner: HashSet<GroupId>,
}

impl MembershipSet {
    pub fn contains(&self, id: &GroupId) -> bool {
        self.inner.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<GroupId> for MembershipSet {
    fn from_iter<T: IntoIterator<Item = GroupId>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

pub async fn create<'t>(
    tx: &mut Transaction<'t>,
    name: &str,
    hidden: bool,
    external: bool,
) -> Result<GroupId, Error> {
    let id = GroupId::random();
    sqlx::query(
        r#"INSERT INTO groups (uuid, name, visible, external, created_at)
VALUES ($1, $2, $3, $4, UNIXEPOCH())"#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(!hidden)
    .bind(external)
    .execute(&mut *tx)
    .await?;
    Ok(id)
}

pub async fn add_member<'t>(
    tx: &mut Transaction<'t>,
    group: &str,
    account: &str,
) -> Result<(), Error> {
    let uuid: Option<String> = sqlx::query_scalar("SELECT uuid FROM groups WHERE name = $1")
        .bind(group)
        .fetch_optional(&mut *tx)
        .await?;
    let uuid = uuid.ok_or(Error::RowNotFound)?;
    sqlx::query(
        r#"INSERT INTO group_members (group_uuid, account, created_at)
VALUES ($1, $2, UNIXEPOCH())
ON CONFLICT (group_uuid, account) DO NOTHING"#,
    )
    .bind(uuid)
    .bind(account)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

pub struct GroupReport {
    pub name: String,
    pub member_count: i64,
    pub visible: bool,
    pub external: bool,
}

impl FromRow<'_, SqliteRow> for GroupReport {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get(0)?,
            member_count: row.try_get(1)?,
            visible: row.try_get(2)?,
            external: row.try_get(3)?,
        })
    }
}

pub async fn reports<'t>(tx: &mut Transaction<'t>) -> Result<Vec<GroupReport>, Error> {
    sqlx::query_as(
        r#"SELECT g.name, count(m.account), g.visible, g.external
FROM groups g
LEFT JOIN group_members m ON m.group_uuid = g.uuid
GROUP BY g.uuid
ORDER BY g.name"#,
    )
    .fetch_all(&mut *tx)
    .await
}
