use clap::{Args, Subcommand};

/// Maintain the group directory
#[derive(Args, Debug)]
pub struct Command {
    #[command(subcommand)]
    action: Action,
}

impl Command {
    pub async fn run(self, config: crate::config::Config) {
        self.action.run(config).await
    }
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Register a group in the directory
    Create {
        name: String,
        /// Hide the group from resolution
        #[arg(long)]
        hidden: bool,
        /// Mark the group as external to the host
        #[arg(long)]
        external: bool,
    },
    /// Add an account to a group
    AddMember { group: String, account: String },
    /// Print the registered groups
    Print,
}

impl Action {
    async fn run(self, config: crate::config::Config) {
        let database = config
            .database
            .build()
            .await
            .expect("unable to connect to database");
        crate::service::database::migrate(&database)
            .await
            .expect("unable to migrate the database");

        let mut tx = database.begin().await.expect("couldn't start transaction");
        match self {
            Self::Create {
                name,
                hidden,
                external,
            } => {
                let id = crate::model::group::create(&mut tx, &name, hidden, external)
                    .await
                    .expect("couldn't create group");
                tracing::info!("created group {name:?} with uuid {id}");
            }
            Self::AddMember { group, account } => {
                crate::model::group::add_member(&mut tx, &group, &account)
                    .await
                    .expect("couldn't add member");
                tracing::info!("added account {account:?} to group {group:?}");
            }
            Self::Print => {
                let reports = crate::model::group::reports(&mut tx)
                    .await
                    .expect("unable to fetch groups");
                if reports.is_empty() {
                    tracing::info!("there is no group in the directory");
                } else {
                    for item in reports {
                        tracing::info!(
                            "group {} contains {} accounts (visible={}, external={})",
                            item.name,
                            item.member_count,
                            item.visible,
                            item.external
                        );
                    }
                }
            }
        }
        tx.commit().await.expect("couldn't commit changes");
    }
}
