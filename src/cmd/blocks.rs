use crate::model::account::Principal;
use crate::repository::group::{DatabaseGroupService, GroupService};
use crate::repository::source::{ConfigSource, FileConfigSource};
use clap::{Args, Subcommand};
use revgate_blocks::PolicyType;
use std::sync::Arc;

/// Inspect and evaluate the block table
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
    /// Print the configured rows
    Print,
    /// Evaluate the gate for one account
    Check {
        /// Account identifier to evaluate
        #[arg(long)]
        account: String,
    },
}

impl Action {
    async fn run_print(config: crate::config::Config) {
        let table = FileConfigSource::new(&config.blocks.path)
            .load_block_table()
            .await
            .expect("unable to load the block table");

        let mut empty = true;
        for policy in PolicyType::ALL.iter().copied() {
            if let Some(rules) = table.rules(policy) {
                for (group, rule) in rules {
                    empty = false;
                    tracing::info!("{policy} for group {group:?} is set to {}", rule.blocked);
                }
            }
        }
        if empty {
            tracing::info!("the block table is empty");
        }
    }

    async fn run_check(config: crate::config::Config, account: String) {
        let database = config
            .database
            .build()
            .await
            .expect("unable to connect to database");
        crate::service::database::migrate(&database)
            .await
            .expect("unable to migrate the database");

        let groups: Arc<dyn GroupService + Send + Sync> =
            Arc::new(DatabaseGroupService::new(database));
        let gate = config.blocks.build(groups);

        let principal = Principal::identified(account.as_str());
        match gate.is_blocked(&principal).await {
            Ok(true) => tracing::info!("account {account:?} is blocked"),
            Ok(false) => tracing::info!("account {account:?} is not blocked"),
            Err(error) => tracing::error!("unable to evaluate account {account:?}: {error}"),
        }
    }

    async fn run(self, config: crate::config::Config) {
        match self {
            Self::Print => Self::run_print(config).await,
            Self::Check { account } => Self::run_check(config, account).await,
        }
    }
}
