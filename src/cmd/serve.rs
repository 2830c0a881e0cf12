use crate::hooks::WriteValidator;
use crate::http::AppState;
use crate::repository::group::{DatabaseGroupService, GroupService};
use clap::Args;
use std::sync::Arc;

/// Starts the http gate, the core of the machine
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(self, config: crate::config::Config) {
        tracing::info!("preparing http gate");
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
        let gate = Arc::new(config.blocks.build(groups));
        let validator = Arc::new(WriteValidator::new(gate.clone()));
        let router = crate::http::router(AppState { gate, validator });

        let address = config.http.address();
        tracing::info!("listening on {address}");
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .expect("unable to bind address");
        axum::serve(listener, router)
            .await
            .expect("unable to run http server")
    }
}
