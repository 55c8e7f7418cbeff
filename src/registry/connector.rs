use log::{debug, warn};
use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use std::future::Future;
use std::time::Duration;

use super::ConnectOptions;
use crate::params;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opens and closes the client/database handle pairs held by a [`Registry`](super::Registry).
pub trait Connector: Send + Sync + 'static {
    type Client: Clone + Send + Sync + 'static;
    type Database: Clone + Send + Sync + 'static;

    /// Opens a verified connection to `uri` and selects `database`.
    fn connect(
        &self,
        uri: &str,
        database: &str,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<(Self::Client, Self::Database), BoxError>> + Send;

    /// Closes `client`, waiting at most `grace` for in-flight operations.
    fn close(&self, client: Self::Client, grace: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

impl Connector for MongoConnector {
    type Client = Client;
    type Database = Database;

    async fn connect(
        &self,
        uri: &str,
        database: &str,
        options: &ConnectOptions,
    ) -> Result<(Client, Database), BoxError> {
        let mut client_options = ClientOptions::parse(uri).await?;
        options.apply(&mut client_options);

        let client = Client::with_options(client_options)?;

        // The driver connects lazily, ping so that unreachable servers fail here
        client
            .database(params::PING_DATABASE)
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!("ping succeeded, selecting database `{}`", database);

        let database = client.database(database);
        Ok((client, database))
    }

    async fn close(&self, client: Client, grace: Duration) {
        if tokio::time::timeout(grace, client.clone().shutdown())
            .await
            .is_err()
        {
            warn!(
                "in-flight operations still pending after {}ms, forcing client close",
                grace.as_millis()
            );
            client.shutdown().immediate(true).await;
        }
    }
}
