//! # Connection registry
//!
//! A [`Registry`] keeps at most one live connection per logical name for the
//! lifetime of the process. It is created once at startup and shared by
//! reference ([`RegistryRef`]):
//!
//! * [`Registry::initialize`] opens a connection the first time a name is seen and
//!   is a no-op afterwards.
//! * [`Registry::database`] / [`Registry::client`] hand out the handles of an
//!   initialized name.
//! * [`Registry::close`] / [`Registry::shutdown`] close connections exactly once.
//!   A termination signal (`SIGINT`, `SIGUSR1`, `SIGUSR2`, `SIGTERM`) triggers
//!   [`Registry::shutdown`] automatically unless disabled in the configurables.
//!
//! Closing is best effort: the client waits up to the configured grace period for
//! in-flight operations and is then force-closed, so requests still running at
//! shutdown may observe a transport error.

use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::params::{self, Configurables};

mod connector;
pub use connector::*;

mod options;
pub use options::*;

mod signals;

pub mod uri;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database `{0}` not yet initialized")]
    NotInitialized(String),
    #[error("unable to connect `{name}` :: {source}")]
    Connection {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("invalid connection string `{0}`")]
    InvalidUri(String),
    #[error("connection string `{0}` does not name a database")]
    MissingDatabase(String),
    #[error("unable to install termination signal handlers :: {0}")]
    Signal(#[from] std::io::Error),
}

pub type RegistryRef<C = MongoConnector> = Arc<Registry<C>>;

struct Entry<C: Connector> {
    client: C::Client,
    database: C::Database,
}

pub struct Registry<C: Connector = MongoConnector> {
    connector: C,
    conf: Configurables,
    entries: RwLock<HashMap<String, Entry<C>>>,
    /// Serializes initializations so that a name is never connected twice.
    init_lock: tokio::sync::Mutex<()>,
    signals_installed: AtomicBool,
}

impl Registry<MongoConnector> {
    /// MongoDB registry configured from [`params::configurables`].
    pub fn new() -> RegistryRef {
        Self::with_connector(MongoConnector, params::configurables().clone())
    }
}

impl<C: Connector> Registry<C> {
    pub fn with_connector(connector: C, conf: Configurables) -> RegistryRef<C> {
        Arc::new(Self {
            connector,
            conf,
            entries: RwLock::new(HashMap::new()),
            init_lock: tokio::sync::Mutex::new(()),
            signals_installed: AtomicBool::new(false),
        })
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Opens the connection `name` to the database named in `uri`.
    ///
    /// Returns immediately if `name` was already initialized, whatever `uri` and
    /// `options` are.
    pub async fn initialize(
        self: &Arc<Self>,
        name: &str,
        uri: &str,
        options: ConnectOptions,
    ) -> Result<(), Error> {
        if self.contains(name) {
            trace!("connection `{}` already initialized", name);
            return Ok(());
        }

        let _init = self.init_lock.lock().await;

        // Another caller may have completed the same initialization while we waited
        if self.contains(name) {
            trace!("connection `{}` already initialized", name);
            return Ok(());
        }

        let database_name = uri::database_name(uri)?;

        info!(
            "initializing connection `{}` to {}",
            name,
            uri::redact(uri)
        );

        let (client, database) = self
            .connector
            .connect(uri, &database_name, &options)
            .await
            .map_err(|source| Error::Connection {
                name: name.to_owned(),
                source,
            })?;

        self.write_entries()
            .insert(name.to_owned(), Entry { client, database });

        // Only once there is something to close
        if self.conf.handle_signals {
            if let Err(e) = self.install_signal_listener() {
                self.close(name).await;
                return Err(e);
            }
        }

        debug!("connection `{}` ready (database `{}`)", name, database_name);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_entries().contains_key(name)
    }

    pub fn database(&self, name: &str) -> Result<C::Database, Error> {
        self.read_entries()
            .get(name)
            .map(|e| e.database.clone())
            .ok_or_else(|| Error::NotInitialized(name.to_owned()))
    }

    pub fn client(&self, name: &str) -> Result<C::Client, Error> {
        self.read_entries()
            .get(name)
            .map(|e| e.client.clone())
            .ok_or_else(|| Error::NotInitialized(name.to_owned()))
    }

    /// Closes and forgets the connection `name`. Returns `false` if there was none.
    pub async fn close(&self, name: &str) -> bool {
        let entry = self.write_entries().remove(name);

        let Some(entry) = entry else {
            return false;
        };

        self.connector
            .close(entry.client, self.conf.shutdown_grace)
            .await;
        info!("connection `{}` closed", name);
        true
    }

    /// Closes and forgets every connection.
    pub async fn shutdown(&self) {
        let entries: Vec<(String, Entry<C>)> = self.write_entries().drain().collect();
        if entries.is_empty() {
            return;
        }

        warn!("closing {} connection(s)", entries.len());

        let grace = self.conf.shutdown_grace;
        let closing = entries.into_iter().map(|(name, entry)| async move {
            self.connector.close(entry.client, grace).await;
            info!("connection `{}` closed", name);
        });
        futures::future::join_all(closing).await;
    }

    fn install_signal_listener(self: &Arc<Self>) -> Result<(), Error> {
        if self.signals_installed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime available, termination signals will not close connections");
            self.signals_installed.store(false, Ordering::SeqCst);
            return Ok(());
        };

        let registry = Arc::downgrade(self);
        let installed = signals::spawn_listener(move |signal| {
            warn!("received termination signal {}", signal);
            if let Some(registry) = registry.upgrade() {
                runtime.block_on(registry.shutdown());
            }
        });

        if let Err(e) = installed {
            self.signals_installed.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        trace!("termination signal listener installed");
        Ok(())
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<C>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<C>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
