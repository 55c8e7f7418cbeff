use mongodb::options::{Acknowledgment, ClientOptions, ServerApi, ServerApiVersion, WriteConcern};
use std::time::Duration;

use crate::params;

/// Write acknowledgement level requested for write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAck {
    /// Acknowledgement from the given number of nodes (`0` disables it).
    Nodes(u32),
    Majority,
    /// A custom write concern tag set name.
    Tag(String),
}

impl From<&WriteAck> for Acknowledgment {
    fn from(value: &WriteAck) -> Self {
        match value {
            WriteAck::Nodes(n) => Acknowledgment::Nodes(*n),
            WriteAck::Majority => Acknowledgment::Majority,
            WriteAck::Tag(tag) => Acknowledgment::Custom(tag.clone()),
        }
    }
}

/// Caller overrides used when opening a connection.
///
/// Every field left to `None` resolves, in order, to the value found in the
/// connection string and then to the crate default (primary acknowledgement,
/// journal confirmation, no stable API pinning).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectOptions {
    pub write_ack: Option<WriteAck>,
    pub journal: Option<bool>,
    /// Pin the connection to stable API version 1.
    pub stable_api: Option<bool>,
    pub app_name: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_ack(mut self, ack: WriteAck) -> Self {
        self.write_ack = Some(ack);
        self
    }

    pub fn journal(mut self, journal: bool) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn stable_api(mut self, enabled: bool) -> Self {
        self.stable_api = Some(enabled);
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    /// Resolves the write concern against the one parsed from the connection string.
    pub fn write_concern(&self, from_uri: Option<WriteConcern>) -> WriteConcern {
        let mut wc = from_uri.unwrap_or_default();

        wc.w = self
            .write_ack
            .as_ref()
            .map(Acknowledgment::from)
            .or(wc.w)
            .or(Some(Acknowledgment::Nodes(params::DEFAULT_WRITE_ACK_NODES)));

        wc.journal = self
            .journal
            .or(wc.journal)
            .or(Some(params::DEFAULT_JOURNAL));

        wc
    }

    pub(crate) fn apply(&self, options: &mut ClientOptions) {
        options.write_concern = Some(self.write_concern(options.write_concern.take()));

        if let Some(name) = &self.app_name {
            options.app_name = Some(name.clone());
        }
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }
        if self.stable_api == Some(true) {
            options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        }
    }
}
