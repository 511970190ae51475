//! Shared Redis connection.
//!
//! The connection is opened lazily on first use and reused for the lifetime
//! of the process. It is multiplexed, so callers receive cheap clones.

use log::*;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisResult};
use tokio::sync::OnceCell;

pub struct Cache {
    client: Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl Cache {
    /// Validates the URL without connecting.
    pub fn new(url: &str) -> RedisResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
            connection: OnceCell::new(),
        })
    }

    /// Returns the shared connection, connecting and verifying it with a
    /// PING the first time.
    pub async fn handle(&self) -> RedisResult<MultiplexedConnection> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let mut connection = self.client.get_multiplexed_tokio_connection().await?;
                let reply: String = redis::cmd("PING").query_async(&mut connection).await?;
                info!("Connected to Redis ({reply})");
                Ok::<_, redis::RedisError>(connection)
            })
            .await?;

        Ok(connection.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Drops the shared connection. A later `handle` reconnects.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            info!("Closed Redis connection");
        }
    }
}
