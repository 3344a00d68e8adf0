use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionState};
use crate::dispatch::DispatchTable;
use crate::error::Result;
use crate::marshal::{MainThread, MainThreadHandle};

/// Owns the I/O runtime, the connection and the main-thread queue.
///
/// Network completions run on the runtime's worker threads; handlers only
/// ever run inside [`update`](Self::update), on the caller's thread.
pub struct Client<S: 'static> {
    connection: Connection,
    main_thread: MainThread<S>,
    runtime: Runtime,
}

impl<S: 'static> Client<S> {
    pub fn new(config: ClientConfig, table: DispatchTable<S>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("exodus-io")
            .enable_all()
            .build()?;

        let main_thread = MainThread::new();
        let handle = main_thread.handle();
        let table = Arc::new(table);

        let connection =
            Connection::new(runtime.handle().clone(), config, move |session, _, message| {
                let table = Arc::clone(&table);
                handle.execute(move |state| {
                    if session.is_current() {
                        table.dispatch_or_drop(state, message);
                    } else {
                        log::debug!(
                            "Dropping message {} from closed session {}",
                            message.type_id(),
                            session.generation()
                        );
                    }
                });
            });

        Ok(Self {
            connection,
            main_thread,
            runtime,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connect(&self, host: &str) -> Result<()> {
        self.connection.connect(host)
    }

    pub fn disconnect(&self) -> bool {
        self.connection.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Messages and actions waiting for the next [`update`](Self::update).
    pub fn pending(&self) -> usize {
        self.main_thread.pending()
    }

    pub fn main_thread(&self) -> MainThreadHandle<S> {
        self.main_thread.handle()
    }

    /// Runs every handler queued since the last call. Call once per tick.
    pub fn update(&mut self, state: &mut S) -> usize {
        self.main_thread.update(state)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl<S: 'static> Drop for Client<S> {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::<()>::new(ClientConfig::default(), DispatchTable::new());
        assert!(client.is_ok());

        let mut client = client.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.update(&mut ()), 0);
    }

    #[test]
    fn test_queued_actions_run_on_update() {
        let mut client = Client::<Vec<u8>>::new(ClientConfig::default(), DispatchTable::new())
            .unwrap();
        let handle = client.main_thread();
        client
            .runtime()
            .block_on(async move { handle.execute(|log| log.push(1)) });

        let mut log = Vec::new();
        assert_eq!(client.update(&mut log), 1);
        assert_eq!(log, vec![1]);
    }
}
