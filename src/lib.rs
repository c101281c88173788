pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::queue::ProcessingQueue;

// Application state
pub struct AppState {
    pub config: config::Config,
    pub queue: ProcessingQueue,
}

impl AppState {
    /// Starts the processing queue; must run inside a tokio runtime.
    pub fn new(config: config::Config) -> Self {
        let queue = ProcessingQueue::start(config.queue_capacity);
        Self { config, queue }
    }
}
