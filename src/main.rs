use hub::{Hub, HubConfig};
use jobs::tasks::{AddTask, ADD};
use jobs::{JobServer, Signature};
use log::*;
use migration::{Migrator, MigratorTrait};
use serde_json::json;
use service::cache::Cache;
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting chat hub [{}] in {} mode",
        env!("CARGO_PKG_VERSION"),
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(db.as_ref(), None).await {
        error!("Failed to apply database migrations: {e}");
        std::process::exit(1);
    }

    let mut cache = match Cache::new(config.redis_url()) {
        Ok(cache) => cache,
        Err(e) => {
            error!("Invalid Redis URL: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = cache.handle().await {
        error!("Failed to connect to Redis: {e}");
        std::process::exit(1);
    }

    let (jobs, worker) = JobServer::new(config.job_queue_capacity);
    jobs.register_task(ADD, Arc::new(AddTask));
    let concurrency = config.job_concurrency;
    tokio::spawn(async move { worker.launch("worker-local", concurrency).await });

    submit_smoke_test(&jobs);

    let hub = Hub::spawn(HubConfig {
        queue_capacity: config.outbound_queue_capacity,
        ping_interval: config.ping_interval(),
        read_timeout: config.read_timeout(),
    });

    let service_state = service::AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, hub, jobs);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
    }

    cache.close();
    match Arc::try_unwrap(db) {
        Ok(db) => {
            if let Err(e) = db.close().await {
                warn!("Failed to close database connection: {e}");
            }
        }
        Err(_) => debug!("Database connection still shared at shutdown"),
    }
    info!("Chat hub stopped");
}

/// Submits `add(661, 5)` so a broken worker shows up in the start-up log.
fn submit_smoke_test(jobs: &JobServer) {
    let handle = match jobs.submit(Signature::new(ADD, vec![json!(661), json!(5)])) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to submit start-up job: {e}");
            std::process::exit(1);
        }
    };
    info!("Start-up job {} submitted", handle.id);

    tokio::spawn(async move {
        match tokio::time::timeout(Duration::from_secs(20), handle.result()).await {
            Ok(Ok(sum)) => info!("Start-up job returned {sum}"),
            Ok(Err(e)) => error!("Start-up job failed: {e}"),
            Err(_) => warn!("Start-up job did not finish within 20s"),
        }
    });
}
