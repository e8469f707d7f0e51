// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use outreach::application::use_cases::import_dm_jobs::ImportDmJobsUseCase;
use outreach::config::settings::{DriverKind, Settings};
use outreach::domain::services::action_driver::ActionDriver;
use outreach::domain::services::clock::SystemClock;
use outreach::domain::services::job_service::JobService;
use outreach::domain::services::network_rotator::{NetworkIdentityRotator, RotationTiming};
use outreach::infrastructure::database::connection;
use outreach::infrastructure::drivers::remote::RemoteActionDriver;
use outreach::infrastructure::drivers::simulated::SimulatedActionDriver;
use outreach::infrastructure::repositories::job_log_repo_impl::JobLogRepositoryImpl;
use outreach::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use outreach::infrastructure::session::file_session_store::FileSessionStore;
use outreach::infrastructure::tether::adb_device::AdbTetherDevice;
use outreach::infrastructure::tether::ip_probe::HttpIdentityProbe;
use outreach::presentation::routes;
use outreach::queue::scheduler::JobScheduler;
use outreach::workers::handlers::HandlerRegistry;
use outreach::workers::JobExecutor;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use migration::{Migrator, MigratorTrait};
use outreach::utils::telemetry;

/// 按配置选择动作驱动
fn build_driver(settings: &Settings) -> anyhow::Result<Arc<dyn ActionDriver>> {
    let driver: Arc<dyn ActionDriver> = match settings.driver.kind {
        DriverKind::Simulated => Arc::new(SimulatedActionDriver::new()),
        DriverKind::Remote => {
            let url = settings
                .driver
                .remote_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("driver.remote_url is required"))?;
            Arc::new(RemoteActionDriver::new(
                url,
                Duration::from_secs(settings.driver.request_timeout_secs),
            )?)
        }
    };
    Ok(driver)
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Arc::new(Settings::new()?);

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.logging);
    info!("Starting outreach...");
    outreach::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize components
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let log_repo = Arc::new(JobLogRepositoryImpl::new(db.clone()));
    let job_service = Arc::new(JobService::new(job_repo.clone(), log_repo.clone()));
    let import_use_case = Arc::new(ImportDmJobsUseCase::new(
        job_service.clone(),
        settings.import.utc_offset_minutes,
    ));

    let rotator = Arc::new(NetworkIdentityRotator::new(
        Arc::new(AdbTetherDevice::new(&settings.tether)),
        Arc::new(HttpIdentityProbe::from_settings(&settings.tether)?),
        RotationTiming::from(&settings.tether),
    ));

    let driver = build_driver(&settings)?;
    info!("Using {} action driver", driver.name());
    let sessions = Arc::new(FileSessionStore::new(&settings.session.cookie_dir));

    let mut executor = JobExecutor::new(
        job_repo.clone(),
        log_repo.clone(),
        driver,
        sessions,
        HandlerRegistry::with_defaults(),
        settings.delay.policy(),
    );
    if settings.tether.enabled {
        executor = executor.with_rotation(
            rotator.clone(),
            settings.executor.rotate_before_dispatch.iter().copied(),
        );
        info!(
            "Network rotation enabled for {:?}",
            settings.executor.rotate_before_dispatch
        );
    }

    // 5. Recover interrupted jobs, then start polling
    let scheduler = JobScheduler::new(
        job_repo.clone(),
        log_repo.clone(),
        Arc::new(executor),
        Arc::new(SystemClock),
        Duration::from_secs(settings.scheduler.tick_interval_secs),
    );
    let recovered = scheduler.recover().await?;
    info!("Crash recovery finished, {} jobs marked as failed", recovered);

    if settings.scheduler.enabled {
        scheduler.start();
    } else {
        info!("Scheduler disabled by configuration");
    }

    // 6. Start HTTP server
    let app = routes::routes()
        .layer(Extension(job_service))
        .layer(Extension(import_use_case))
        .layer(Extension(rotator))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
