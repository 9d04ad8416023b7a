use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tokio::sync::Mutex;
use tracing::{error, info};

use upbit_watch::app_config::log::setup_logging;
use upbit_watch::app_config::shutdown_manager::ShutdownManager;
use upbit_watch::app_config::{AppConfig, TelegramConfig};
use upbit_watch::job::list_job::{watch_list_status, LIST_JOB_LABEL, LIST_JOB_TITLE};
use upbit_watch::job::market_job::{MARKET_JOB_LABEL, MARKET_JOB_TITLE};
use upbit_watch::job::{ListJob, MarketJob, PeriodicJob, TaskScheduler};
use upbit_watch::time_util::now_local;
use upbit_watch::trading::cache::MarketDirectoryCache;
use upbit_watch::trading::notification::{messages, Notifier, TelegramNotifier};
use upbit_watch::trading::upbit::market::{fetch_single_price, MarketDataSource};
use upbit_watch::trading::upbit::UpbitClient;

#[derive(Parser)]
#[command(name = "upbit_watch")]
#[command(about = "Upbit KRW market monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the market-wide change statistics loop
    Market,
    /// Run the watch-list rule loop
    List,
    /// Print the watch-list status once
    Status,
    /// Look up the current price of one symbol
    Price {
        /// Korean name, English name, symbol or market code
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guards = setup_logging()?;
    let cli = Cli::parse();

    let config = fatal_on_error(AppConfig::from_env())?;
    let source: Arc<dyn MarketDataSource> = Arc::new(UpbitClient::new());

    match cli.command {
        Commands::Market => {
            let notifier = telegram_notifier()?;
            let job = MarketJob::new(source, Arc::clone(&notifier), &config);
            run_daemon(
                MARKET_JOB_LABEL,
                MARKET_JOB_TITLE,
                config.market_interval,
                Box::new(job),
                notifier,
            )
            .await
        }
        Commands::List => {
            let notifier = telegram_notifier()?;
            let job = ListJob::new(source, Arc::clone(&notifier), &config);
            run_daemon(
                LIST_JOB_LABEL,
                LIST_JOB_TITLE,
                config.list_interval,
                Box::new(job),
                notifier,
            )
            .await
        }
        Commands::Status => {
            let mut cache = MarketDirectoryCache::new(config.market_cache_ttl);
            let status =
                watch_list_status(config.list_file.as_deref(), &mut cache, source.as_ref()).await?;
            println!("{}", status.message());
            Ok(())
        }
        Commands::Price { name } => {
            let mut cache = MarketDirectoryCache::new(config.market_cache_ttl);
            let directory = cache.get_directory(source.as_ref()).await?;
            let market = directory
                .lookup
                .resolve(&name)
                .ok_or_else(|| anyhow!("마켓 매핑 실패: {}", name))?;
            let price = fetch_single_price(source.as_ref(), market).await?;
            println!("{} ({}): {}원", name, market, messages::format_won(price));
            Ok(())
        }
    }
}

fn fatal_on_error<T>(result: upbit_watch::error::AppResult<T>) -> Result<T> {
    result.map_err(|e| {
        error!("启动失败: {}", e);
        e.into()
    })
}

/// 只有常驻命令需要推送凭据
fn telegram_notifier() -> Result<Arc<dyn Notifier>> {
    let telegram = fatal_on_error(TelegramConfig::from_env())?;
    Ok(Arc::new(TelegramNotifier::new(&telegram)))
}

/// 常驻运行：启动通知 → 调度 → 等待信号 → 停调度器 → 停止通知
async fn run_daemon(
    label: &'static str,
    title: &str,
    interval: Duration,
    job: Box<dyn PeriodicJob>,
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    notifier
        .notify(&messages::started(label, title, &now_local()))
        .await;
    info!("[시작] {} 시작, 주기 {}초", label, interval.as_secs());

    let mut scheduler = TaskScheduler::new();
    scheduler.add_periodic_task(interval, job);
    let scheduler = Arc::new(Mutex::new(scheduler));

    let manager = ShutdownManager::new_default();

    let hook_scheduler = Arc::clone(&scheduler);
    manager
        .register_shutdown_hook("scheduler", move || {
            let scheduler = Arc::clone(&hook_scheduler);
            async move {
                scheduler.lock().await.shutdown().await;
                Ok(())
            }
        })
        .await;

    let hook_notifier = Arc::clone(&notifier);
    manager
        .register_shutdown_hook("stop_notification", move || {
            let notifier = Arc::clone(&hook_notifier);
            async move {
                notifier
                    .notify(&messages::stopped(label, &now_local()))
                    .await;
                Ok(())
            }
        })
        .await;

    let signal = ShutdownManager::wait_for_shutdown_signal().await?;
    info!("收到 {} 信号，开始停止", signal);
    if let Err(e) = manager.shutdown().await {
        error!("优雅关闭失败: {}", e);
    }
    Ok(())
}
