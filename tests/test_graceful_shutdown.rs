mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::RecordingNotifier;
use tokio::sync::Mutex;
use upbit_watch::app_config::shutdown_manager::{ShutdownConfig, ShutdownManager};
use upbit_watch::job::{PeriodicJob, TaskScheduler};
use upbit_watch::trading::notification::Notifier;

/// 每轮耗时 200ms 的任务，用来确认关闭会等当前一轮跑完
struct SlowJob {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl PeriodicJob for SlowJob {
    fn name(&self) -> &str {
        "slow"
    }

    async fn run_cycle(&mut self) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_stop_scheduler_then_notify() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let mut scheduler = TaskScheduler::new();
    scheduler.add_periodic_task(
        Duration::from_secs(3600),
        Box::new(SlowJob {
            started: started.clone(),
            finished: finished.clone(),
        }),
    );
    let scheduler = Arc::new(Mutex::new(scheduler));
    let notifier = Arc::new(RecordingNotifier::default());

    let manager = ShutdownManager::new(ShutdownConfig {
        total_timeout: Duration::from_secs(5),
        hook_timeout: Duration::from_secs(2),
    });

    let hook_scheduler = scheduler.clone();
    manager
        .register_shutdown_hook("scheduler", move || {
            let scheduler = hook_scheduler.clone();
            async move {
                scheduler.lock().await.shutdown().await;
                Ok(())
            }
        })
        .await;

    let hook_notifier = notifier.clone();
    let hook_finished = finished.clone();
    manager
        .register_shutdown_hook("stop_notification", move || {
            let notifier = hook_notifier.clone();
            let finished = hook_finished.clone();
            async move {
                let text = format!("🔴 stopped after {} cycle(s)", finished.load(Ordering::SeqCst));
                notifier.notify(&text).await;
                Ok(())
            }
        })
        .await;

    // 让第一轮开始执行
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);

    assert!(manager.shutdown().await.is_ok());
    assert!(manager.is_shutting_down());
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.messages(), vec!["🔴 stopped after 1 cycle(s)".to_string()]);
}

#[tokio::test]
async fn test_hook_timeout_does_not_block_later_hooks() {
    let manager = ShutdownManager::new(ShutdownConfig {
        total_timeout: Duration::from_secs(5),
        hook_timeout: Duration::from_millis(100),
    });
    let notifier = Arc::new(RecordingNotifier::default());

    manager
        .register_shutdown_hook("stuck", || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
    let hook_notifier = notifier.clone();
    manager
        .register_shutdown_hook("stop_notification", move || {
            let notifier = hook_notifier.clone();
            async move {
                notifier.notify("🔴 종료").await;
                Ok(())
            }
        })
        .await;

    assert!(manager.shutdown().await.is_ok());
    assert_eq!(notifier.messages(), vec!["🔴 종료".to_string()]);
}
