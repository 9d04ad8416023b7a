use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

/// 周期任务：一轮跑完再进入等待，轮与轮之间不重叠
#[async_trait]
pub trait PeriodicJob: Send {
    fn name(&self) -> &str;

    async fn run_cycle(&mut self) -> anyhow::Result<()>;

    /// 每轮结束、进入等待前调用
    fn after_cycle(&self, _interval: Duration) {}
}

pub struct TaskScheduler {
    periodic_tasks: HashMap<String, JoinHandle<()>>,
    shutdown_sender: broadcast::Sender<()>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        let (shutdown_sender, _) = broadcast::channel(16);
        Self {
            periodic_tasks: HashMap::new(),
            shutdown_sender,
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    pub fn add_periodic_task(&mut self, interval: Duration, mut job: Box<dyn PeriodicJob>) {
        let name = job.name().to_string();
        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            loop {
                // 关闭信号在执行期间到达时，会在本轮结束后的 recv 中立即取到
                if let Err(e) = job.run_cycle().await {
                    error!("[오류 발생] {}: {:#}", task_name, e);
                }
                job.after_cycle(interval);

                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = shutdown_receiver.recv() => {
                        info!("Periodic task {} is shutting down", task_name);
                        break;
                    }
                }
            }
        });
        self.periodic_tasks.insert(name, handle);
    }

    pub fn task_count(&self) -> usize {
        self.periodic_tasks.len()
    }

    pub async fn shutdown(&mut self) {
        // 发送关闭信号
        let _ = self.shutdown_sender.send(());

        // 等待所有任务完成当前一轮；任务 panic 时只记录，不影响其余任务退出
        for (name, handle) in self.periodic_tasks.drain() {
            if let Err(e) = handle.await {
                error!("Periodic task {} exited abnormally: {}", name, e);
            }
        }
    }
}
