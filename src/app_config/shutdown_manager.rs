use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// 关闭回调函数
pub type ShutdownHook =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// 关闭配置
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// 总超时时间
    pub total_timeout: Duration,
    /// 单个回调的超时时间
    pub hook_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(30),
            hook_timeout: Duration::from_secs(20),
        }
    }
}

/// 优雅停止管理器
///
/// 收到 SIGINT/SIGTERM 后按注册顺序执行回调：先停调度器（等待当前周期跑完），再发送停止通知。
pub struct ShutdownManager {
    is_shutting_down: Arc<AtomicBool>,
    shutdown_hooks: RwLock<Vec<(String, ShutdownHook)>>,
    config: ShutdownConfig,
}

impl ShutdownManager {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            is_shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_hooks: RwLock::new(Vec::new()),
            config,
        }
    }

    pub fn new_default() -> Self {
        Self::new(ShutdownConfig::default())
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }

    /// 注册关闭回调
    pub async fn register_shutdown_hook<F, Fut>(&self, name: &str, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed_hook: ShutdownHook = Box::new(move || Box::pin(hook()));
        let mut hooks = self.shutdown_hooks.write().await;
        hooks.push((name.to_string(), boxed_hook));
        info!("停止回调已注册: {}", name);
    }

    /// 执行优雅关闭
    pub async fn shutdown(&self) -> Result<()> {
        if self
            .is_shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("停止流程已在执行，忽略重复请求");
            return Ok(());
        }

        info!("收到停止请求，依次执行停止回调（总超时 {:?}）", self.config.total_timeout);
        let start_time = Instant::now();

        match tokio::time::timeout(self.config.total_timeout, self.execute_shutdown_hooks()).await {
            Ok(()) => {
                info!("优雅关闭完成，耗时: {:?}", start_time.elapsed());
                Ok(())
            }
            Err(_) => {
                error!("关闭超时 ({:?})", self.config.total_timeout);
                Err(anyhow::anyhow!("关闭超时"))
            }
        }
    }

    async fn execute_shutdown_hooks(&self) {
        let hooks = self.shutdown_hooks.read().await;
        let hook_count = hooks.len();
        if hook_count == 0 {
            info!("无停止回调，直接退出");
            return;
        }

        for (index, (name, hook)) in hooks.iter().enumerate() {
            let hook_start = Instant::now();
            match tokio::time::timeout(self.config.hook_timeout, hook()).await {
                Ok(Ok(())) => {
                    info!(
                        "关闭回调 {}/{} [{}] 完成，耗时: {:?}",
                        index + 1,
                        hook_count,
                        name,
                        hook_start.elapsed()
                    );
                }
                // 单个回调失败不中断整个关闭过程
                Ok(Err(e)) => {
                    error!("关闭回调 {}/{} [{}] 失败: {}", index + 1, hook_count, name, e);
                }
                Err(_) => {
                    error!(
                        "关闭回调 {}/{} [{}] 超时 ({:?})",
                        index + 1,
                        hook_count,
                        name,
                        self.config.hook_timeout
                    );
                }
            }
        }
    }

    /// 等待关闭信号
    pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;

            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            Ok(name)
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("CTRL+C")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn test_config() -> ShutdownConfig {
        ShutdownConfig {
            total_timeout: Duration::from_secs(5),
            hook_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let manager = ShutdownManager::new(test_config());
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["scheduler", "notify"] {
            let order = order.clone();
            manager
                .register_shutdown_hook(name, move || {
                    let order = order.clone();
                    async move {
                        order.lock().unwrap().push(name);
                        Ok(())
                    }
                })
                .await;
        }

        assert!(manager.shutdown().await.is_ok());
        assert!(manager.is_shutting_down());
        assert_eq!(*order.lock().unwrap(), vec!["scheduler", "notify"]);
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_stop_others() {
        let manager = ShutdownManager::new(test_config());
        let executed = Arc::new(AtomicBool::new(false));

        manager
            .register_shutdown_hook("fail", || async { Err::<(), _>(anyhow::anyhow!("boom")) })
            .await;
        let flag = executed.clone();
        manager
            .register_shutdown_hook("after", move || {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::Release);
                    Ok(())
                }
            })
            .await;

        assert!(manager.shutdown().await.is_ok());
        assert!(executed.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_shutdown_with_timeout() {
        let manager = ShutdownManager::new(ShutdownConfig {
            total_timeout: Duration::from_millis(200),
            hook_timeout: Duration::from_secs(2),
        });
        manager
            .register_shutdown_hook("slow", || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;

        assert!(manager.shutdown().await.is_err());
        // 第二次调用直接返回
        assert!(manager.shutdown().await.is_ok());
    }
}
