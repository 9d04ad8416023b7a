pub mod messages;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

pub use telegram::TelegramNotifier;

/// 消息通知接口
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<()>;

    /// 尽力发送：失败只记日志，不向上抛出，也不重试
    async fn notify(&self, text: &str) {
        if let Err(e) = self.send_message(text).await {
            error!("[텔레그램 전송 실패] {}", e);
        }
    }
}
