use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::SubmitError;

/// 并发限制器：同一时刻最多 `max` 个浏览器会话
///
/// 许可在 [`SemaphorePermit`] 被 drop 时归还，
/// 提交流程无论成功、失败还是 panic 都会释放槽位。
pub struct ConcurrencyLimiter {
    semaphore: Semaphore,
    max: usize,
}

impl ConcurrencyLimiter {
    /// `max` 为 0 时按 1 处理
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Semaphore::new(max),
            max,
        }
    }

    /// 等待空闲槽位
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, SubmitError> {
        // 信号量从不 close，AcquireError 实际不会出现
        self.semaphore
            .acquire()
            .await
            .map_err(|_| SubmitError::LimiterClosed)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// 当前空闲槽位数
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(1)
    }
}
