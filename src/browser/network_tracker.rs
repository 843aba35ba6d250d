//! 网络请求跟踪
//!
//! 会话启动时订阅 CDP Network 事件，记录尚未结束的请求。
//! "网络静默" = 没有进行中的请求，且距最后一次网络活动超过 idle 窗口。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::PageError;

/// 网络事件
#[derive(Debug, Clone, PartialEq, Eq)]
enum NetworkEvent {
    Started(String),
    Settled(String),
}

/// 进行中的请求集合与最后活动时间
#[derive(Debug)]
pub struct InFlight {
    requests: HashSet<String>,
    last_activity: Instant,
}

impl InFlight {
    pub fn new(now: Instant) -> Self {
        Self {
            requests: HashSet::new(),
            last_activity: now,
        }
    }

    /// 请求发出（重定向沿用同一个 id）
    pub fn started(&mut self, request_id: &str, now: Instant) {
        self.requests.insert(request_id.to_string());
        self.last_activity = now;
    }

    /// 请求完成或失败
    pub fn settled(&mut self, request_id: &str, now: Instant) {
        if self.requests.remove(request_id) {
            self.last_activity = now;
        }
    }

    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    pub fn is_idle(&self, idle: Duration, now: Instant) -> bool {
        self.requests.is_empty() && now.saturating_duration_since(self.last_activity) >= idle
    }
}

/// 单个页面的网络跟踪器
pub struct NetworkTracker {
    state: Arc<Mutex<InFlight>>,
    task: JoinHandle<()>,
}

impl NetworkTracker {
    /// 启用 Network 域并开始订阅事件
    pub async fn attach(page: &Page, session_no: usize) -> Result<Self, PageError> {
        page.execute(EnableParams::default()).await?;

        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await?
            .map(|e| NetworkEvent::Started(e.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await?
            .map(|e| NetworkEvent::Settled(e.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await?
            .map(|e| NetworkEvent::Settled(e.request_id.inner().clone()));

        let mut events: BoxStream<'static, NetworkEvent> =
            stream::select_all(vec![started.boxed(), finished.boxed(), failed.boxed()]).boxed();

        let state = Arc::new(Mutex::new(InFlight::new(Instant::now())));
        let shared = state.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let now = Instant::now();
                let mut in_flight = lock(&shared);
                match &event {
                    NetworkEvent::Started(id) => in_flight.started(id, now),
                    NetworkEvent::Settled(id) => in_flight.settled(id, now),
                }
            }
            debug!("[会话 #{}] 网络事件流结束", session_no);
        });

        Ok(Self { state, task })
    }

    /// 当前进行中的请求数
    pub fn pending(&self) -> usize {
        lock(&self.state).pending()
    }

    pub fn is_idle(&self, idle: Duration) -> bool {
        lock(&self.state).is_idle(idle, Instant::now())
    }
}

impl Drop for NetworkTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// 事件任务 panic 时状态仍可读
fn lock(state: &Mutex<InFlight>) -> MutexGuard<'_, InFlight> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_millis(500);

    #[test]
    fn test_pending_request_blocks_idle() {
        let t0 = Instant::now();
        let mut in_flight = InFlight::new(t0);
        in_flight.started("upload", t0);

        // 上传请求长时间未返回，不算静默
        assert!(!in_flight.is_idle(IDLE, t0 + Duration::from_secs(30)));
        assert_eq!(in_flight.pending(), 1);

        let done = t0 + Duration::from_secs(31);
        in_flight.settled("upload", done);
        assert!(!in_flight.is_idle(IDLE, done + Duration::from_millis(100)));
        assert!(in_flight.is_idle(IDLE, done + IDLE));
    }

    #[test]
    fn test_redirects_and_unknown_ids() {
        let t0 = Instant::now();
        let mut in_flight = InFlight::new(t0);
        in_flight.started("r1", t0);
        in_flight.started("r1", t0 + Duration::from_millis(10));
        assert_eq!(in_flight.pending(), 1);

        // 订阅前发出的请求结束时不影响计数和活动时间
        in_flight.settled("before-subscribe", t0 + Duration::from_secs(5));
        assert_eq!(in_flight.pending(), 1);

        in_flight.settled("r1", t0 + Duration::from_millis(20));
        assert!(in_flight.is_idle(IDLE, t0 + Duration::from_millis(520)));
    }
}
