use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::EventFrameNavigated;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::network_tracker::NetworkTracker;
use crate::config::Config;
use crate::error::{PageError, SubmitError};
use crate::infrastructure::{JsExecutor, PortalPage, SessionFactory};

/// 轮询网络状态的间隔
const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 无头浏览器会话工厂
///
/// 每次 `open_session` 启动一个独立的浏览器进程，使用独立的临时 profile 目录，
/// 会话之间不共享任何页面或 cookie。
pub struct ChromiumSessionFactory {
    chrome_executable: Option<PathBuf>,
    headless: bool,
    launched: AtomicUsize,
}

impl ChromiumSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            headless: config.headless,
            launched: AtomicUsize::new(0),
        }
    }

    /// 启动无头浏览器并打开空白页
    async fn launch(&self) -> Result<ChromiumSession, SubmitError> {
        let session_no = self.launched.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("🚀 启动浏览器会话 #{}", session_no);

        let profile = tempfile::Builder::new()
            .prefix("hdock-batch-")
            .tempdir()
            .map_err(|e| {
                SubmitError::SessionLaunch(format!("无法创建临时 profile 目录: {}", e))
            })?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .args(vec![
                "--disable-gpu",           // 无头模式下禁用 GPU
                "--no-sandbox",            // 容器内没有沙盒权限
                "--disable-dev-shm-usage", // 防止共享内存不足
            ]);
        builder = if self.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(executable) = &self.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            SubmitError::SessionLaunch(format!("配置无头浏览器失败: {}", e))
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            SubmitError::SessionLaunch(format!("启动无头浏览器失败: {}", e))
        })?;

        // 在后台处理浏览器事件，浏览器关闭后流结束
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP 事件处理出错: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                handler_task.abort();
                return Err(SubmitError::SessionLaunch(format!("创建页面失败: {}", e)));
            }
        };

        let network = match NetworkTracker::attach(&page, session_no).await {
            Ok(network) => network,
            Err(e) => {
                error!("订阅网络事件失败: {}", e);
                handler_task.abort();
                return Err(SubmitError::SessionLaunch(format!("订阅网络事件失败: {}", e)));
            }
        };

        info!("✅ 浏览器会话 #{} 已就绪", session_no);

        Ok(ChromiumSession {
            session_no,
            executor: JsExecutor::new(page),
            network,
            browser: Mutex::new(Some(browser)),
            handler_task,
            _profile: profile,
        })
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open_session(&self) -> Result<Box<dyn PortalPage>, SubmitError> {
        let session = self.launch().await?;
        Ok(Box::new(session))
    }
}

/// 一个浏览器进程 + 一个页面
pub struct ChromiumSession {
    session_no: usize,
    executor: JsExecutor,
    network: NetworkTracker,
    browser: Mutex<Option<Browser>>,
    handler_task: JoinHandle<()>,
    // 最后释放，浏览器退出后再删除 profile
    _profile: TempDir,
}

impl ChromiumSession {
    fn page(&self) -> &Page {
        self.executor.page()
    }

    async fn find(&self, selector: &str) -> Result<Element, PageError> {
        self.page().find_element(selector).await.map_err(|e| {
            debug!("查找元素 {} 失败: {}", selector, e);
            PageError::NotFound {
                selector: selector.to_string(),
            }
        })
    }
}

#[async_trait]
impl PortalPage for ChromiumSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError> {
        debug!("[会话 #{}] 导航到: {}", self.session_no, url);
        match tokio::time::timeout(timeout, self.page().goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(PageError::Timeout {
                action: format!("goto {}", url),
                timeout,
            }),
        }
    }

    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), PageError> {
        let element = self.find(selector).await?;
        let mut params = SetFileInputFilesParams::new(vec![path.to_string_lossy().into_owned()]);
        params.backend_node_id = Some(element.backend_node_id.clone());
        self.page().execute(params).await?;
        debug!(
            "[会话 #{}] 已上传 {} -> {}",
            self.session_no,
            path.display(),
            selector
        );
        Ok(())
    }

    async fn attached_file_count(&self, selector: &str) -> Result<usize, PageError> {
        self.executor.file_count(selector).await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        self.executor.set_value(selector, value).await
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), PageError> {
        self.executor.set_value(selector, value).await
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        let element = self.find(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn click_within(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        match tokio::time::timeout(timeout, self.click(selector)).await {
            Ok(result) => result,
            Err(_) => Err(PageError::Timeout {
                action: format!("click {}", selector),
                timeout,
            }),
        }
    }

    async fn click_and_wait_for_navigation(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        // 先订阅再点击，导航事件不会漏掉
        let mut navigated = self.page().event_listener::<EventFrameNavigated>().await?;
        self.click(selector).await?;

        let main_frame = async {
            while let Some(event) = navigated.next().await {
                if event.frame.parent_id.is_none() {
                    return Some(event.frame.url.clone());
                }
            }
            None
        };

        match tokio::time::timeout(timeout, main_frame).await {
            Ok(Some(url)) => {
                debug!("[会话 #{}] 主框架已跳转: {}", self.session_no, url);
                Ok(())
            }
            Ok(None) => Err(PageError::Cdp("页面事件流已关闭".to_string())),
            Err(_) => Err(PageError::Timeout {
                action: format!("navigation after clicking {}", selector),
                timeout,
            }),
        }
    }

    async fn wait_for_network_idle(
        &self,
        idle: Duration,
        timeout: Duration,
    ) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;

        // 没有进行中的请求且 idle 窗口内无活动，并且文档加载完成
        loop {
            if self.network.is_idle(idle) {
                match self.executor.ready_state().await {
                    Ok(state) if state == "complete" => return Ok(()),
                    Ok(state) => debug!("[会话 #{}] 文档状态: {}", self.session_no, state),
                    // 跳转过程中执行上下文会被销毁，稍后重试
                    Err(e) => debug!("[会话 #{}] 读取文档状态失败: {}", self.session_no, e),
                }
            }

            if Instant::now() >= deadline {
                warn!(
                    "[会话 #{}] 等待网络静默超时，仍有 {} 个请求未完成",
                    self.session_no,
                    self.network.pending()
                );
                return Err(PageError::Timeout {
                    action: "wait for network idle".to_string(),
                    timeout,
                });
            }
            sleep(NETWORK_POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.page().url().await?.unwrap_or_default())
    }

    async fn close(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("[会话 #{}] 关闭浏览器失败: {}", self.session_no, e);
            }
            if let Err(e) = browser.wait().await {
                debug!("[会话 #{}] 等待浏览器进程退出失败: {}", self.session_no, e);
            }
            debug!("[会话 #{}] 浏览器已关闭", self.session_no);
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
