//! 测试用的门户页面：按脚本返回结果，并记录每次调用

#![allow(dead_code)]

use async_trait::async_trait;
use hdock_batch_submit::{JobRecord, PageError, PortalPage, SessionFactory, SubmitError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const TOKEN_URL: &str = "http://hdock.phys.hust.edu.cn/data/AB12CD34XY";

/// "指定结合位点" 选项点击的异常方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickFailure {
    Timeout,
    Broken,
}

/// 页面行为脚本
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub result_url: String,
    pub navigation_times_out: bool,
    /// 页面上不存在的选择器
    pub missing: Vec<String>,
    pub option_click: Option<ClickFailure>,
    /// 上传后文件数仍为 0 的控件
    pub dropped_uploads: Vec<String>,
    /// 受体文件名包含该标记时，等待网络静默要多花的时间
    pub slow_receptors: Vec<(String, Duration)>,
    /// 导航耗时
    pub navigation_delay: Duration,
    /// 填写该值时 panic
    pub panic_on_fill: Option<String>,
    /// 点击提交后多久跳转到结果页
    pub submit_navigation_delay: Duration,
    /// 点击提交后页面不跳转
    pub submit_never_navigates: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            result_url: TOKEN_URL.to_string(),
            navigation_times_out: false,
            missing: Vec::new(),
            option_click: None,
            dropped_uploads: Vec::new(),
            slow_receptors: Vec::new(),
            navigation_delay: Duration::ZERO,
            panic_on_fill: None,
            submit_navigation_delay: Duration::ZERO,
            submit_never_navigates: false,
        }
    }
}

/// 会话统计：打开 / 关闭次数、同时在线峰值、每个会话的起止时间
#[derive(Debug, Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
    pub spans: Mutex<Vec<(Instant, Instant)>>,
}

impl SessionStats {
    /// 根据起止时间计算任一时刻同时在线的最大会话数
    pub fn max_overlap(&self) -> usize {
        let spans = self.spans.lock().unwrap();
        spans
            .iter()
            .map(|(start, _)| {
                spans
                    .iter()
                    .filter(|(s, e)| s <= start && start < e)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

pub struct MockPage {
    behavior: MockBehavior,
    stats: Option<Arc<SessionStats>>,
    opened_at: Instant,
    calls: Mutex<Vec<String>>,
    attached: Mutex<HashMap<String, PathBuf>>,
    /// 当前文档地址（提交跳转落地前）
    location: Mutex<String>,
    submitted_at: Mutex<Option<Instant>>,
    closed: AtomicBool,
}

impl MockPage {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            stats: None,
            opened_at: Instant::now(),
            calls: Mutex::new(Vec::new()),
            attached: Mutex::new(HashMap::new()),
            location: Mutex::new("about:blank".to_string()),
            submitted_at: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    fn with_stats(behavior: MockBehavior, stats: Arc<SessionStats>) -> Self {
        Self {
            stats: Some(stats),
            ..Self::new(behavior)
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_call(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, selector: &str) -> Result<(), PageError> {
        if self.behavior.missing.iter().any(|m| m == selector) {
            return Err(PageError::NotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    fn receptor_delay(&self) -> Duration {
        let attached = self.attached.lock().unwrap();
        self.behavior
            .slow_receptors
            .iter()
            .filter(|(marker, _)| {
                attached
                    .values()
                    .any(|p| p.to_string_lossy().contains(marker.as_str()))
            })
            .map(|(_, delay)| *delay)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl PortalPage for MockPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError> {
        self.record(format!("goto {}", url));
        if !self.behavior.navigation_delay.is_zero() {
            tokio::time::sleep(self.behavior.navigation_delay).await;
        }
        if self.behavior.navigation_times_out {
            return Err(PageError::Timeout {
                action: format!("goto {}", url),
                timeout,
            });
        }
        *self.location.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), PageError> {
        self.check(selector)?;
        self.record(format!("attach {} {}", selector, path.display()));
        self.attached
            .lock()
            .unwrap()
            .insert(selector.to_string(), path.to_path_buf());
        Ok(())
    }

    async fn attached_file_count(&self, selector: &str) -> Result<usize, PageError> {
        self.check(selector)?;
        if self.behavior.dropped_uploads.iter().any(|s| s == selector) {
            return Ok(0);
        }
        Ok(usize::from(self.attached.lock().unwrap().contains_key(selector)))
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        if self.behavior.panic_on_fill.as_deref() == Some(value) {
            panic!("scripted panic while filling {}", selector);
        }
        self.check(selector)?;
        self.record(format!("fill {}={}", selector, value));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), PageError> {
        self.check(selector)?;
        self.record(format!("select {}={}", selector, value));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.check(selector)?;
        self.record(format!("click {}", selector));
        Ok(())
    }

    async fn click_within(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        match self.behavior.option_click {
            Some(ClickFailure::Timeout) => Err(PageError::Timeout {
                action: format!("click {}", selector),
                timeout,
            }),
            Some(ClickFailure::Broken) => Err(PageError::Cdp("target closed".to_string())),
            None => self.click(selector).await,
        }
    }

    async fn click_and_wait_for_navigation(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        self.click(selector).await?;
        if self.behavior.submit_never_navigates {
            return Err(PageError::Timeout {
                action: format!("navigation after clicking {}", selector),
                timeout,
            });
        }
        *self.submitted_at.lock().unwrap() = Some(Instant::now());
        tokio::time::sleep(self.behavior.submit_navigation_delay).await;
        Ok(())
    }

    async fn wait_for_network_idle(
        &self,
        _idle: Duration,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        self.record("wait idle".to_string());
        let delay = self.receptor_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// 跳转落地之前仍是提交前的页面
    async fn current_url(&self) -> Result<String, PageError> {
        let landed = self
            .submitted_at
            .lock()
            .unwrap()
            .is_some_and(|at| at.elapsed() >= self.behavior.submit_navigation_delay);
        if landed {
            Ok(self.behavior.result_url.clone())
        } else {
            Ok(self.location.lock().unwrap().clone())
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(stats) = &self.stats {
            stats.closed.fetch_add(1, Ordering::SeqCst);
            stats.active.fetch_sub(1, Ordering::SeqCst);
            stats
                .spans
                .lock()
                .unwrap()
                .push((self.opened_at, Instant::now()));
        }
    }
}

/// 测试用会话工厂
pub struct MockSessions {
    pub behavior: MockBehavior,
    pub stats: Arc<SessionStats>,
}

impl MockSessions {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            stats: Arc::new(SessionStats::default()),
        }
    }
}

#[async_trait]
impl SessionFactory for MockSessions {
    async fn open_session(&self) -> Result<Box<dyn PortalPage>, SubmitError> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(MockPage::with_stats(
            self.behavior.clone(),
            self.stats.clone(),
        )))
    }
}

/// 在目录中创建一个受体 / 配体文件
pub fn structure_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "ATOM      1  N   MET A   1      11.104  13.207  10.000\n").unwrap();
    path
}

pub fn job(index: usize, receptor: &Path, ligand: &str) -> JobRecord {
    JobRecord {
        index,
        receptor_reference: receptor.to_path_buf(),
        ligand_input: ligand.to_string(),
        binding_site_residues: None,
        job_name: None,
        contact_email: None,
    }
}
