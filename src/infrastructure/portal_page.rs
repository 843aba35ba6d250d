//! 门户页面能力接口 - 基础设施层
//!
//! 流程层只依赖这里的 trait，不认识具体的浏览器引擎。

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::{PageError, SubmitError};

/// 单个浏览器会话中的一个页面
///
/// 职责：
/// - 暴露导航 / 上传 / 填写 / 点击 / 读取 URL 等能力
/// - 不认识 JobRecord
/// - 不处理业务流程
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// 导航到 `url`，超过 `timeout` 返回 [`PageError::Timeout`]
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// 把本地文件挂到上传控件
    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), PageError>;

    /// 上传控件当前报告的文件数
    async fn attached_file_count(&self, selector: &str) -> Result<usize, PageError>;

    /// 覆盖输入框内容
    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), PageError>;

    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// 带超时的点击，超时返回 [`PageError::Timeout`]
    async fn click_within(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// 点击并等待由此触发的主框架导航，超过 `timeout` 返回 [`PageError::Timeout`]
    async fn click_and_wait_for_navigation(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), PageError>;

    /// 等待没有进行中的请求，且 `idle` 窗口内没有新的网络活动，最长等待 `timeout`
    async fn wait_for_network_idle(&self, idle: Duration, timeout: Duration)
        -> Result<(), PageError>;

    async fn current_url(&self) -> Result<String, PageError>;

    /// 关闭会话，重复调用无副作用
    async fn close(&self);
}

/// 会话工厂：每条任务一个全新的、隔离的会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn PortalPage>, SubmitError>;
}
