//! 错误类型
//!
//! 三类错误对应三种传播范围：
//! - `InputError`：输入表格结构错误，整次运行终止
//! - `SubmitError`：单条记录的致命错误，只影响该记录
//! - `PageError`：页面能力层的原始结果，由流程层决定是否忽略

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 输入文件错误（整次运行级别）
#[derive(Debug, Error)]
pub enum InputError {
    /// 读取输入文件失败
    #[error("无法读取输入文件 {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// CSV 行解析失败
    #[error("CSV 第 {line} 行解析失败: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },
    /// 缺少受体列
    #[error("CSV requires '{column}' column.")]
    MissingReceptorColumn { column: &'static str },
    /// 缺少任何一个配体列
    #[error("CSV needs a ligand column (sequence text or file path).")]
    MissingLigandColumn,
}

/// 页面能力层错误
#[derive(Debug, Error)]
pub enum PageError {
    /// 找不到选择器对应的元素
    #[error("找不到元素: {selector}")]
    NotFound { selector: String },
    /// 操作超时
    #[error("操作超时 ({action}, {timeout:?})")]
    Timeout { action: String, timeout: Duration },
    /// CDP / 浏览器错误
    #[error("浏览器错误: {0}")]
    Cdp(String),
}

impl PageError {
    /// 可选步骤可以忽略的结果：元素不存在或超时
    pub fn is_absent_or_timeout(&self) -> bool {
        matches!(self, PageError::NotFound { .. } | PageError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for PageError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        PageError::Cdp(err.to_string())
    }
}

/// 单条提交记录的致命错误
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 受体文件不存在
    #[error("[row {row}] receptor_pdb not found: {}", .path.display())]
    ReceptorNotFound { row: usize, path: PathBuf },
    /// 配体列为空
    #[error("[row {row}] Provide a ligand sequence or file path.")]
    LigandMissing { row: usize },
    /// 配体既不是序列也不是存在的文件
    #[error("[row {row}] ligand file not found: {}", .path.display())]
    LigandNotFound { row: usize, path: PathBuf },
    /// 文件没有挂载到上传控件
    #[error("File did not attach to {selector}")]
    AttachFailed { selector: String },
    /// 门户页面加载超时
    #[error("导航到 {url} 超时 ({timeout:?})")]
    NavigationTimeout { url: String, timeout: Duration },
    /// 启动浏览器会话失败
    #[error("启动浏览器会话失败: {0}")]
    SessionLaunch(String),
    /// 页面操作失败
    #[error(transparent)]
    Page(#[from] PageError),
    /// 并发限制器已关闭
    #[error("并发限制器已关闭")]
    LimiterClosed,
    /// 提交任务内部 panic
    #[error("提交任务异常终止: {0}")]
    Panicked(String),
}

impl SubmitError {
    /// 稳定的错误代码，写入运行日志的 error 列
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::ReceptorNotFound { .. } => "receptor_not_found",
            SubmitError::LigandMissing { .. } => "ligand_missing",
            SubmitError::LigandNotFound { .. } => "ligand_not_found",
            SubmitError::AttachFailed { .. } => "attachment_failed",
            SubmitError::NavigationTimeout { .. } => "navigation_timeout",
            SubmitError::SessionLaunch(_) => "browser_launch_failed",
            SubmitError::Page(PageError::NotFound { .. }) => "element_not_found",
            SubmitError::Page(PageError::Timeout { .. }) => "page_timeout",
            SubmitError::Page(PageError::Cdp(_)) => "browser_error",
            SubmitError::LimiterClosed => "limiter_closed",
            SubmitError::Panicked(_) => "driver_panicked",
        }
    }

    /// 日志里的机器可读原因：`{code}: {detail}`
    pub fn reason(&self) -> String {
        format!("{}: {}", self.code(), self)
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, SubmitError>;
