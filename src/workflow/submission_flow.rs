//! 单条任务提交流程 - 流程层
//!
//! 核心职责：定义"一条对接任务"在门户表单上的完整提交协议
//!
//! 流程顺序：
//! 1. 打开门户（带超时，失败即终止）
//! 2. 上传受体并校验
//! 3. 解析配体：序列 / 文件
//! 4. 上传配体文件，或填写序列并选择 protein 类型
//! 5. 结合位点（可选，选项点击超时忽略）
//! 6. email / jobname（可选）
//! 7. 提交，等待页面跳转和网络静默，读取结果 URL
//! 8. 从 URL 提取 token
//! 9. 无论成败都关闭会话

use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{Config, FormSelectors};
use crate::error::{AppResult, PageError, SubmitError};
use crate::infrastructure::{PortalPage, SessionFactory};
use crate::models::{JobRecord, LigandPayload, ResultRecord};
use crate::services::resolve_ligand;

/// 序列模式下配体类型下拉框的取值
pub const LIGAND_TYPE_PROTEIN: &str = "protein";

/// 单条任务提交流程
///
/// - 不持有任何会话，会话由 [`SessionFactory`] 按任务创建
/// - 只依赖 [`PortalPage`] 能力，与具体浏览器引擎无关
/// - 单条任务的任何错误都在这里转换为失败结果
pub struct SubmissionFlow {
    portal_url: String,
    selectors: FormSelectors,
    navigation_timeout: Duration,
    option_click_timeout: Duration,
    network_idle: Duration,
}

impl SubmissionFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            portal_url: config.portal_url.clone(),
            selectors: config.selectors.clone(),
            navigation_timeout: config.navigation_timeout(),
            option_click_timeout: config.option_click_timeout(),
            network_idle: config.network_idle(),
        }
    }

    /// 提交一条任务，总是返回一条结果
    pub async fn submit(&self, sessions: &dyn SessionFactory, job: &JobRecord) -> ResultRecord {
        match self.submit_in_session(sessions, job).await {
            Ok(result_url) => {
                let record = ResultRecord::from_submission(job, result_url);
                if record.success {
                    info!("[行 {}] ✓ 提交成功，token: {}", job.index, record.token);
                } else {
                    warn!(
                        "[行 {}] ⚠️ 已提交但未能从 URL 提取 token: {}",
                        job.index, record.result_location
                    );
                }
                record
            }
            Err(e) => {
                error!("[行 {}] ❌ 提交失败: {}", job.index, e);
                ResultRecord::failure(job, &e)
            }
        }
    }

    /// 打开独立会话执行协议，结束后无条件关闭会话
    async fn submit_in_session(
        &self,
        sessions: &dyn SessionFactory,
        job: &JobRecord,
    ) -> AppResult<String> {
        let page = sessions.open_session().await?;
        let outcome = self.run(page.as_ref(), job).await;
        page.close().await;
        outcome
    }

    /// 在已打开的页面上执行表单协议，返回提交后的页面 URL
    pub async fn run(&self, page: &dyn PortalPage, job: &JobRecord) -> AppResult<String> {
        // ========== 1. 打开门户 ==========
        info!("[行 {}] 🌐 打开门户: {}", job.index, self.portal_url);
        page.goto(&self.portal_url, self.navigation_timeout)
            .await
            .map_err(|e| match e {
                PageError::Timeout { timeout, .. } => SubmitError::NavigationTimeout {
                    url: self.portal_url.clone(),
                    timeout,
                },
                other => other.into(),
            })?;

        // ========== 2. 受体 ==========
        if !job.receptor_reference.is_file() {
            return Err(SubmitError::ReceptorNotFound {
                row: job.index,
                path: job.receptor_reference.clone(),
            });
        }
        self.attach_verified(page, &self.selectors.receptor_upload, &job.receptor_reference)
            .await?;

        // ========== 3-4. 配体 ==========
        match resolve_ligand(job.index, &job.ligand_input)? {
            LigandPayload::File(path) => {
                debug!("[行 {}] 上传配体文件: {}", job.index, path.display());
                self.attach_verified(page, &self.selectors.ligand_upload, &path)
                    .await?;
            }
            LigandPayload::Sequence(sequence) => {
                debug!("[行 {}] 填写配体序列 ({} 字符)", job.index, sequence.len());
                page.fill(&self.selectors.ligand_sequence, &sequence).await?;
                page.select_option(&self.selectors.ligand_type, LIGAND_TYPE_PROTEIN)
                    .await?;
            }
        }

        // ========== 5. 结合位点 ==========
        if let Some(residues) = &job.binding_site_residues {
            self.fill_binding_site(page, job.index, residues).await?;
        }

        // ========== 6. email / jobname ==========
        if let Some(email) = &job.contact_email {
            page.fill(&self.selectors.email, email).await?;
        }
        if let Some(job_name) = &job.job_name {
            page.fill(&self.selectors.job_name, job_name).await?;
        }

        // ========== 7. 提交 ==========
        info!("[行 {}] 📤 提交表单...", job.index);
        page.click_and_wait_for_navigation(&self.selectors.submit, self.navigation_timeout)
            .await?;
        page.wait_for_network_idle(self.network_idle, self.navigation_timeout)
            .await?;

        let result_url = page.current_url().await?;
        debug!("[行 {}] 结果页: {}", job.index, result_url);
        Ok(result_url)
    }

    /// 上传文件并确认控件里确实有文件
    async fn attach_verified(
        &self,
        page: &dyn PortalPage,
        selector: &str,
        path: &Path,
    ) -> AppResult<()> {
        page.attach_file(selector, path).await?;
        if page.attached_file_count(selector).await? == 0 {
            return Err(SubmitError::AttachFailed {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    /// 选择"指定结合位点"并填写残基编号
    ///
    /// 选项可能已选中，或在不同版本门户里叫法不同：
    /// 找不到或点击超时都直接跳过，其他错误照常返回。
    async fn fill_binding_site(
        &self,
        page: &dyn PortalPage,
        row: usize,
        residues: &str,
    ) -> AppResult<()> {
        match page
            .click_within(&self.selectors.binding_site_option, self.option_click_timeout)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_absent_or_timeout() => {
                debug!("[行 {}] 跳过结合位点选项: {}", row, e);
            }
            Err(e) => return Err(e.into()),
        }
        page.fill(&self.selectors.binding_site_residues, residues)
            .await?;
        Ok(())
    }
}
