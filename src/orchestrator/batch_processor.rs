//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量提交和结果落盘。
//!
//! ## 核心功能
//!
//! 1. **一次性加载**：先把全部输入行转换为 `JobRecord`，表格结构错误在启动浏览器前暴露
//! 2. **并发控制**：`ConcurrencyLimiter` 限制同时存在的浏览器会话数
//! 3. **完成顺序消费**：`FuturesUnordered` 按完成先后产出结果，而不是行号顺序
//! 4. **流式落盘**：每完成一条立即输出进度行并追加到 run-log.csv
//! 5. **失败隔离**：单条任务的错误和 panic 都转换为失败结果，不中断整次运行

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::browser::ChromiumSessionFactory;
use crate::config::Config;
use crate::error::SubmitError;
use crate::infrastructure::SessionFactory;
use crate::models::{JobRecord, ResultRecord};
use crate::orchestrator::limiter::ConcurrencyLimiter;
use crate::services::{ProgressReporter, RunLogWriter};
use crate::utils::logging::{log_jobs_loaded, log_startup, print_final_stats};
use crate::workflow::SubmissionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    input_csv: PathBuf,
    sessions: Arc<dyn SessionFactory>,
}

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub log_file: PathBuf,
}

impl App {
    /// 初始化应用（使用无头 Chromium）
    pub async fn initialize(config: Config, input_csv: impl Into<PathBuf>) -> Result<Self> {
        let input_csv = input_csv.into();
        log_startup(&config, &input_csv);

        let sessions = Arc::new(ChromiumSessionFactory::new(&config));
        Ok(Self::with_sessions(config, input_csv, sessions))
    }

    /// 使用自定义会话工厂创建应用
    pub fn with_sessions(
        config: Config,
        input_csv: impl Into<PathBuf>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            input_csv: input_csv.into(),
            sessions,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        // 表格结构错误直接返回，不启动任何浏览器
        let jobs = self.load_jobs()?;

        let log_file = self.prepare_output_dir()?;
        let mut run_log = RunLogWriter::open(&log_file)?;

        if jobs.is_empty() {
            warn!("⚠️ 输入表格没有任何任务行");
        }
        log_jobs_loaded(jobs.len(), self.config.concurrency());

        let progress = self.process_all_jobs(&jobs, &mut run_log).await?;

        println!("Finished. Log saved to {}", log_file.display());
        print_final_stats(progress.succeeded, progress.failed, progress.total, &log_file);

        Ok(RunSummary {
            total: progress.total,
            succeeded: progress.succeeded,
            failed: progress.failed,
            log_file,
        })
    }

    /// 加载任务
    fn load_jobs(&self) -> Result<Vec<JobRecord>> {
        info!("📁 正在读取任务表: {}", self.input_csv.display());
        let jobs = crate::models::load_jobs(&self.input_csv)?;
        info!("✓ 共 {} 条任务", jobs.len());
        Ok(jobs)
    }

    /// 创建输出目录，返回运行日志路径
    fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
        Ok(self.config.log_file_path())
    }

    /// 提交所有任务，按完成顺序输出进度并写日志
    async fn process_all_jobs(
        &self,
        jobs: &[JobRecord],
        run_log: &mut RunLogWriter,
    ) -> Result<ProgressReporter> {
        let limiter = ConcurrencyLimiter::new(self.config.concurrency());
        let flow = SubmissionFlow::new(&self.config);
        let sessions = self.sessions.as_ref();
        let mut progress = ProgressReporter::new(jobs.len());

        // 全部任务一次性建好，由限制器决定何时真正开始
        let mut pending: FuturesUnordered<_> = jobs
            .iter()
            .map(|job| submit_guarded(&flow, &limiter, sessions, job))
            .collect();

        while let Some(record) = pending.next().await {
            println!("{}", progress.record(&record));
            run_log.append(&record)?;
        }

        Ok(progress)
    }
}

/// 占用一个并发槽位执行单条任务；panic 也转换为失败结果
async fn submit_guarded(
    flow: &SubmissionFlow,
    limiter: &ConcurrencyLimiter,
    sessions: &dyn SessionFactory,
    job: &JobRecord,
) -> ResultRecord {
    let _permit = match limiter.acquire().await {
        Ok(permit) => permit,
        Err(e) => return ResultRecord::failure(job, &e),
    };

    match AssertUnwindSafe(flow.submit(sessions, job))
        .catch_unwind()
        .await
    {
        Ok(record) => record,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("[行 {}] ❌ 提交任务异常终止: {}", job.index, message);
            ResultRecord::failure(job, &SubmitError::Panicked(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
