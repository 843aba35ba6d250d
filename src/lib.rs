//! # HDOCK Batch Submit
//!
//! 通过无头浏览器批量向 HDOCK 门户提交分子对接任务，并把 tracking token 记录到运行日志
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PortalPage` / `SessionFactory` - 页面能力接口，与浏览器引擎无关
//! - `browser/` - 基于 chromiumoxide 的实现，每条任务一个独立的浏览器进程
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条任务
//! - `ligand_resolver` - 配体序列 / 文件判定
//! - `token_extractor` - 从结果 URL 提取 token
//! - `RunLogWriter` - 追加写 run-log.csv
//! - `ProgressReporter` - 进度行
//!
//! ### ③ 流程层（Workflow）
//! - `SubmissionFlow` - 一条任务的完整表单提交协议
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 加载任务、并发调度、按完成顺序落盘
//! - `orchestrator/limiter` - 并发限制器
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::ChromiumSessionFactory;
pub use config::{Config, FormSelectors};
pub use error::{AppResult, InputError, PageError, SubmitError};
pub use infrastructure::{PortalPage, SessionFactory};
pub use models::{JobRecord, LigandPayload, ResultRecord};
pub use orchestrator::{App, ConcurrencyLimiter, RunSummary};
pub use workflow::SubmissionFlow;
