//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量提交和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 加载全部任务（`Vec<JobRecord>`）
//! - 按完成顺序收集结果，输出进度并写运行日志
//! - 输出全局统计信息
//!
//! ### `limiter` - 并发限制器
//! - 限制同时存在的浏览器会话数（Semaphore）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<JobRecord>)
//!     ↓
//! workflow::SubmissionFlow (处理单条 JobRecord)
//!     ↓
//! services (能力层：ligand / token / run log / progress)
//!     ↓
//! infrastructure (基础设施：PortalPage / SessionFactory)
//! ```

pub mod batch_processor;
pub mod limiter;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
pub use limiter::ConcurrencyLimiter;
