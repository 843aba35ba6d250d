//! 进度输出
//!
//! 每完成一条任务（无论成败）输出一行：
//! `{completed}/{total} | row {index} | {OK|FAIL} | {location or "-"}`

use crate::models::result::ResultRecord;

/// 进度统计
#[derive(Debug, Default)]
pub struct ProgressReporter {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 记录一条完成的结果并返回进度行
    pub fn record(&mut self, result: &ResultRecord) -> String {
        self.completed += 1;
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        progress_line(self.completed, self.total, result)
    }
}

pub fn progress_line(completed: usize, total: usize, result: &ResultRecord) -> String {
    let status = if result.success { "OK" } else { "FAIL" };
    let location = if result.success {
        result.result_location.as_str()
    } else {
        "-"
    };
    format!(
        "{}/{} | row {} | {:<4} | {}",
        completed, total, result.index, status, location
    )
}
