use serde::{Serialize, Serializer};

use crate::error::SubmitError;
use crate::models::job::JobRecord;
use crate::services::token_extractor::extract_token;

/// 提交成功但没拿到 token 时的错误标签
pub const SUBMISSION_FAILED: &str = "submission_failed";

/// 运行日志的列名，与 [`ResultRecord`] 的序列化顺序一致
pub const RESULT_HEADER: [&str; 7] = [
    "row",
    "timestamp",
    "jobname",
    "token",
    "result_url",
    "ok",
    "error",
];

/// 一条任务的提交结果
///
/// 不变量：`success == !token.is_empty()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "row")]
    pub index: usize,
    pub timestamp: String,
    #[serde(rename = "jobname")]
    pub job_name: String,
    pub token: String,
    #[serde(rename = "result_url")]
    pub result_location: String,
    #[serde(rename = "ok", serialize_with = "serialize_ok_flag")]
    pub success: bool,
    pub error: String,
}

impl ResultRecord {
    /// 由提交后的页面 URL 生成结果
    pub fn from_submission(job: &JobRecord, result_url: String) -> Self {
        let token = extract_token(&result_url);
        let success = !token.is_empty();
        Self {
            index: job.index,
            timestamp: now_timestamp(),
            job_name: job.job_name_or_empty().to_string(),
            token,
            result_location: result_url,
            success,
            error: if success {
                String::new()
            } else {
                SUBMISSION_FAILED.to_string()
            },
        }
    }

    /// 由单条记录的致命错误生成失败结果
    pub fn failure(job: &JobRecord, err: &SubmitError) -> Self {
        Self {
            index: job.index,
            timestamp: now_timestamp(),
            job_name: job.job_name_or_empty().to_string(),
            token: String::new(),
            result_location: String::new(),
            success: false,
            error: err.reason(),
        }
    }
}

/// ok 列沿用已有日志的写法：`True` / `False`
fn serialize_ok_flag<S: Serializer>(ok: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *ok { "True" } else { "False" })
}

fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
