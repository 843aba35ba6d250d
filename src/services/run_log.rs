//! 运行日志写入服务 - 业务能力层
//!
//! 只负责把单条结果追加到 run-log.csv，不关心流程

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::result::{ResultRecord, RESULT_HEADER};

/// 运行日志写入服务
///
/// 职责：
/// - 以追加方式打开日志文件
/// - 表头只写一次（文件为空时）
/// - 每写一行立即 flush，中途退出也不丢已完成的结果
pub struct RunLogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    header_written: bool,
}

impl RunLogWriter {
    /// 打开（或创建）日志文件
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("无法打开运行日志: {}", path.display()))?;

        // 续写已有日志时不重复表头
        let header_written = file
            .metadata()
            .with_context(|| format!("无法读取运行日志信息: {}", path.display()))?
            .len()
            > 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        Ok(Self {
            path,
            writer,
            header_written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条结果
    pub fn append(&mut self, record: &ResultRecord) -> Result<()> {
        debug!(
            "写入运行日志: 行 {} | ok={} | token={}",
            record.index, record.success, record.token
        );

        if !self.header_written {
            self.writer.write_record(RESULT_HEADER)?;
            self.header_written = true;
        }
        self.writer
            .serialize(record)
            .with_context(|| format!("写入运行日志失败: {}", self.path.display()))?;
        self.writer.flush()?;

        Ok(())
    }
}
