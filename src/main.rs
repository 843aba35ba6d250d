use anyhow::Result;
use clap::Parser;
use hdock_batch_submit::utils::logging;
use hdock_batch_submit::{App, Config};
use std::path::PathBuf;

/// 批量向 HDOCK 提交对接任务，实时输出进度
#[derive(Parser, Debug)]
#[command(name = "hdock-batch", version)]
#[command(about = "Batch-submit to HDOCK with live progress.")]
struct Cli {
    /// 输入 CSV 文件
    csv: PathBuf,

    /// 运行日志目录（默认 ./hdock_logs）
    #[arg(long)]
    out: Option<PathBuf>,

    /// 同时运行的浏览器数量（默认 1）
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// TOML 配置文件
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 门户地址
    #[arg(long)]
    portal_url: Option<String>,

    /// Chrome / Chromium 可执行文件
    #[arg(long, env = "CHROME_EXECUTABLE")]
    chrome: Option<PathBuf>,

    /// 显示浏览器窗口
    #[arg(long)]
    headful: bool,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 配置优先级：命令行 > 配置文件 > 环境变量 > 默认值
    fn into_config(self) -> Result<(Config, PathBuf)> {
        let mut config = Config::from_env();
        if let Some(path) = &self.config {
            config = config.merge_file(path)?;
        }
        if let Some(out) = self.out {
            config.output_dir = out;
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent_jobs = jobs;
        }
        if let Some(url) = self.portal_url {
            config.portal_url = url;
        }
        if self.chrome.is_some() {
            config.chrome_executable = self.chrome;
        }
        if self.headful {
            config.headless = false;
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        Ok((config, self.csv))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let (config, csv) = Cli::parse().into_config()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config, csv).await?.run().await?;

    Ok(())
}
