use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 门户表单控件选择器
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormSelectors {
    /// 受体文件上传控件
    pub receptor_upload: String,
    /// 配体文件上传控件
    pub ligand_upload: String,
    /// 配体序列文本框
    pub ligand_sequence: String,
    /// 配体类型下拉框
    pub ligand_type: String,
    /// "指定结合位点" 选项
    pub binding_site_option: String,
    /// 结合位点残基编号输入框
    pub binding_site_residues: String,
    pub email: String,
    pub job_name: String,
    /// 提交按钮
    pub submit: String,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            receptor_upload: "#pdbfile1".to_string(),
            ligand_upload: "#pdbfile2".to_string(),
            ligand_sequence: "#fastaseq2".to_string(),
            ligand_type: "#ligtyp".to_string(),
            binding_site_option: "#option1".to_string(),
            binding_site_residues: "input[name=sitenum1]".to_string(),
            email: "#emailaddress".to_string(),
            job_name: "input[name=jobname]".to_string(),
            submit: "input[name=upload]".to_string(),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时运行的浏览器会话数量
    pub max_concurrent_jobs: usize,
    /// 门户地址
    pub portal_url: String,
    /// 首次导航超时（秒）
    pub navigation_timeout_secs: u64,
    /// 点击"指定结合位点"选项的超时（毫秒）
    pub option_click_timeout_ms: u64,
    /// 网络静默窗口（毫秒）
    pub network_idle_ms: u64,
    /// 运行日志目录
    pub output_dir: PathBuf,
    /// 运行日志文件名
    pub log_file_name: String,
    /// 浏览器可执行文件，为空时由 chromiumoxide 自动探测
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub selectors: FormSelectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            portal_url: "http://hdock.phys.hust.edu.cn/".to_string(),
            navigation_timeout_secs: 90,
            option_click_timeout_ms: 5_000,
            network_idle_ms: 500,
            output_dir: PathBuf::from("./hdock_logs"),
            log_file_name: "run-log.csv".to_string(),
            chrome_executable: None,
            headless: true,
            verbose_logging: false,
            selectors: FormSelectors::default(),
        }
    }
}

/// TOML 配置文件，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    max_concurrent_jobs: Option<usize>,
    portal_url: Option<String>,
    navigation_timeout_secs: Option<u64>,
    option_click_timeout_ms: Option<u64>,
    network_idle_ms: Option<u64>,
    output_dir: Option<PathBuf>,
    log_file_name: Option<String>,
    chrome_executable: Option<PathBuf>,
    headless: Option<bool>,
    verbose_logging: Option<bool>,
    selectors: Option<FormSelectors>,
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS")
                .unwrap_or(default.max_concurrent_jobs),
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            navigation_timeout_secs: env_parse("NAVIGATION_TIMEOUT_SECS")
                .unwrap_or(default.navigation_timeout_secs),
            option_click_timeout_ms: env_parse("OPTION_CLICK_TIMEOUT_MS")
                .unwrap_or(default.option_click_timeout_ms),
            network_idle_ms: env_parse("NETWORK_IDLE_MS").unwrap_or(default.network_idle_ms),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),
            log_file_name: default.log_file_name,
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .map(PathBuf::from)
                .or(default.chrome_executable),
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            selectors: default.selectors,
        }
    }

    /// 用 TOML 文件中出现的字段覆盖当前配置
    pub fn merge_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let file: FileConfig = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;

        if let Some(v) = file.max_concurrent_jobs {
            self.max_concurrent_jobs = v;
        }
        if let Some(v) = file.portal_url {
            self.portal_url = v;
        }
        if let Some(v) = file.navigation_timeout_secs {
            self.navigation_timeout_secs = v;
        }
        if let Some(v) = file.option_click_timeout_ms {
            self.option_click_timeout_ms = v;
        }
        if let Some(v) = file.network_idle_ms {
            self.network_idle_ms = v;
        }
        if let Some(v) = file.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = file.log_file_name {
            self.log_file_name = v;
        }
        if file.chrome_executable.is_some() {
            self.chrome_executable = file.chrome_executable;
        }
        if let Some(v) = file.headless {
            self.headless = v;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        if let Some(v) = file.selectors {
            self.selectors = v;
        }
        Ok(self)
    }

    /// 实际使用的并发数，0 视为 1
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_jobs.max(1)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn option_click_timeout(&self) -> Duration {
        Duration::from_millis(self.option_click_timeout_ms)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    /// 运行日志完整路径
    pub fn log_file_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file_name)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
