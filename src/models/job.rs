use std::path::PathBuf;

/// 一条对接任务（对应输入表格的一行）
///
/// 加载后不再修改；配体在提交时才解析为 [`LigandPayload`]，
/// 因为文件是否存在要以提交那一刻为准。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// 行号（从 1 开始）
    pub index: usize,
    /// 受体结构文件（已展开 `~` 并转为绝对路径）
    pub receptor_reference: PathBuf,
    /// 配体原始文本：序列或文件路径
    pub ligand_input: String,
    /// 结合位点残基列表
    pub binding_site_residues: Option<String>,
    pub job_name: Option<String>,
    pub contact_email: Option<String>,
}

impl JobRecord {
    /// 日志里使用的任务名，未填写时为空串
    pub fn job_name_or_empty(&self) -> &str {
        self.job_name.as_deref().unwrap_or("")
    }
}

/// 解析后的配体：内联序列与文件二选一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LigandPayload {
    /// 内联序列（FASTA 文本，可能多行）
    Sequence(String),
    /// 配体结构文件
    File(PathBuf),
}

/// 展开开头的 `~` 并转为绝对路径
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_home(raw);
    std::path::absolute(&expanded).unwrap_or(expanded)
}

fn expand_home(raw: &str) -> PathBuf {
    let Some(rest) = raw.strip_prefix('~') else {
        return PathBuf::from(raw);
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        // `~user/...` 不展开
        return PathBuf::from(raw);
    }
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(raw),
    }
}
