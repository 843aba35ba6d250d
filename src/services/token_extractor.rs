//! 从提交后的页面 URL 中提取 tracking token

/// 路径末段作为 token 的最小长度
pub const MIN_PATH_TOKEN_LEN: usize = 8;

/// 提取 token
///
/// 规则：
/// 1. URL 含 `token=` 时取最后一个 `token=` 之后的全部内容
/// 2. 否则取最后一个非空路径段，长度不少于 8 才算 token
/// 3. 都不满足时返回空串（视为提交失败）
pub fn extract_token(result_url: &str) -> String {
    if let Some(pos) = result_url.rfind("token=") {
        return result_url[pos + "token=".len()..].to_string();
    }

    let tail = result_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    if tail.chars().count() >= MIN_PATH_TOKEN_LEN {
        tail.to_string()
    } else {
        String::new()
    }
}
