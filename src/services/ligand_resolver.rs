//! 配体解析服务 - 业务能力层
//!
//! 把原始配体文本判定为内联序列或文件路径

use crate::error::SubmitError;
use crate::models::job::{expand_path, LigandPayload};
use tracing::debug;

/// 看起来像序列文本：以 `>` 开头或包含换行
pub fn looks_like_sequence(raw: &str) -> bool {
    raw.starts_with('>') || raw.contains('\n')
}

/// 解析配体
///
/// 优先级（不可调换）：
/// 1. 像序列且至少两行 → 内联序列（即使同名文件存在）
/// 2. 路径指向存在的文件 → 文件
/// 3. 文件不存在但像序列 → 内联序列
/// 4. 否则 → `LigandNotFound`
pub fn resolve_ligand(row: usize, raw: &str) -> Result<LigandPayload, SubmitError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SubmitError::LigandMissing { row });
    }

    let is_sequence_text = looks_like_sequence(raw);
    if is_sequence_text && raw.lines().count() >= 2 {
        debug!("[行 {}] 配体按多行序列处理", row);
        return Ok(LigandPayload::Sequence(raw.to_string()));
    }

    let candidate = expand_path(raw);
    if candidate.is_file() {
        debug!("[行 {}] 配体按文件处理: {}", row, candidate.display());
        Ok(LigandPayload::File(candidate))
    } else if is_sequence_text {
        debug!("[行 {}] 配体文件不存在，按序列处理", row);
        Ok(LigandPayload::Sequence(raw.to_string()))
    } else {
        Err(SubmitError::LigandNotFound {
            row,
            path: candidate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_multiline_marker_text_beats_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let same_named = dir.path().join(">lig\nMKVLA");
        fs::write(&same_named, "ATOM").unwrap();
        let text = same_named.to_str().unwrap();
        assert!(same_named.is_file());

        // 即使存在与文本同名的文件，多行文本也按序列处理
        match resolve_ligand(1, text).unwrap() {
            LigandPayload::Sequence(seq) => assert_eq!(seq, text),
            other => panic!("期望序列，实际: {:?}", other),
        }
    }

    #[test]
    fn test_existing_path_is_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ligand.pdb");
        fs::write(&path, "ATOM").unwrap();

        let payload = resolve_ligand(1, path.to_str().unwrap()).unwrap();
        assert_eq!(payload, LigandPayload::File(path));
    }

    #[test]
    fn test_single_line_marker_falls_back_to_sequence() {
        let payload = resolve_ligand(1, ">not-a-file-MKVLA").unwrap();
        assert_eq!(
            payload,
            LigandPayload::Sequence(">not-a-file-MKVLA".to_string())
        );
    }

    #[test]
    fn test_missing_plain_path_is_fatal() {
        let err = resolve_ligand(4, "/nowhere/ligand.pdb").unwrap_err();
        assert_eq!(err.code(), "ligand_not_found");
        assert!(err.reason().contains("/nowhere/ligand.pdb"));
    }

    #[test]
    fn test_blank_ligand() {
        let err = resolve_ligand(2, "   ").unwrap_err();
        assert!(matches!(err, SubmitError::LigandMissing { row: 2 }));
    }
}
