use crate::error::InputError;
use crate::models::job::{expand_path, JobRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// 受体列
pub const RECEPTOR_COLUMN: &str = "receptor_pdb";

/// 配体列（按优先级），第一个非空的生效
pub const LIGAND_COLUMNS: [&str; 7] = [
    "ligand_fasta",
    "ligand_path",
    "ligand_seq",
    "ligand_sequence",
    "ligand_pdb",
    "ligand_file",
    "ligand",
];

const SITE_COLUMNS: [&str; 1] = ["receptor_site_residues"];
const JOB_NAME_COLUMNS: [&str; 2] = ["jobname", "name"];
const EMAIL_COLUMNS: [&str; 1] = ["email"];

/// 从 CSV 文件加载全部任务
pub fn load_jobs(csv_path: &Path) -> Result<Vec<JobRecord>, InputError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .map_err(|source| InputError::Unreadable {
            path: csv_path.to_path_buf(),
            source,
        })?;
    collect_jobs(reader)
}

/// 从任意输入流解析任务
pub fn parse_jobs<R: Read>(input: R) -> Result<Vec<JobRecord>, InputError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    collect_jobs(reader)
}

fn collect_jobs<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<JobRecord>, InputError> {
    let headers = reader
        .headers()
        .map_err(|source| InputError::Malformed { line: 1, source })?
        .clone();

    // 列名不区分大小写；重名时保留第一个
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        columns.entry(name.trim().to_lowercase()).or_insert(i);
    }

    if !columns.contains_key(RECEPTOR_COLUMN) {
        return Err(InputError::MissingReceptorColumn {
            column: RECEPTOR_COLUMN,
        });
    }
    if !LIGAND_COLUMNS.iter().any(|c| columns.contains_key(*c)) {
        return Err(InputError::MissingLigandColumn);
    }

    let mut jobs = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let record = row.map_err(|source| InputError::Malformed {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        let row = Row {
            columns: &columns,
            record: &record,
        };

        jobs.push(JobRecord {
            index: i + 1,
            receptor_reference: expand_path(row.get(RECEPTOR_COLUMN)),
            ligand_input: row.pick(&LIGAND_COLUMNS).unwrap_or_default(),
            binding_site_residues: row.pick(&SITE_COLUMNS),
            job_name: row.pick(&JOB_NAME_COLUMNS),
            contact_email: row.pick(&EMAIL_COLUMNS),
        });
    }

    Ok(jobs)
}

/// 单行视图：按小写列名取值，缺失的单元格视为空串
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn pick(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .map(|c| self.get(c))
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_in_input_order() {
        let input = "Receptor_PDB,Ligand_Seq,JobName,Email\n\
                     a.pdb,MKV,first,x@y.org\n\
                     b.pdb,,second,\n";
        let jobs = parse_jobs(input.as_bytes()).unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].index, 1);
        assert!(jobs[0].receptor_reference.ends_with("a.pdb"));
        assert_eq!(jobs[0].ligand_input, "MKV");
        assert_eq!(jobs[0].job_name.as_deref(), Some("first"));
        assert_eq!(jobs[0].contact_email.as_deref(), Some("x@y.org"));

        assert_eq!(jobs[1].index, 2);
        assert_eq!(jobs[1].ligand_input, "");
        assert_eq!(jobs[1].contact_email, None);
    }

    #[test]
    fn test_ligand_column_priority() {
        let input = "receptor_pdb,ligand,ligand_path,ligand_fasta\n\
                     r.pdb,generic.pdb,path.pdb,\n";
        let jobs = parse_jobs(input.as_bytes()).unwrap();
        // ligand_fasta 为空，下一个优先的是 ligand_path
        assert_eq!(jobs[0].ligand_input, "path.pdb");
    }

    #[test]
    fn test_multiline_sequence_cell() {
        let input = "receptor_pdb,ligand_fasta,name\n\
                     r.pdb,\">lig\nMKVLA\",fallback-name\n";
        let jobs = parse_jobs(input.as_bytes()).unwrap();
        assert_eq!(jobs[0].ligand_input, ">lig\nMKVLA");
        assert_eq!(jobs[0].job_name.as_deref(), Some("fallback-name"));
    }

    #[test]
    fn test_short_rows_default_to_empty() {
        let input = "receptor_pdb,ligand_pdb,receptor_site_residues\nr.pdb\n";
        let jobs = parse_jobs(input.as_bytes()).unwrap();
        assert_eq!(jobs[0].ligand_input, "");
        assert_eq!(jobs[0].binding_site_residues, None);
    }

    #[test]
    fn test_missing_receptor_column() {
        let err = parse_jobs("ligand_pdb\nl.pdb\n".as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::MissingReceptorColumn { .. }));
        assert_eq!(err.to_string(), "CSV requires 'receptor_pdb' column.");
    }

    #[test]
    fn test_missing_ligand_column() {
        let err = parse_jobs("receptor_pdb,notes\nr.pdb,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::MissingLigandColumn));
    }

    #[test]
    fn test_load_jobs_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_jobs(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, InputError::Unreadable { .. }));
    }
}
