use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{BlToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const DIALOGUE_FILE_NAME: &str = "dialogue.json";
pub const CONFIG_FILE_NAME: &str = "runner.toml";
pub const TESTCASE_FILE_NAME: &str = "testcase.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSource {
    pub dialogue_json: String,
    pub config_toml: Option<String>,
}

pub fn read_demo_source(demo_dir: &Path) -> Result<DemoSource, BlToolError> {
    let dialogue_path = demo_dir.join(DIALOGUE_FILE_NAME);
    if !dialogue_path.is_file() {
        return Err(BlToolError::DialogueMissing {
            path: demo_dir.to_path_buf(),
        });
    }
    let dialogue_json = read_file(&dialogue_path)?;

    let config_path = demo_dir.join(CONFIG_FILE_NAME);
    let config_toml = if config_path.is_file() {
        Some(read_file(&config_path)?)
    } else {
        None
    };

    Ok(DemoSource {
        dialogue_json,
        config_toml,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, BlToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| BlToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(BlToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Every directory under `root` holding a `testcase.json`, sorted.
pub fn collect_case_dirs(root: &Path) -> Result<Vec<PathBuf>, BlToolError> {
    let mut dirs = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE_NAME)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    dirs.sort();

    if dirs.is_empty() {
        return Err(BlToolError::CasesEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(dirs)
}

fn read_file(path: &Path) -> Result<String, BlToolError> {
    fs::read_to_string(path).map_err(|source| BlToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod source_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("bl-tool-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn read_demo_source_requires_dialogue_and_reads_optional_config() {
        let root = temp_dir("demo-source");
        fs::create_dir_all(&root).expect("root should exist");
        let missing = read_demo_source(&root).expect_err("dialogue is required");
        assert!(matches!(missing, BlToolError::DialogueMissing { .. }));

        write_file(&root.join(DIALOGUE_FILE_NAME), "{}");
        let source = read_demo_source(&root).expect("source should load");
        assert_eq!(source.dialogue_json, "{}");
        assert_eq!(source.config_toml, None);

        write_file(&root.join(CONFIG_FILE_NAME), "max_auto_advance = 3\n");
        let source = read_demo_source(&root).expect("source should load");
        assert_eq!(source.config_toml.as_deref(), Some("max_auto_advance = 3\n"));
    }

    #[test]
    fn read_test_case_checks_parse_and_schema() {
        let root = temp_dir("case-read");
        let missing = read_test_case(&root.join("missing.json")).expect_err("missing file");
        assert!(matches!(missing, BlToolError::ReadFile { .. }));

        let broken = root.join("broken.json");
        write_file(&broken, "{");
        let error = read_test_case(&broken).expect_err("broken json");
        assert!(matches!(error, BlToolError::ParseCase { .. }));

        let wrong = root.join("wrong.json");
        write_file(&wrong, r#"{"schemaVersion":"other"}"#);
        let error = read_test_case(&wrong).expect_err("wrong schema");
        assert!(matches!(error, BlToolError::InvalidSchemaVersion { .. }));

        let good = root.join("good.json");
        write_file(&good, r#"{"schemaVersion":"bl-tool-case.v1"}"#);
        assert!(read_test_case(&good).is_ok());
    }

    #[test]
    fn collect_case_dirs_finds_nested_cases() {
        let root = temp_dir("case-dirs");
        write_file(&root.join("b").join(TESTCASE_FILE_NAME), "{}");
        write_file(&root.join("a").join(TESTCASE_FILE_NAME), "{}");
        write_file(&root.join("c").join(DIALOGUE_FILE_NAME), "{}");

        let dirs = collect_case_dirs(&root).expect("cases should be found");
        assert_eq!(dirs, vec![root.join("a"), root.join("b")]);

        let empty = temp_dir("case-dirs-empty");
        fs::create_dir_all(&empty).expect("root should exist");
        let error = collect_case_dirs(&empty).expect_err("no cases");
        assert!(matches!(error, BlToolError::CasesEmpty { .. }));
    }
}
