use std::fs;
use std::path::{Path, PathBuf};

use bl_api::{load_runner_config, parse_dialogue_json};
use bl_core::{DialogueError, RunnerConfig};
use walkdir::WalkDir;

use crate::{map_cli_config_read, map_cli_dialogue_read, map_cli_source_path, LoadedDialogue};

pub(crate) const DIALOGUE_FILE_NAME: &str = "dialogue.json";
pub(crate) const DIALOGUE_FILE_SUFFIX: &str = ".dialogue.json";

pub(crate) fn load_dialogue(
    dialogue_path: &str,
    config_path: Option<&str>,
) -> Result<LoadedDialogue, DialogueError> {
    let path = resolve_file(dialogue_path, "CLI_DIALOGUE_NOT_FOUND")?;
    let source = fs::read_to_string(&path).map_err(map_cli_dialogue_read)?;
    let dialogue = parse_dialogue_json(&source)?;

    let (config_path, config) = match config_path {
        Some(raw) => {
            let path = resolve_file(raw, "CLI_CONFIG_NOT_FOUND")?;
            let text = fs::read_to_string(&path).map_err(map_cli_config_read)?;
            (
                Some(path.to_string_lossy().to_string()),
                load_runner_config(&text)?,
            )
        }
        None => (None, RunnerConfig::default()),
    };

    Ok(LoadedDialogue {
        path: path.to_string_lossy().to_string(),
        config_path,
        source,
        dialogue,
        config,
    })
}

pub(crate) fn resolve_path(raw: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

fn resolve_file(raw: &str, missing_code: &'static str) -> Result<PathBuf, DialogueError> {
    let absolute = resolve_path(raw)?;
    if !absolute.exists() {
        return Err(DialogueError::validation(
            missing_code,
            format!("File does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(DialogueError::validation(
            "CLI_SOURCE_NOT_FILE",
            format!("Path is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

/// A single file is returned as-is; a directory is searched for
/// `dialogue.json` and `*.dialogue.json` files.
pub(crate) fn collect_dialogue_files(raw: &str) -> Result<Vec<PathBuf>, DialogueError> {
    let root = resolve_path(raw)?;
    if !root.exists() {
        return Err(DialogueError::validation(
            "CLI_SOURCE_NOT_FOUND",
            format!("Path does not exist: {}", root.display()),
        ));
    }
    if root.is_file() {
        return Ok(vec![root]);
    }

    let mut files = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_dialogue_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    files.sort();

    if files.is_empty() {
        return Err(DialogueError::validation(
            "CLI_SOURCE_EMPTY",
            format!(
                "No {} or *{} files under {}",
                DIALOGUE_FILE_NAME,
                DIALOGUE_FILE_SUFFIX,
                root.display()
            ),
        ));
    }
    Ok(files)
}

fn is_dialogue_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name == DIALOGUE_FILE_NAME || name.ends_with(DIALOGUE_FILE_SUFFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn load_dialogue_reads_dialogue_and_optional_config() {
        let root = temp_path("load-dialogue");
        let dialogue_path = root.join("dialogue.json");
        let config_path = root.join("runner.toml");
        write_file(&dialogue_path, GREETING_JSON);
        write_file(&config_path, "[game_flags]\nn = \"Bob\"\n");

        let loaded = load_dialogue(
            dialogue_path.to_string_lossy().as_ref(),
            Some(config_path.to_string_lossy().as_ref()),
        )
        .expect("dialogue should load");
        assert_eq!(loaded.dialogue.id, "t");
        assert!(Path::new(&loaded.path).is_absolute());
        assert!(loaded.config_path.is_some());
        assert!(loaded.config.game_flags.contains_key("n"));

        let without_config =
            load_dialogue(dialogue_path.to_string_lossy().as_ref(), None).expect("load");
        assert!(without_config.config.game_flags.is_empty());
    }

    #[test]
    fn load_dialogue_reports_missing_and_invalid_sources() {
        let root = temp_path("load-dialogue-errors");
        let missing = load_dialogue(root.join("nope.json").to_string_lossy().as_ref(), None)
            .expect_err("missing file");
        assert_eq!(missing.code, "CLI_DIALOGUE_NOT_FOUND");

        std::fs::create_dir_all(&root).expect("root");
        let not_file =
            load_dialogue(root.to_string_lossy().as_ref(), None).expect_err("directory");
        assert_eq!(not_file.code, "CLI_SOURCE_NOT_FILE");

        let broken = root.join("broken.json");
        write_file(&broken, "{\"id\": 1}");
        let invalid =
            load_dialogue(broken.to_string_lossy().as_ref(), None).expect_err("invalid json");
        assert_eq!(invalid.code, "API_DIALOGUE_INVALID");

        let dialogue_path = root.join("ok.json");
        write_file(&dialogue_path, GREETING_JSON);
        let bad_config = root.join("bad.toml");
        write_file(&bad_config, "listener_errors = 3");
        let config_error = load_dialogue(
            dialogue_path.to_string_lossy().as_ref(),
            Some(bad_config.to_string_lossy().as_ref()),
        )
        .expect_err("bad config");
        assert_eq!(config_error.code, "API_CONFIG_INVALID");
    }

    #[test]
    fn collect_dialogue_files_filters_by_name() {
        let root = temp_path("collect-dialogues");
        write_file(&root.join("a").join("dialogue.json"), GREETING_JSON);
        write_file(&root.join("b.dialogue.json"), GREETING_JSON);
        write_file(&root.join("a").join("testcase.json"), "{}");
        write_file(&root.join("notes.txt"), "ignored");

        let files = collect_dialogue_files(root.to_string_lossy().as_ref()).expect("files");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|file| is_dialogue_file(file)));

        let single = collect_dialogue_files(root.join("b.dialogue.json").to_string_lossy().as_ref())
            .expect("single file");
        assert_eq!(single.len(), 1);

        let empty = temp_path("collect-empty");
        std::fs::create_dir_all(&empty).expect("empty dir");
        let error = collect_dialogue_files(empty.to_string_lossy().as_ref()).expect_err("empty");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }
}
