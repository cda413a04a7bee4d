use std::fs;

use bl_api::parse_dialogue_json;
use bl_core::DialogueError;
use bl_runtime::validate_dialogue;

use crate::{collect_dialogue_files, json_string, map_cli_dialogue_read, ValidateArgs};

/// Prints one block per dialogue file. Exit code 1 when any file has
/// errors; warnings alone do not fail the run.
pub(crate) fn run_validate(args: ValidateArgs) -> Result<i32, DialogueError> {
    let (lines, all_valid) = validate_lines(&args.path)?;
    for line in lines {
        println!("{}", line);
    }
    Ok(if all_valid { 0 } else { 1 })
}

pub(crate) fn validate_lines(path: &str) -> Result<(Vec<String>, bool), DialogueError> {
    let files = collect_dialogue_files(path)?;
    let mut lines = vec!["RESULT:OK".to_string()];
    let mut all_valid = true;

    for file in files {
        let source = fs::read_to_string(&file).map_err(map_cli_dialogue_read)?;
        lines.push(format!(
            "FILE_JSON:{}",
            json_string(file.to_string_lossy().as_ref())
        ));

        let dialogue = match parse_dialogue_json(&source) {
            Ok(dialogue) => dialogue,
            Err(error) => {
                all_valid = false;
                lines.push("VALID:false".to_string());
                lines.push(format!("ERROR:{}|{}", error.code, json_string(&error.message)));
                continue;
            }
        };

        let report = validate_dialogue(&dialogue);
        all_valid &= report.valid;
        lines.push(format!("VALID:{}", report.valid));
        for issue in &report.errors {
            lines.push(format!("ERROR:{}|{}", issue.code, json_string(&issue.message)));
        }
        for issue in &report.warnings {
            lines.push(format!("WARNING:{}|{}", issue.code, json_string(&issue.message)));
        }
    }

    Ok((lines, all_valid))
}
