use std::fmt::Display;

use bl_core::DialogueError;

fn map_error(code: &'static str, error: impl Display) -> DialogueError {
    DialogueError::validation(code, error.to_string())
}

pub(crate) fn emit_error(error: DialogueError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_play_io(error: std::io::Error) -> DialogueError {
    map_error("PLAY_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> DialogueError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_dialogue_read(error: std::io::Error) -> DialogueError {
    map_error("CLI_DIALOGUE_READ", error)
}

pub(crate) fn map_cli_config_read(error: std::io::Error) -> DialogueError {
    map_error("CLI_CONFIG_READ", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> DialogueError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> DialogueError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> DialogueError {
    map_error("CLI_STATE_INVALID", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(DialogueError::validation("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(map_play_io(std::io::Error::other("io")).code, "PLAY_IO");
        assert_eq!(
            map_cli_source_path(std::io::Error::other("path")).code,
            "CLI_SOURCE_PATH"
        );
        assert_eq!(
            map_cli_dialogue_read(std::io::Error::other("read")).code,
            "CLI_DIALOGUE_READ"
        );
        assert_eq!(
            map_cli_config_read(std::io::Error::other("read")).code,
            "CLI_CONFIG_READ"
        );
        assert_eq!(
            map_cli_state_write(std::io::Error::other("write")).code,
            "CLI_STATE_WRITE"
        );
        assert_eq!(
            map_cli_state_read(std::io::Error::other("read")).code,
            "CLI_STATE_READ"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_state_invalid(invalid).code, "CLI_STATE_INVALID");
    }
}
