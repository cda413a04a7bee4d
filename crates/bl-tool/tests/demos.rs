use std::path::PathBuf;

use bl_tool::{assert_case, collect_case_dirs, TESTCASE_FILE_NAME};

fn demos_root() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

#[tokio::test]
async fn every_demo_testcase_passes() {
    let dirs = collect_case_dirs(&demos_root()).expect("demos should have testcases");
    assert!(dirs.len() >= 4, "expected the bundled demos");

    for dir in dirs {
        if let Err(error) = assert_case(&dir, &dir.join(TESTCASE_FILE_NAME)).await {
            panic!("demo {} failed: {}", dir.display(), error);
        }
    }
}
