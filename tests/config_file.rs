// Installs the global subscriber, so this binary holds a single test.

use std::io::Write;

use cluster_cmd::{CancellationToken, runner_from_config_file, with_args, with_stdout};
use cluster_cmd_test_utils::{SharedBuffer, with_timeout};
use tempfile::{NamedTempFile, tempdir};

#[tokio::test]
async fn runner_built_from_config_file() {
    let dir = tempdir().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[runner]
program = "sh"
env = ["CLUSTER_NAME=integration"]
working_dir = "{}"
log_level = "warn"
"#,
        dir.path().display()
    )
    .unwrap();

    let runner = runner_from_config_file(file.path()).unwrap();
    assert_eq!(runner.program(), "sh");
    assert_eq!(runner.display_name(), "sh");
    assert_eq!(runner.environment().get("CLUSTER_NAME"), Some("integration"));

    let buf = SharedBuffer::new();
    with_timeout(runner.run_default(
        &CancellationToken::new(),
        [
            with_args(["-c", "echo \"$CLUSTER_NAME\"; pwd -P"]),
            with_stdout(buf.clone()),
        ],
    ))
    .await
    .unwrap();

    let expected = format!(
        "integration\n{}\n",
        dir.path().canonicalize().unwrap().display()
    );
    assert_eq!(buf.contents_string(), expected);

    // a second subscriber cannot be installed
    assert!(cluster_cmd::logging::init_logging(None).is_err());
}
