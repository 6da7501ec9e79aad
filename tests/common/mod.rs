#![allow(dead_code)]

use std::sync::Arc;

use cluster_cmd::{CmdOption, Runner, with_args};
use cluster_cmd_test_utils::RecordingSink;

pub use cluster_cmd_test_utils::init_tracing;

/// Runner whose argv[0] is `sh` and whose captured lines go to `sink`.
pub fn sh_runner(sink: &RecordingSink) -> Runner {
    Runner::new()
        .with_program("sh")
        .with_display_name("sh")
        .with_sink(Arc::new(sink.clone()))
}

/// `sh -c <script>`.
pub fn script(body: &str) -> CmdOption {
    with_args(["-c", body])
}
