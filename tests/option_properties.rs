use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;

use cluster_cmd::exec::{CmdOption, CommandSpec, Environment, with_args, with_env, with_working_dir};

/// One option, recorded together with what it should leave behind.
#[derive(Debug, Clone)]
enum Op {
    Args(Vec<String>),
    Env(Vec<(String, String)>),
    Dir(String),
}

impl Op {
    fn to_option(&self) -> CmdOption {
        match self {
            Op::Args(args) => with_args(args.clone()),
            Op::Env(vars) => with_env(vars.iter().map(|(k, v)| format!("{k}={v}"))),
            Op::Dir(dir) => with_working_dir(dir.clone()),
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let word = "[a-z0-9]{0,6}";
    let key = "[A-C]";
    prop_oneof![
        proptest::collection::vec(word, 0..4).prop_map(Op::Args),
        proptest::collection::vec((key, word), 0..4).prop_map(Op::Env),
        "/[a-z]{1,5}".prop_map(Op::Dir),
    ]
}

fn base_env() -> Environment {
    Environment::from_entries(["A=base", "PATH=/bin"])
}

proptest! {
    #[test]
    fn last_write_wins_per_field(ops in proptest::collection::vec(op_strategy(), 0..12)) {
        let mut spec = CommandSpec::new("kubectl", "kubectl", Arc::new(base_env()));
        spec.apply(ops.iter().map(Op::to_option));

        let last_args = ops.iter().rev().find_map(|op| match op {
            Op::Args(a) => Some(a.clone()),
            _ => None,
        });
        let mut expected_args = vec!["kubectl".to_string()];
        expected_args.extend(last_args.unwrap_or_default());
        prop_assert_eq!(&spec.args, &expected_args);

        let last_env = ops.iter().rev().find_map(|op| match op {
            Op::Env(vars) => Some(vars.clone()),
            _ => None,
        });
        match last_env {
            None => prop_assert!(spec.env.is_none()),
            Some(vars) => {
                let mut expected = base_env();
                for (k, v) in vars {
                    expected.set(k, v);
                }
                prop_assert_eq!(spec.env.as_ref(), Some(&expected));
            }
        }

        let last_dir = ops.iter().rev().find_map(|op| match op {
            Op::Dir(d) => Some(PathBuf::from(d)),
            _ => None,
        });
        prop_assert_eq!(spec.working_dir, last_dir);
    }
}
