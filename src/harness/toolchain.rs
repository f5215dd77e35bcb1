//! Runs synthesized programs with locally installed toolchains. Only the
//! `#[ignore]`d golden-output tests use this.

use std::{fs, path::PathBuf, process::Command};

use serde_json::Value;

use crate::{
    harness::{Submission, synthesize},
    language::Language,
};

pub fn synthesize_text(language: Language, source: &str, entry: &str, args: Value) -> String {
    let sub = Submission {
        source_code: source.to_string(),
        language,
        entry_point_name: entry.to_string(),
        arguments: args.as_array().cloned().unwrap_or_default(),
    };
    synthesize(&sub).unwrap().text
}

/// Writes `program` to `file` in a scratch directory, runs each step there
/// and returns the stdout of the last one.
pub fn run(program: &str, file: &str, steps: &[&[&str]]) -> String {
    let dir: PathBuf = std::env::temp_dir().join(format!("harness-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), program).unwrap();

    let mut stdout = String::new();
    for step in steps {
        let program_path = match step[0].strip_prefix("./") {
            Some(local) => dir.join(local),
            None => PathBuf::from(step[0]),
        };
        let output = Command::new(program_path)
            .args(&step[1..])
            .current_dir(&dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "{} failed:\n{}\n--- program ---\n{program}",
            step[0],
            String::from_utf8_lossy(&output.stderr)
        );
        stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    }
    fs::remove_dir_all(&dir).unwrap();
    stdout
}
