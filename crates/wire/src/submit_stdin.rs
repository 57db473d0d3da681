// SPDX-License-Identifier: MIT

//! Remote-mode `cylc jobs-submit` stdin framing (spec.md §6): a
//! concatenation of job files, each delimited so the helper can split them
//! back out and write them to their respective log directories.

use thiserror::Error;

const CYLC_DIR_PREFIX: &str = "export CYLC_DIR=";

/// One job file as carried over stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedJobFile {
    pub log_dir: String,
    pub content: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameParseError {
    #[error("missing `#EOF: {0}` terminator for job log directory {0}")]
    MissingTerminator(String),
    #[error("unexpected line before any `# Job log directory:` header: {0}")]
    UnexpectedLine(String),
    #[error("mismatched terminator: header said {expected}, terminator said {found}")]
    MismatchedTerminator { expected: String, found: String },
}

/// Frame one job file's content for the stdin concatenation, rewriting any
/// `export CYLC_DIR=` line to the value the remote host should use.
pub fn frame_job_file(log_dir: &str, content: &str, remote_cylc_dir: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Job log directory: {log_dir}\n"));
    for line in content.lines() {
        if line.starts_with(CYLC_DIR_PREFIX) {
            out.push_str(&format!("{CYLC_DIR_PREFIX}{remote_cylc_dir}\n"));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(&format!("#EOF: {log_dir}\n"));
    out
}

/// Parse a concatenation of [`frame_job_file`] outputs back into individual
/// job files.
pub fn parse_framed_stdin(stdin: &str) -> Result<Vec<FramedJobFile>, FrameParseError> {
    let mut files = Vec::new();
    let mut lines = stdin.lines().peekable();

    while let Some(line) = lines.next() {
        let log_dir = match line.strip_prefix("# Job log directory: ") {
            Some(dir) => dir.to_string(),
            None => return Err(FrameParseError::UnexpectedLine(line.to_string())),
        };
        let mut content_lines = Vec::new();
        loop {
            let next = lines
                .next()
                .ok_or_else(|| FrameParseError::MissingTerminator(log_dir.clone()))?;
            if let Some(terminator_dir) = next.strip_prefix("#EOF: ") {
                if terminator_dir != log_dir {
                    return Err(FrameParseError::MismatchedTerminator {
                        expected: log_dir.clone(),
                        found: terminator_dir.to_string(),
                    });
                }
                break;
            }
            content_lines.push(next.to_string());
        }
        let mut content = content_lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        files.push(FramedJobFile { log_dir, content });
    }

    Ok(files)
}

#[cfg(test)]
#[path = "submit_stdin_tests.rs"]
mod tests;
