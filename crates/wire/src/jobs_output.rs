// SPDX-License-Identifier: MIT

//! `cylc jobs-submit`/`jobs-poll` stdout framing (spec.md §6): every line is
//! prefixed at column 0 by a classifier, followed by `ts|logDir|...` fields.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobsOutputLine {
    /// `[TASK JOB SUMMARY]<ts>|<logDir>|<rc>|<batchJobId?>`
    Summary { ts: String, log_dir: String, rc: i32, batch_job_id: Option<String> },
    /// `[TASK JOB COMMAND]<ts>|<logDir>|[STDOUT|STDERR] <line>`
    Command { ts: String, log_dir: String, stream: CommandStream, line: String },
    /// `[TASK JOB ERROR]<ts>|<logDir>|<line>`
    Error { ts: String, log_dir: String, line: String },
    /// `[TASK JOB MESSAGE]<ts>|<logDir>|<severity>|<message>`
    Message { ts: String, log_dir: String, severity: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobsOutputParseError {
    #[error("no recognised classifier in line: {0}")]
    UnknownClassifier(String),
    #[error("malformed fields after classifier: {0}")]
    MalformedFields(String),
}

const SUMMARY: &str = "[TASK JOB SUMMARY]";
const COMMAND: &str = "[TASK JOB COMMAND]";
const ERROR: &str = "[TASK JOB ERROR]";
const MESSAGE: &str = "[TASK JOB MESSAGE]";

/// Parse one line of `jobs-submit`/`jobs-poll` stdout. Lines with no
/// recognised classifier (protocol noise, shell banners) are an error the
/// caller should log at warning and skip (spec.md §7).
pub fn parse_jobs_output_line(line: &str) -> Result<JobsOutputLine, JobsOutputParseError> {
    if let Some(rest) = line.strip_prefix(SUMMARY) {
        let parts: Vec<&str> = rest.splitn(4, '|').collect();
        if parts.len() < 3 {
            return Err(JobsOutputParseError::MalformedFields(line.to_string()));
        }
        let rc: i32 =
            parts[2].parse().map_err(|_| JobsOutputParseError::MalformedFields(line.to_string()))?;
        let batch_job_id = parts.get(3).filter(|s| !s.is_empty()).map(|s| s.to_string());
        return Ok(JobsOutputLine::Summary {
            ts: parts[0].to_string(),
            log_dir: parts[1].to_string(),
            rc,
            batch_job_id,
        });
    }
    if let Some(rest) = line.strip_prefix(COMMAND) {
        let parts: Vec<&str> = rest.splitn(3, '|').collect();
        if parts.len() < 3 {
            return Err(JobsOutputParseError::MalformedFields(line.to_string()));
        }
        let (stream, body) = parts[2]
            .strip_prefix("STDOUT ")
            .map(|b| (CommandStream::Stdout, b))
            .or_else(|| parts[2].strip_prefix("STDERR ").map(|b| (CommandStream::Stderr, b)))
            .ok_or_else(|| JobsOutputParseError::MalformedFields(line.to_string()))?;
        return Ok(JobsOutputLine::Command {
            ts: parts[0].to_string(),
            log_dir: parts[1].to_string(),
            stream,
            line: body.to_string(),
        });
    }
    if let Some(rest) = line.strip_prefix(ERROR) {
        let parts: Vec<&str> = rest.splitn(3, '|').collect();
        if parts.len() < 3 {
            return Err(JobsOutputParseError::MalformedFields(line.to_string()));
        }
        return Ok(JobsOutputLine::Error {
            ts: parts[0].to_string(),
            log_dir: parts[1].to_string(),
            line: parts[2].to_string(),
        });
    }
    if let Some(rest) = line.strip_prefix(MESSAGE) {
        let parts: Vec<&str> = rest.splitn(4, '|').collect();
        if parts.len() < 4 {
            return Err(JobsOutputParseError::MalformedFields(line.to_string()));
        }
        return Ok(JobsOutputLine::Message {
            ts: parts[0].to_string(),
            log_dir: parts[1].to_string(),
            severity: parts[2].to_string(),
            message: parts[3].to_string(),
        });
    }
    Err(JobsOutputParseError::UnknownClassifier(line.to_string()))
}

#[cfg(test)]
#[path = "jobs_output_tests.rs"]
mod tests;
