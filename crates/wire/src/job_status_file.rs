// SPDX-License-Identifier: MIT

//! The per-job `job.status` state file (spec.md §6): order-independent
//! `KEY=value` lines, with `CYLC_MESSAGE` repeatable.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobExit {
    Succeeded,
    Signal(String),
}

impl JobExit {
    fn as_value(self) -> String {
        match self {
            JobExit::Succeeded => "SUCCEEDED".to_string(),
            JobExit::Signal(s) => s,
        }
    }

    fn parse(value: &str) -> Self {
        if value == "SUCCEEDED" {
            JobExit::Succeeded
        } else {
            JobExit::Signal(value.to_string())
        }
    }
}

/// Parsed/buildable contents of a `job.status` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStatusFile {
    pub batch_sys_name: Option<String>,
    pub batch_sys_job_id: Option<String>,
    pub batch_sys_job_submit_time: Option<String>,
    pub batch_sys_exit_polled: Option<String>,
    pub job_pid: Option<String>,
    pub job_init_time: Option<String>,
    pub job_exit_time: Option<String>,
    pub job_exit: Option<JobExit>,
    pub messages: Vec<String>,
}

impl JobStatusFile {
    pub fn parse(contents: &str) -> Self {
        let mut file = JobStatusFile::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else { continue };
            match key {
                "CYLC_BATCH_SYS_NAME" => file.batch_sys_name = Some(value.to_string()),
                "CYLC_BATCH_SYS_JOB_ID" => file.batch_sys_job_id = Some(value.to_string()),
                "CYLC_BATCH_SYS_JOB_SUBMIT_TIME" => {
                    file.batch_sys_job_submit_time = Some(value.to_string())
                }
                "CYLC_BATCH_SYS_EXIT_POLLED" => file.batch_sys_exit_polled = Some(value.to_string()),
                "CYLC_JOB_PID" => file.job_pid = Some(value.to_string()),
                "CYLC_JOB_INIT_TIME" => file.job_init_time = Some(value.to_string()),
                "CYLC_JOB_EXIT_TIME" => file.job_exit_time = Some(value.to_string()),
                "CYLC_JOB_EXIT" => file.job_exit = Some(JobExit::parse(value)),
                "CYLC_MESSAGE" => file.messages.push(value.to_string()),
                _ => {}
            }
        }
        file
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut kv = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                let _ = writeln!(out, "{key}={v}");
            }
        };
        kv("CYLC_BATCH_SYS_NAME", &self.batch_sys_name);
        kv("CYLC_BATCH_SYS_JOB_ID", &self.batch_sys_job_id);
        kv("CYLC_BATCH_SYS_JOB_SUBMIT_TIME", &self.batch_sys_job_submit_time);
        kv("CYLC_BATCH_SYS_EXIT_POLLED", &self.batch_sys_exit_polled);
        kv("CYLC_JOB_PID", &self.job_pid);
        kv("CYLC_JOB_INIT_TIME", &self.job_init_time);
        kv("CYLC_JOB_EXIT_TIME", &self.job_exit_time);
        if let Some(exit) = self.job_exit {
            let _ = writeln!(out, "CYLC_JOB_EXIT={}", exit.as_value());
        }
        for message in &self.messages {
            let _ = writeln!(out, "CYLC_MESSAGE={message}");
        }
        out
    }
}

#[cfg(test)]
#[path = "job_status_file_tests.rs"]
mod tests;
