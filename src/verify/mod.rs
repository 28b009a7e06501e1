//! Post-patch verification
//!
//! Verification only reports. A mismatch becomes a failed [`Check`]; only a
//! missing or unreadable workbook is an error.

mod suites;

use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::excel::WorkbookReader;
use crate::types::Workbook;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// One named pass/fail line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }

    /// Pass or fail on `ok`, with a detail per outcome
    pub fn expect(
        name: impl Into<String>,
        ok: bool,
        passed: impl Into<String>,
        failed: impl Into<String>,
    ) -> Self {
        if ok {
            Self::pass(name, passed)
        } else {
            Self::fail(name, failed)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub suite: String,
    pub checks: Vec<Check>,
}

impl Report {
    pub fn new(suite: Suite) -> Self {
        Self {
            suite: suite.to_string(),
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn extend(&mut self, other: Report) {
        self.checks.extend(other.checks);
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// 0 when every check passed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// Named group of checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Suite {
    /// Timeline, dropdowns, offsets, fee and header links
    Dropdowns,
    /// Resource Supply rows 3-16 and their month coverage
    Redistribution,
    /// Every labelled Resource Supply row carries formulas
    Rows,
    /// Formula chain from column B through AO into Resource Supply
    Structure,
    /// First twelve timeline labels
    Timeline,
    /// Every suite
    All,
}

impl Suite {
    pub const EACH: [Suite; 5] = [
        Suite::Dropdowns,
        Suite::Redistribution,
        Suite::Rows,
        Suite::Structure,
        Suite::Timeline,
    ];
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Suite::Dropdowns => "dropdowns",
            Suite::Redistribution => "redistribution",
            Suite::Rows => "rows",
            Suite::Structure => "structure",
            Suite::Timeline => "timeline",
            Suite::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Run a suite against an in-memory workbook
pub fn run_suite(workbook: &Workbook, suite: Suite, config: &PatchConfig) -> PatchResult<Report> {
    let mut report = Report::new(suite);
    match suite {
        Suite::Dropdowns => suites::dropdowns(workbook, config, &mut report)?,
        Suite::Redistribution => suites::redistribution(workbook, config, &mut report)?,
        Suite::Rows => suites::rows(workbook, config, &mut report)?,
        Suite::Structure => suites::structure(workbook, config, &mut report)?,
        Suite::Timeline => suites::timeline(workbook, config, &mut report)?,
        Suite::All => {
            for each in Suite::EACH {
                report.extend(run_suite(workbook, each, config)?);
            }
        }
    }
    tracing::debug!(
        suite = %suite,
        passed = report.passed(),
        failed = report.failed(),
        "verification finished"
    );
    Ok(report)
}

/// Load a workbook from disk and run a suite against it
pub fn verify_file(path: &Path, suite: Suite, config: &PatchConfig) -> PatchResult<Report> {
    let workbook = WorkbookReader::new(path).read()?;
    run_suite(&workbook, suite, config)
}
