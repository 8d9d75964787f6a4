// SPDX-License-Identifier: MIT

use core::fmt;

use bitflags::bitflags;

/// Ordered from least to most severe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERR ",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

impl Finding {
    fn new(sev: Severity, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev,
            code,
            msg: msg.into(),
        }
    }

    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, msg)
    }

    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Warn, code, msg)
    }

    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, msg)
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn has_error(&self) -> bool {
        self.findings.iter().any(|f| f.sev == Severity::Error)
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn first_error(&self) -> Option<&Finding> {
        self.findings.iter().find(|f| f.sev == Severity::Error)
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// True if any finding carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    pub fn display_with(&self, opts: ReportDisplayOpts) -> ReportDisplay<'_> {
        ReportDisplay { rep: self, opts }
    }

    pub fn errors_only(&self) -> ReportDisplay<'_> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Error,
            ..ReportDisplayOpts::default()
        })
    }

    pub fn warn_and_errors(&self) -> ReportDisplay<'_> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            ..ReportDisplayOpts::default()
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            prefix: "",
            show_summary: false,
            pad_code: 14,
        }
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self
            .rep
            .findings
            .iter()
            .filter(|it| it.sev >= self.opts.min_level);

        for it in shown {
            writeln!(
                f,
                "{}{}: {:<width$} {}",
                self.opts.prefix,
                it.sev.tag(),
                it.code,
                it.msg,
                width = self.opts.pad_code
            )?;
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}Summary: errors={}  warns={}  infos={}",
                self.opts.prefix,
                self.rep.count(Severity::Error),
                self.rep.count(Severity::Warn),
                self.rep.count(Severity::Info),
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_with(ReportDisplayOpts::default()).fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        const SUPERBLOCK = 1 << 0;
        const BITMAPS    = 1 << 1;
        const TABLE      = 1 << 2;
        const ROOT       = 1 << 3;
        const CROSSREF   = 1 << 4;
        const CONTENT    = 1 << 5;
        const ALL        = u32::MAX;
    }
}

/// Options a checker understands; filesystems may wrap this with more.
pub trait VerifierOptionsLike {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }
    fn fail_fast(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct CoreVerifyOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
}

impl VerifierOptionsLike for CoreVerifyOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

impl Default for CoreVerifyOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
        }
    }
}
