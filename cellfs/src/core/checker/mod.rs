// SPDX-License-Identifier: MIT

mod types;

pub use types::{
    CoreVerifyOptions, Finding, ReportDisplay, ReportDisplayOpts, Severity, VerifierOptionsLike,
    VerifyPhases, VerifyReport,
};

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};

type PhaseFn<C, O> = fn(&mut C, &O, &mut VerifyReport) -> FsCheckerResult<()>;

/// Trait for verifying the integrity of a filesystem image.
///
/// Phases run in on-disk dependency order: the superblock first, then
/// what it points to. Each phase appends [`Finding`]s; an `Err` means the
/// check itself could not run (I/O failure), not that the image is bad.
pub trait FsChecker: Sized {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsCheckerResult<VerifyReport> {
        let phases: [(VerifyPhases, PhaseFn<Self, Self::Options>); 6] = [
            (VerifyPhases::SUPERBLOCK, Self::check_superblock),
            (VerifyPhases::BITMAPS, Self::check_bitmaps),
            (VerifyPhases::TABLE, Self::check_table),
            (VerifyPhases::ROOT, Self::check_root),
            (VerifyPhases::CROSSREF, Self::check_cross_reference),
            (VerifyPhases::CONTENT, Self::check_content),
        ];

        let mut rep = VerifyReport::default();
        for (phase, f) in phases {
            if !self.run_phase(opt, &mut rep, phase, f)? {
                break;
            }
        }
        Ok(rep)
    }

    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    fn check_superblock(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_bitmaps(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_table(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_root(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_cross_reference(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult<()> {
        Ok(())
    }
    fn check_content(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult<()> {
        Ok(())
    }

    /// Runs `f` if `phase` is enabled. Returns `false` when checking
    /// should stop (fail-fast with an error already reported).
    fn run_phase(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: PhaseFn<Self, Self::Options>,
    ) -> FsCheckerResult<bool> {
        if opt.phases().contains(phase) {
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
