//! Reconciliation facade: load both sides, diff, then report or apply
//!
//! ```text
//! pull: remote (source) ──▶ local folder (destination)   pull ignore set
//! push: local folder (source) ──▶ remote (destination)   push ignore set
//! ```
//!
//! Apply is not transactional. If a step fails, the steps before it stay
//! applied and the error is returned; running the same reconciliation again
//! recomputes the remaining diffs and converges.

use crate::apply::{apply_pull, apply_push};
use crate::content::{LocalContent, RemoteContent};
use crate::context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
use crate::diff::{DiffRecord, DiffSummary};
use crate::differ::diff;
use crate::entity::Entity;
use crate::error::Result;
use crate::folder::LocalFolder;
use crate::ignore::IgnoreSet;
use crate::report::Reporter;
use crate::types::{ApplySummary, Direction};

/// Diffs computed for one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    direction: Direction,
    address: String,
    diffs: Vec<DiffRecord>,
}

impl Plan {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Address of the remote entity.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn diffs(&self) -> &[DiffRecord] {
        &self.diffs
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(&self.diffs)
    }
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to do.
    InSync,
    /// Dry run: the plan and its rendered report; nothing was mutated.
    DryRun { plan: Plan, report: String },
    /// The confirmation callback declined the apply.
    Declined { plan: Plan },
    /// Every diff was applied.
    Applied { plan: Plan, summary: ApplySummary },
}

impl Outcome {
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Self::InSync => None,
            Self::DryRun { plan, .. } | Self::Declined { plan } | Self::Applied { plan, .. } => {
                Some(plan)
            }
        }
    }
}

/// Diffs and applies entity state in either direction.
#[derive(Debug, Clone)]
pub struct Reconciler {
    push_ignore: IgnoreSet,
    pull_ignore: IgnoreSet,
    reporter: Reporter,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            push_ignore: IgnoreSet::push(),
            pull_ignore: IgnoreSet::pull(),
            reporter: Reporter::default(),
        }
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore extra fields on top of the built-in sets.
    pub fn with_extra_ignores<I, J, S, T>(mut self, push: I, pull: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.push_ignore = self.push_ignore.with_extra(push);
        self.pull_ignore = self.pull_ignore.with_extra(pull);
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn ignore_set(&self, direction: Direction) -> &IgnoreSet {
        match direction {
            Direction::Pull => &self.pull_ignore,
            Direction::Push => &self.push_ignore,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Load both sides and compute the diffs for `direction`.
    ///
    /// The local folder is checked before the remote is contacted, so
    /// `MissingFolder` and `MissingDefinition` surface without network calls.
    pub fn plan(
        &self,
        direction: Direction,
        remote: &dyn Entity,
        folder: &LocalFolder,
    ) -> Result<Plan> {
        let local = folder.load_definition()?;
        let remote_record = remote.get_json()?;

        let local_content = LocalContent::new(folder);
        let remote_content = RemoteContent::new(remote, &remote_record)?;
        let ignore = self.ignore_set(direction);

        let diffs = match direction {
            Direction::Push => {
                diff(&local, &remote_record, ignore, &local_content, &remote_content)?
            }
            Direction::Pull => {
                diff(&remote_record, &local, ignore, &remote_content, &local_content)?
            }
        };

        log::debug!(
            "{} {}: {} diffs",
            direction,
            remote.address(),
            diffs.len()
        );
        Ok(Plan {
            direction,
            address: remote.address(),
            diffs,
        })
    }

    /// Render a plan for review.
    pub fn report(&self, plan: &Plan) -> String {
        self.reporter.report(&plan.diffs)
    }

    /// Apply a plan. Pull never mutates `remote`.
    pub fn apply<P: ProgressCallback>(
        &self,
        plan: &Plan,
        remote: &mut dyn Entity,
        folder: &LocalFolder,
        progress: &mut P,
    ) -> Result<ApplySummary> {
        match plan.direction {
            Direction::Push => apply_push(&plan.diffs, folder, remote, progress),
            Direction::Pull => apply_pull(&plan.diffs, remote, folder, progress),
        }
    }

    /// Plan, then report (dry run) or confirm and apply.
    pub fn run<P, C>(
        &self,
        direction: Direction,
        remote: &mut dyn Entity,
        folder: &LocalFolder,
        dry_run: bool,
        progress: &mut P,
        confirm: &mut C,
    ) -> Result<Outcome>
    where
        P: ProgressCallback,
        C: ConfirmCallback,
    {
        let plan = self.plan(direction, remote, folder)?;
        if plan.is_empty() {
            return Ok(Outcome::InSync);
        }

        if dry_run {
            let report = self.report(&plan);
            return Ok(Outcome::DryRun { plan, report });
        }

        let prompt = format!(
            "Apply {} changes to {}?",
            plan.diffs.len(),
            direction.destination_label()
        );
        if !confirm.confirm(&prompt)? {
            return Ok(Outcome::Declined { plan });
        }

        let summary = self.apply(&plan, remote, folder, progress)?;
        Ok(Outcome::Applied { plan, summary })
    }

    /// Make the local folder match the remote entity.
    pub fn pull(
        &self,
        remote: &mut dyn Entity,
        folder: &LocalFolder,
        dry_run: bool,
    ) -> Result<Outcome> {
        self.run(
            Direction::Pull,
            remote,
            folder,
            dry_run,
            &mut NoProgress,
            &mut AutoConfirm,
        )
    }

    /// Make the remote entity match the local folder.
    pub fn push(
        &self,
        remote: &mut dyn Entity,
        folder: &LocalFolder,
        dry_run: bool,
    ) -> Result<Outcome> {
        self.run(
            Direction::Push,
            remote,
            folder,
            dry_run,
            &mut NoProgress,
            &mut AutoConfirm,
        )
    }
}

/// Pull with the built-in ignore sets.
pub fn pull(remote: &mut dyn Entity, folder: &LocalFolder, dry_run: bool) -> Result<Outcome> {
    Reconciler::default().pull(remote, folder, dry_run)
}

/// Push with the built-in ignore sets.
pub fn push(remote: &mut dyn Entity, folder: &LocalFolder, dry_run: bool) -> Result<Outcome> {
    Reconciler::default().push(remote, folder, dry_run)
}
