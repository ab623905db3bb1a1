//! Editing an open solution.

use tracing::{info, warn};

use crate::discovery::discover;
use crate::host::{Automation, Host, Project, ProjectConfiguration, Solution, find_project};
use crate::options::Options;
use crate::{Error, Result};

/// An IDE together with the solution it has open.
///
/// Both are released on drop, solution first.
pub struct Session<H: Host> {
    solution: H::Solution,
    // Held so the IDE outlives the solution handle.
    _host: H,
    was_open: bool,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, solution: H::Solution, was_open: bool) -> Self {
        Self {
            solution,
            _host: host,
            was_open,
        }
    }

    /// Whether the solution was open in the IDE before we got to it.
    pub fn was_open(&self) -> bool {
        self.was_open
    }

    /// Set the debug working directory on every configuration of a project.
    ///
    /// Returns `false` if nothing was changed. Failures are logged, not returned.
    pub fn set_project_working_dir(&self, project_name: &str, working_dir: &str) -> bool {
        info!("Looking for project {project_name}...");
        match self.try_set_project_working_dir(project_name, working_dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                warn!("Failed to set working dir for project, {project_name}.");
                false
            }
        }
    }

    fn try_set_project_working_dir(&self, project_name: &str, working_dir: &str) -> Result<()> {
        let project = find_project(&self.solution, project_name)?
            .ok_or_else(|| Error::ProjectNotFound(project_name.into()))?;
        info!("Found project: {project_name}");
        info!("Setting working directory");
        info!("{}", project.full_name()?);
        for configuration in project.configurations()? {
            configuration.set_debug_working_directory(working_dir)?;
        }
        Ok(())
    }

    /// Activate a solution configuration. Failures are logged, not returned.
    pub fn set_active_config(&self, config: &str) -> bool {
        info!("Trying to set active config to \"{config}\"");
        match self.solution.activate_configuration(config) {
            Ok(()) => {
                info!("  Success!");
                true
            }
            Err(e) => {
                warn!("  Failed to set \"{config}\" as the active config.");
                warn!("{e}");
                false
            }
        }
    }

    /// Make a project the solution's startup project. Failures are logged, not returned.
    pub fn set_startup_project(&self, project_name: &str) -> bool {
        info!("Trying to set \"{project_name}\" to the startup project");
        let result = find_project(&self.solution, project_name).and_then(|project| {
            let Some(project) = project else {
                return Ok(false);
            };
            self.solution
                .set_startup_projects(&project.unique_name()?)
                .map(|_| true)
        });
        match result {
            Ok(true) => {
                info!("  Success!");
                true
            }
            Ok(false) => {
                warn!("  Could not find project \"{project_name}\" in the solution.");
                false
            }
            Err(e) => {
                warn!("  Failed to set the startup project!");
                warn!("{e}");
                false
            }
        }
    }

    /// Apply all the edits in `options`.
    ///
    /// The solution is closed afterwards if something changed and we were the ones to open it.
    pub fn apply(&self, options: &Options) -> Result<Report> {
        let mut report = Report::default();
        for (project_name, working_dir) in &options.working_dirs {
            if self.set_project_working_dir(project_name, working_dir) {
                report.working_dirs_set += 1;
            }
        }
        if let Some(config) = &options.config {
            report.config_set = self.set_active_config(config);
        }
        if let Some(startup) = &options.startup {
            report.startup_set = self.set_startup_project(startup);
        }

        if report.changed() && !self.was_open {
            self.solution.close()?;
            report.closed = true;
        }
        Ok(report)
    }
}

/// What a run changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Number of projects that had their working directory set.
    pub working_dirs_set: usize,
    pub config_set: bool,
    pub startup_set: bool,
    /// Whether the solution was closed at the end of the run.
    pub closed: bool,
}

impl Report {
    pub fn changed(&self) -> bool {
        self.working_dirs_set > 0 || self.config_set || self.startup_set
    }
}

/// Find or start an IDE for `options.solution` and apply the edits.
pub fn run<A: Automation>(automation: &A, options: &Options) -> Result<Report> {
    info!("Editing solution: {}", options.solution.display());
    let session = discover(automation, &options.solution, options.use_new_vs)?;
    session.apply(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeAutomation, FakeHost, FakeProject, FakeSolution, SolutionState};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::rc::Rc;

    fn session(solution: &FakeSolution, was_open: bool) -> Session<FakeHost> {
        Session::new(
            FakeHost::with_solution(solution.clone()),
            solution.clone(),
            was_open,
        )
    }

    fn core_and_tests() -> (FakeProject, FakeProject, FakeSolution) {
        let core = FakeProject::new("Core", 2);
        let tests = FakeProject::new("Tests", 2);
        let solution = FakeSolution::new(
            r"C:\src\Game.sln",
            vec![core.clone(), tests.clone()],
            &["Debug", "Release"],
        );
        (core, tests, solution)
    }

    fn dirs(dir: Option<&str>) -> Vec<Option<String>> {
        vec![dir.map(String::from); 2]
    }

    fn options(working_dirs: &[(&str, &str)]) -> Options {
        Options {
            solution: r"C:\src\Game.sln".into(),
            working_dirs: working_dirs
                .iter()
                .map(|&(p, d)| (p.into(), d.into()))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    #[test]
    fn working_dir_only_touches_named_project() {
        let (core, tests, solution) = core_and_tests();
        let report = session(&solution, false)
            .apply(&options(&[("Core", r"C:\run")]))
            .unwrap();

        assert_eq!(core.working_directories(), dirs(Some(r"C:\run")));
        assert_eq!(tests.working_directories(), dirs(None));
        assert_eq!(report.working_dirs_set, 1);
        assert!(report.closed);
        assert!(solution.state().closed.get());
    }

    #[test]
    fn project_names_ignore_case() {
        let (core, _, solution) = core_and_tests();
        assert!(session(&solution, true).set_project_working_dir("CORE", r"C:\run"));
        assert_eq!(core.working_directories()[0].as_deref(), Some(r"C:\run"));
    }

    #[test]
    fn missing_project_is_a_no_op() {
        let (core, tests, solution) = core_and_tests();
        let report = session(&solution, false)
            .apply(&options(&[("Engine", r"C:\run")]))
            .unwrap();

        assert_eq!(report, Report::default());
        assert_eq!(core.working_directories(), dirs(None));
        assert_eq!(tests.working_directories(), dirs(None));
        assert!(!solution.state().closed.get());
    }

    #[test]
    fn never_closes_without_changes() {
        let (_, _, solution) = core_and_tests();
        let mut opts = options(&[]);
        opts.config = Some("Profile".into());
        opts.startup = Some("Tools".into());
        let report = session(&solution, false).apply(&opts).unwrap();

        assert!(!report.changed());
        assert!(!report.closed);
        assert!(!solution.state().closed.get());
    }

    #[test]
    fn keeps_already_open_solution_open() {
        let (_, _, solution) = core_and_tests();
        let mut opts = options(&[("Tests", r"C:\out")]);
        opts.config = Some("Release".into());
        let report = session(&solution, true).apply(&opts).unwrap();

        assert!(report.changed());
        assert!(report.config_set);
        assert!(!report.closed);
        assert!(!solution.state().closed.get());
    }

    #[test]
    fn config_and_startup() {
        let (_, _, solution) = core_and_tests();
        let mut opts = options(&[]);
        opts.config = Some("Release".into());
        opts.startup = Some("tests".into());
        let report = session(&solution, false).apply(&opts).unwrap();

        assert_eq!(
            report,
            Report {
                working_dirs_set: 0,
                config_set: true,
                startup_set: true,
                closed: true,
            }
        );
        assert_eq!(
            solution.state().active_configuration.borrow().as_deref(),
            Some("Release")
        );
        assert_eq!(
            solution.state().startup_projects.borrow().as_deref(),
            Some(r"Tests\Tests.vcxproj")
        );
    }

    #[test]
    fn one_failed_step_does_not_undo_another() {
        let (_, _, solution) = core_and_tests();
        let mut opts = options(&[("Core", r"C:\run")]);
        opts.config = Some("Shipping".into());
        let report = session(&solution, false).apply(&opts).unwrap();

        assert_eq!(report.working_dirs_set, 1);
        assert!(!report.config_set);
        assert!(report.closed);
    }

    #[test]
    fn failing_projects_collection_is_logged() {
        let solution = FakeSolution(Rc::new(SolutionState {
            fail_projects: true,
            ..Default::default()
        }));
        let s = session(&solution, false);
        assert!(!s.set_project_working_dir("Core", r"C:\run"));
        assert!(!s.set_startup_project("Core"));
    }

    #[test]
    fn unreadable_project_name_fails_the_step() {
        let core = FakeProject::new("Core", 2);
        let solution = FakeSolution::new(
            r"C:\src\Game.sln",
            vec![FakeProject::unnamed(), core.clone()],
            &["Debug"],
        );
        let s = session(&solution, false);
        assert!(matches!(
            find_project(&solution, "Core"),
            Err(Error::Member { member, .. }) if member == "Name"
        ));
        assert!(!s.set_project_working_dir("Core", r"C:\run"));
        assert!(!s.set_startup_project("Core"));
        assert_eq!(core.working_directories(), dirs(None));
        assert!(solution.state().startup_projects.borrow().is_none());
    }

    #[test]
    fn end_to_end_with_launched_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Game.sln");
        std::fs::write(
            &path,
            "\u{feff}\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n",
        )
        .unwrap();

        let (core, tests, solution) = core_and_tests();
        let automation = FakeAutomation {
            installed: vec![(
                "VisualStudio.DTE.14.0".into(),
                FakeHost::with_solution(solution.clone()),
            )],
            ..Default::default()
        };
        let mut opts = options(&[("Core", r"C:\run")]);
        opts.solution = path.clone();

        let report = run(&automation, &opts).unwrap();
        assert_eq!(report.working_dirs_set, 1);
        assert!(report.closed);
        assert_eq!(
            solution.state().opened.borrow().as_deref(),
            Some(Path::new(&path))
        );
        assert_eq!(core.working_directories(), dirs(Some(r"C:\run")));
        assert_eq!(tests.working_directories(), dirs(None));
    }

    #[test]
    fn end_to_end_discovery_failure() {
        let dir = tempfile::tempdir().unwrap();
        let opts = Options {
            solution: dir.path().join("Missing.sln"),
            ..Default::default()
        };
        assert!(matches!(
            run(&FakeAutomation::default(), &opts),
            Err(Error::Discovery { .. })
        ));
    }
}
