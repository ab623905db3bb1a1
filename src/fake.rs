//! An in-memory stand-in for the DTE object model.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::host::{Automation, Host, Project, ProjectConfiguration, Solution};
use crate::{Error, Result};

fn member_error(member: &str) -> Error {
    Error::Member {
        member: member.into(),
        // DISP_E_EXCEPTION
        code: 0x80020009,
        message: "the fake host raised an exception".into(),
    }
}

#[derive(Default)]
pub struct FakeAutomation {
    pub running: Vec<(String, FakeHost)>,
    /// Hosts handed out by `launch`, keyed by ProgID.
    pub installed: Vec<(String, FakeHost)>,
    pub launched: RefCell<Vec<String>>,
    pub fail_rot: bool,
}

impl Automation for FakeAutomation {
    type Host = FakeHost;

    fn running_objects(&self) -> Result<Vec<(String, FakeHost)>> {
        if self.fail_rot {
            return Err(Error::Com {
                context: "GetRunningObjectTable",
                code: 0x80004005,
                message: "unspecified".into(),
            });
        }
        Ok(self.running.clone())
    }

    fn launch(&self, prog_id: &str) -> Result<FakeHost> {
        self.launched.borrow_mut().push(prog_id.into());
        self.installed
            .iter()
            .find(|(id, _)| id == prog_id)
            .map(|(_, host)| host.clone())
            .ok_or(Error::Com {
                context: "CLSIDFromProgID",
                // CO_E_CLASSSTRING
                code: 0x800401f3,
                message: "invalid class string".into(),
            })
    }
}

#[derive(Clone)]
pub struct FakeHost {
    pub solution: Option<FakeSolution>,
}

impl FakeHost {
    pub fn with_solution(solution: FakeSolution) -> Self {
        Self {
            solution: Some(solution),
        }
    }

    pub fn broken() -> Self {
        Self { solution: None }
    }
}

impl Host for FakeHost {
    type Solution = FakeSolution;

    fn solution(&self) -> Result<FakeSolution> {
        self.solution.clone().ok_or_else(|| member_error("Solution"))
    }
}

#[derive(Default)]
pub struct SolutionState {
    pub full_name: RefCell<String>,
    pub projects: Vec<FakeProject>,
    pub configurations: Vec<String>,
    pub active_configuration: RefCell<Option<String>>,
    pub startup_projects: RefCell<Option<String>>,
    pub opened: RefCell<Option<PathBuf>>,
    pub closed: Cell<bool>,
    pub fail_open: bool,
    pub fail_projects: bool,
}

#[derive(Clone, Default)]
pub struct FakeSolution(pub Rc<SolutionState>);

impl FakeSolution {
    pub fn new(full_name: &str, projects: Vec<FakeProject>, configurations: &[&str]) -> Self {
        Self(Rc::new(SolutionState {
            full_name: RefCell::new(full_name.into()),
            projects,
            configurations: configurations.iter().map(|&c| c.into()).collect(),
            ..Default::default()
        }))
    }

    pub fn state(&self) -> &SolutionState {
        &self.0
    }
}

impl Solution for FakeSolution {
    type Project = FakeProject;

    fn full_name(&self) -> Result<String> {
        Ok(self.0.full_name.borrow().clone())
    }

    fn open(&self, path: &Path) -> Result<()> {
        if self.0.fail_open {
            return Err(member_error("Open"));
        }
        *self.0.opened.borrow_mut() = Some(path.into());
        *self.0.full_name.borrow_mut() = path.display().to_string();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.0.closed.set(true);
        Ok(())
    }

    fn projects(&self) -> Result<Vec<FakeProject>> {
        if self.0.fail_projects {
            return Err(member_error("Projects"));
        }
        Ok(self.0.projects.clone())
    }

    fn activate_configuration(&self, name: &str) -> Result<()> {
        if !self.0.configurations.iter().any(|c| c == name) {
            return Err(member_error("Item"));
        }
        *self.0.active_configuration.borrow_mut() = Some(name.into());
        Ok(())
    }

    fn set_startup_projects(&self, unique_name: &str) -> Result<()> {
        *self.0.startup_projects.borrow_mut() = Some(unique_name.into());
        Ok(())
    }
}

pub struct ProjectState {
    pub name: String,
    pub fail_name: bool,
    pub unique_name: String,
    pub configurations: Vec<FakeConfiguration>,
}

#[derive(Clone)]
pub struct FakeProject(pub Rc<ProjectState>);

impl FakeProject {
    /// A project with `configurations` empty build configurations.
    pub fn new(name: &str, configurations: usize) -> Self {
        Self(Rc::new(ProjectState {
            name: name.into(),
            fail_name: false,
            unique_name: format!("{name}\\{name}.vcxproj"),
            configurations: (0..configurations)
                .map(|_| FakeConfiguration::default())
                .collect(),
        }))
    }

    /// A project whose `Name` can't be read.
    pub fn unnamed() -> Self {
        Self(Rc::new(ProjectState {
            name: String::new(),
            fail_name: true,
            unique_name: String::new(),
            configurations: Vec::new(),
        }))
    }

    pub fn working_directories(&self) -> Vec<Option<String>> {
        self.0
            .configurations
            .iter()
            .map(|c| c.0.borrow().clone())
            .collect()
    }
}

impl Project for FakeProject {
    type Configuration = FakeConfiguration;

    fn name(&self) -> Result<String> {
        if self.0.fail_name {
            return Err(member_error("Name"));
        }
        Ok(self.0.name.clone())
    }

    fn full_name(&self) -> Result<String> {
        Ok(format!("C:\\src\\{}", self.0.unique_name))
    }

    fn unique_name(&self) -> Result<String> {
        Ok(self.0.unique_name.clone())
    }

    fn configurations(&self) -> Result<Vec<FakeConfiguration>> {
        Ok(self.0.configurations.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeConfiguration(pub Rc<RefCell<Option<String>>>);

impl ProjectConfiguration for FakeConfiguration {
    fn set_debug_working_directory(&self, dir: &str) -> Result<()> {
        *self.0.borrow_mut() = Some(dir.into());
        Ok(())
    }
}
