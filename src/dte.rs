//! The DTE object model, driven through [`Dispatch`].

use std::path::Path;

use crate::dispatch::{Arg, Dispatch};
use crate::host::{Automation, Host, Project, ProjectConfiguration, Solution};
use crate::rot::RunningObjectTable;
use crate::Result;

/// Finds running Visual Studio instances through the running object table and starts new ones
/// through their ProgID.
///
/// COM must be initialized on the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct DteAutomation;

impl Automation for DteAutomation {
    type Host = Dte;

    fn running_objects(&self) -> Result<Vec<(String, Dte)>> {
        let entries = RunningObjectTable::new()?.entries()?;
        Ok(entries
            .into_iter()
            .map(|(name, object)| (name, Dte(object)))
            .collect())
    }

    fn launch(&self, prog_id: &str) -> Result<Dte> {
        Dispatch::create(prog_id).map(Dte)
    }
}

/// A Visual Studio instance.
#[derive(Clone)]
pub struct Dte(Dispatch);

impl Host for Dte {
    type Solution = DteSolution;

    fn solution(&self) -> Result<DteSolution> {
        self.0.get_object("Solution").map(DteSolution)
    }
}

#[derive(Clone)]
pub struct DteSolution(Dispatch);

impl DteSolution {
    fn solution_build(&self) -> Result<Dispatch> {
        self.0.get_object("SolutionBuild")
    }
}

impl Solution for DteSolution {
    type Project = DteProject;

    fn full_name(&self) -> Result<String> {
        self.0.get_string("FullName")
    }

    fn open(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.0.call("Open", &[Arg::Str(&path)]).map(drop)
    }

    fn close(&self) -> Result<()> {
        self.0.call("Close", &[]).map(drop)
    }

    fn projects(&self) -> Result<Vec<DteProject>> {
        let projects = self.0.get_object("Projects")?.items()?;
        Ok(projects.into_iter().map(DteProject).collect())
    }

    fn activate_configuration(&self, name: &str) -> Result<()> {
        self.solution_build()?
            .get_object("SolutionConfigurations")?
            .call_object("Item", &[Arg::Str(name)])?
            .call("Activate", &[])
            .map(drop)
    }

    fn set_startup_projects(&self, unique_name: &str) -> Result<()> {
        self.solution_build()?.put("StartupProjects", unique_name)
    }
}

#[derive(Clone)]
pub struct DteProject(Dispatch);

impl Project for DteProject {
    type Configuration = DteConfiguration;

    fn name(&self) -> Result<String> {
        self.0.get_string("Name")
    }

    fn full_name(&self) -> Result<String> {
        self.0.get_string("FullName")
    }

    fn unique_name(&self) -> Result<String> {
        self.0.get_string("UniqueName")
    }

    // The VC project engine types differ between versions, so the configurations are reached
    // through the project's `Object` by name rather than through any typed interface.
    fn configurations(&self) -> Result<Vec<DteConfiguration>> {
        let configurations = self
            .0
            .get_object("Object")?
            .get_object("Configurations")?
            .items()?;
        Ok(configurations.into_iter().map(DteConfiguration).collect())
    }
}

#[derive(Clone)]
pub struct DteConfiguration(Dispatch);

impl ProjectConfiguration for DteConfiguration {
    fn set_debug_working_directory(&self, dir: &str) -> Result<()> {
        self.0
            .get_object("DebugSettings")?
            .put("WorkingDirectory", dir)
    }
}
