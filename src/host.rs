//! The parts of the Visual Studio object model this crate uses.
//!
//! Each trait corresponds to one DTE automation object and has exactly the members that are needed
//! to find an IDE, open a solution and edit it. The COM implementation lives in [`crate::dte`].

use std::path::Path;

use crate::Result;

/// Access to running and launchable automation hosts.
pub trait Automation {
    type Host: Host;

    /// Snapshot the running object table.
    ///
    /// Returns the display name of each entry paired with the object, for entries that expose an
    /// automation interface.
    fn running_objects(&self) -> Result<Vec<(String, Self::Host)>>;

    /// Start a new host from its ProgID.
    fn launch(&self, prog_id: &str) -> Result<Self::Host>;
}

/// The `DTE` object.
pub trait Host {
    type Solution: Solution;

    fn solution(&self) -> Result<Self::Solution>;
}

/// The `Solution` object.
pub trait Solution {
    type Project: Project;

    /// The full path of the open solution, empty if none is open.
    fn full_name(&self) -> Result<String>;
    fn open(&self, path: &Path) -> Result<()>;
    fn close(&self) -> Result<()>;
    fn projects(&self) -> Result<Vec<Self::Project>>;
    /// Activate the solution configuration with the given name.
    fn activate_configuration(&self, name: &str) -> Result<()>;
    /// Set `SolutionBuild.StartupProjects`.
    fn set_startup_projects(&self, unique_name: &str) -> Result<()>;
}

/// A `Project` in a solution.
pub trait Project {
    type Configuration: ProjectConfiguration;

    fn name(&self) -> Result<String>;
    fn full_name(&self) -> Result<String>;
    fn unique_name(&self) -> Result<String>;
    /// The build configurations of the underlying VC project.
    fn configurations(&self) -> Result<Vec<Self::Configuration>>;
}

/// A per-project build configuration.
pub trait ProjectConfiguration {
    fn set_debug_working_directory(&self, dir: &str) -> Result<()>;
}

/// Find a project by name, ignoring case.
///
/// Stops at the first project whose name can't be read.
pub fn find_project<S: Solution>(solution: &S, name: &str) -> Result<Option<S::Project>> {
    for project in solution.projects()? {
        if eq_ignore_case(&project.name()?, name) {
            return Ok(Some(project));
        }
    }
    Ok(None)
}

/// Case-insensitive comparison, as used for project names and solution paths.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
