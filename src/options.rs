//! Command line options.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "vstool",
    about = "Edit the settings of a Visual Studio solution through the IDE"
)]
struct Args {
    /// MSVC solution name.
    #[arg(long, value_name = "solution_name", allow_hyphen_values = true)]
    solution: PathBuf,

    /// Ignore running versions of visual studio.
    #[arg(long = "use_new_vs", overrides_with = "use_new_vs")]
    use_new_vs: bool,

    /// Set working dir of a VC project.
    #[arg(
        long = "workingdir",
        num_args = 2,
        value_names = ["project", "dir"],
        action = ArgAction::Append,
        allow_hyphen_values = true,
    )]
    workingdir: Vec<String>,

    /// Set the active config for the solution.
    #[arg(long, value_name = "config", allow_hyphen_values = true)]
    config: Option<String>,

    /// Set the startup project for the solution.
    #[arg(long, value_name = "project", allow_hyphen_values = true)]
    startup: Option<String>,
}

/// What to edit, and where.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub solution: PathBuf,
    /// Start a new IDE even if one already has the solution open.
    pub use_new_vs: bool,
    /// Debug working directory for each project, by project name.
    pub working_dirs: BTreeMap<String, String>,
    /// Solution configuration to activate.
    pub config: Option<String>,
    pub startup: Option<String>,
}

impl Options {
    /// Parse options from the process arguments. The first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = Args::try_parse_from(args)?;

        let mut working_dirs = BTreeMap::new();
        let mut pairs = args.workingdir.into_iter();
        while let (Some(project), Some(dir)) = (pairs.next(), pairs.next()) {
            if working_dirs.contains_key(&project) {
                return Err(Args::command().error(
                    ErrorKind::ArgumentConflict,
                    format!("Found second --workingdir option for project {project}"),
                ));
            }
            working_dirs.insert(project, dir);
        }

        Ok(Self {
            solution: args.solution,
            use_new_vs: args.use_new_vs,
            working_dirs,
            config: args.config,
            startup: args.startup,
        })
    }

    /// The full usage text.
    pub fn usage() -> String {
        Args::command().render_help().to_string()
    }
}
