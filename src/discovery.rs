//! Finding a Visual Studio instance to work with.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, error, info};

use crate::host::{Automation, Host, Solution, eq_ignore_case};
use crate::session::Session;
use crate::version::{VersionTag, detect_version};
use crate::{Error, Result};

/// Running object table entries for the IDE start with this.
pub const DTE_MONIKER_PREFIX: &str = "!VisualStudio.DTE";

/// Get the running IDE instances, keyed by their name in the running object table.
///
/// If `open_solutions_only` is set then instances that don't have a solution open are left out.
/// Instances that fail to answer are left out too.
pub fn list_running_hosts<A: Automation>(
    automation: &A,
    open_solutions_only: bool,
) -> Result<BTreeMap<String, A::Host>> {
    let mut hosts = BTreeMap::new();
    for (name, host) in automation.running_objects()? {
        if !name.starts_with(DTE_MONIKER_PREFIX) {
            continue;
        }
        if open_solutions_only {
            match host.solution().and_then(|solution| solution.full_name()) {
                Ok(full_name) if !full_name.is_empty() => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!("skipping {name}: {e}");
                    continue;
                }
            }
        }
        hosts.insert(name, host);
    }
    Ok(hosts)
}

/// Get the IDE instance that has `solution` open.
///
/// `solution` should be an absolute path. Paths are compared ignoring case.
pub fn find_host_for_solution<A: Automation>(
    automation: &A,
    solution: &Path,
) -> Result<Option<A::Host>> {
    let wanted = solution.to_string_lossy();
    Ok(list_running_hosts(automation, true)?
        .into_values()
        .find(|host| {
            host.solution()
                .and_then(|s| s.full_name())
                .is_ok_and(|full_name| eq_ignore_case(&full_name, &wanted))
        }))
}

/// Start a new IDE of the given version and open `solution` in it.
pub fn launch_host<A: Automation>(
    automation: &A,
    version: VersionTag,
    solution: &Path,
) -> Result<(A::Host, <A::Host as Host>::Solution)> {
    let host = automation.launch(version.prog_id())?;
    info!("  Reading solution: \"{}\"", solution.display());
    let opened = host.solution()?;
    opened.open(solution)?;
    Ok((host, opened))
}

/// Get an IDE and solution for `solution`, reusing a running IDE unless `use_new_vs` is set.
pub fn discover<A: Automation>(
    automation: &A,
    solution: &Path,
    use_new_vs: bool,
) -> Result<Session<A::Host>> {
    let path = std::path::absolute(solution).map_err(|source| Error::ReadSolution {
        path: solution.into(),
        source,
    })?;

    info!("Looking for existing VisualStudio instance...");
    if !use_new_vs && let Some(host) = find_host_for_solution(automation, &path)? {
        let solution = host.solution()?;
        return Ok(Session::new(host, solution, true));
    }

    info!("  Didn't find open solution, starting new background VisualStudio instance...");
    match start_new(automation, &path) {
        Ok((host, solution)) => Ok(Session::new(host, solution, false)),
        Err(e) => {
            error!("{e}");
            error!("Quitting due to error opening: {}", path.display());
            Err(Error::Discovery {
                path,
                source: Box::new(e),
            })
        }
    }
}

fn start_new<A: Automation>(
    automation: &A,
    solution: &Path,
) -> Result<(A::Host, <A::Host as Host>::Solution)> {
    info!("  Reading .sln file version...");
    let version = detect_version(solution)?;
    info!("  Using version: {version}...");
    launch_host(automation, version, solution)
}
