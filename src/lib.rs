//! Edit the settings of a Visual Studio solution by driving the IDE through its automation
//! interface (DTE).
//!
//! Solution files don't store everything the IDE lets you change. Per-project debug working
//! directories, the active configuration and the startup project all live elsewhere, so the only
//! reliable way to set them is to ask a running IDE to do it. This crate finds an IDE that already
//! has the solution open, or starts a hidden one of the right version, and makes the edits there.
//!
//! The object model is described by the traits in [`host`] and everything above them is portable.
//! On Windows the [`dte`] module implements those traits over COM. The API there relies on COM
//! being initialized as a single threaded apartment; [`com::initialize`] will do this for you.
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[cfg(windows)]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use vsdte::{Error, com, dte::DteAutomation, options::Options, session};
//!
//! com::initialize().map_err(|e| Error::com("CoInitializeEx", e))?;
//! let _filter = com::MessageFilter::register().map_err(|e| Error::com("CoRegisterMessageFilter", e))?;
//! let options = Options::try_parse_from([
//!     "vstool",
//!     "--solution",
//!     r"C:\src\Game.sln",
//!     "--startup",
//!     "Game",
//! ])?;
//! let report = session::run(&DteAutomation, &options)?;
//! println!("changed: {}", report.changed());
//! # Ok(())
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```
//!
//! [`com::initialize`]: crate::com::initialize

// We should use the same style as the official documentation
#![allow(nonstandard_style)]
#![allow(clippy::upper_case_acronyms)]

mod error;
pub use error::{Error, Result};

pub mod discovery;
pub mod host;
pub mod options;
pub mod session;
pub mod version;

#[cfg(test)]
mod fake;

#[cfg(windows)]
mod defs;
#[cfg(windows)]
mod raw;

#[cfg(windows)]
pub mod com;
#[cfg(windows)]
pub mod dispatch;
#[cfg(windows)]
pub mod dte;
#[cfg(windows)]
mod rot;

#[cfg(windows)]
pub use windows_result::HRESULT;

#[cfg(windows)]
trait AssertOk {
    type T;
    fn assert_ok(self) -> Result<Self::T, HRESULT>;
}
#[cfg(windows)]
impl<T> AssertOk for Option<T> {
    type T = T;

    /// Use this for cases where an API that returns success must also have initialized a COM ptr.
    ///
    /// Panics in debug mode, returns `Err(E_POINTER)` in release mode.
    #[inline(always)]
    fn assert_ok(self) -> Result<T, HRESULT> {
        debug_assert!(self.is_some());
        self.ok_or(defs::E_POINTER)
    }
}

#[cfg(windows)]
trait OkHresult {
    fn ok_hresult(self) -> Result<(), HRESULT>;
}
#[cfg(windows)]
impl OkHresult for HRESULT {
    fn ok_hresult(self) -> Result<(), HRESULT> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}
