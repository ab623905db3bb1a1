//! Walking the running object table.

use core::ffi::c_void;
use core::ptr::null_mut;

use tracing::debug;
use windows_result::HRESULT;

use crate::defs::*;
use crate::dispatch::Dispatch;
use crate::raw::{IBindCtx, IDispatch, IEnumMoniker, IMoniker, IRunningObjectTable, Interface};
use crate::{AssertOk, Error, OkHresult, Result};

/// The table of objects registered as running on this machine.
pub struct RunningObjectTable {
    raw: IRunningObjectTable,
    bind_ctx: IBindCtx,
}

impl RunningObjectTable {
    pub fn new() -> Result<Self> {
        unsafe {
            let mut raw = None;
            GetRunningObjectTable(0, &mut raw)
                .ok_hresult()
                .map_err(|e| Error::com("GetRunningObjectTable", e))?;
            let raw = raw
                .assert_ok()
                .map_err(|e| Error::com("GetRunningObjectTable", e))?;

            let mut bind_ctx = None;
            CreateBindCtx(0, &mut bind_ctx)
                .ok_hresult()
                .map_err(|e| Error::com("CreateBindCtx", e))?;
            let bind_ctx = bind_ctx
                .assert_ok()
                .map_err(|e| Error::com("CreateBindCtx", e))?;

            Ok(Self { raw, bind_ctx })
        }
    }

    /// Every entry that exposes an automation interface, paired with its display name.
    ///
    /// Entries that can't be named or bound are skipped.
    pub fn entries(&self) -> Result<Vec<(String, Dispatch)>> {
        let monikers = unsafe {
            let mut monikers = None;
            self.raw
                .EnumRunning(&mut monikers)
                .ok_hresult()
                .map_err(|e| Error::com("EnumRunning", e))?;
            monikers
                .assert_ok()
                .map_err(|e| Error::com("EnumRunning", e))?
        };

        let mut entries = Vec::new();
        while let Some(moniker) = next_moniker(&monikers)? {
            let name = match self.display_name(&moniker) {
                Ok(name) => name,
                Err(e) => {
                    debug!("skipping running object without a display name: {}", e.message());
                    continue;
                }
            };
            match self.object(&moniker) {
                Ok(object) => entries.push((name, object)),
                Err(e) => debug!("skipping running object {name}: {}", e.message()),
            }
        }
        Ok(entries)
    }

    fn display_name(&self, moniker: &IMoniker) -> Result<String, HRESULT> {
        unsafe {
            let mut name = null_mut();
            moniker
                .GetDisplayName(self.bind_ctx.as_raw(), null_mut(), &mut name)
                .ok_hresult()?;
            if name.is_null() {
                return Err(E_POINTER);
            }
            let name = TaskMemory(name);
            Ok(name.to_string_lossy())
        }
    }

    fn object(&self, moniker: &IMoniker) -> Result<Dispatch, HRESULT> {
        unsafe {
            let mut object = None;
            self.raw
                .GetObject(moniker.as_raw(), &mut object)
                .ok_hresult()?;
            let object = object.assert_ok()?;
            Ok(Dispatch::from_raw(object.cast::<IDispatch>()?))
        }
    }
}

fn next_moniker(monikers: &IEnumMoniker) -> Result<Option<IMoniker>> {
    let mut moniker = None;
    let mut fetched = 0;
    let hresult = unsafe { monikers.Next(1, &mut moniker, &mut fetched) };
    fetched_moniker(hresult, fetched, moniker)
}

/// Interpret the result of fetching one moniker. A failed call is an error even though nothing
/// was fetched.
fn fetched_moniker<T>(hresult: HRESULT, fetched: u32, moniker: Option<T>) -> Result<Option<T>> {
    if hresult.is_err() {
        Err(Error::com("IEnumMoniker::Next", hresult))
    } else if hresult == S_FALSE || fetched == 0 {
        Ok(None)
    } else {
        moniker
            .assert_ok()
            .map(Some)
            .map_err(|e| Error::com("IEnumMoniker::Next", e))
    }
}

/// A nul terminated string allocated by COM.
struct TaskMemory(*mut u16);

impl TaskMemory {
    /// # Safety
    ///
    /// The pointer must be non-null and nul terminated.
    unsafe fn to_string_lossy(&self) -> String {
        unsafe {
            let mut len = 0;
            while *self.0.add(len) != 0 {
                len += 1;
            }
            String::from_utf16_lossy(core::slice::from_raw_parts(self.0, len))
        }
    }
}

impl Drop for TaskMemory {
    fn drop(&mut self) {
        unsafe { CoTaskMemFree(self.0.cast()) }
    }
}

mod api {
    use super::*;
    windows_link::link!("ole32.dll" "system" fn GetRunningObjectTable(
        reserved: u32,
        pprot: *mut Option<IRunningObjectTable>,
    ) -> HRESULT);
    windows_link::link!("ole32.dll" "system" fn CreateBindCtx(
        reserved: u32,
        ppbc: *mut Option<IBindCtx>,
    ) -> HRESULT);
    #[cfg(not(target_vendor = "win7"))]
    windows_link::link!("combase.dll" "system" fn CoTaskMemFree(pv: *const c_void));
    #[cfg(target_vendor = "win7")]
    windows_link::link!("ole32.dll" "system" fn CoTaskMemFree(pv: *const c_void));
}
use api::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_failure_is_not_the_end() {
        // RPC_E_DISCONNECTED
        let disconnected = HRESULT(0x80010108_u32 as i32);
        match fetched_moniker::<()>(disconnected, 0, None) {
            Err(Error::Com { context, code, .. }) => {
                assert_eq!(context, "IEnumMoniker::Next");
                assert_eq!(code, 0x80010108);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(fetched_moniker::<()>(S_FALSE, 0, None), Ok(None)));
        assert!(matches!(fetched_moniker(S_OK, 1, Some(7)), Ok(Some(7))));
    }

    #[test]
    fn enumerate_running_objects() {
        crate::com::initialize().unwrap();
        let rot = RunningObjectTable::new().unwrap();
        // Whatever is running, every entry must have a name.
        for (name, _) in rot.entries().unwrap() {
            assert!(!name.is_empty());
        }
    }
}
