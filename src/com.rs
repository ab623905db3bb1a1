//! Helpers for initializing COM and keeping calls into a busy IDE from failing.
//!
//! The API in this crate relies on COM being initialized, as a single threaded apartment, for the
//! duration of its use. Message filters only work in a single threaded apartment.
//!
//! **WARNING**: Using any API in this crate after COM is uninitialized is Undefined Behaviour (UB).
//! If in doubt it is safer to simply not call [`uninitialize`].

use core::ffi::c_void;
use core::ptr::null_mut;

use windows_core::{GUID, IUnknown, IUnknown_Vtbl};
use windows_result::HRESULT;

use crate::OkHresult;
use crate::defs::*;
use crate::raw::{IID_IMESSAGEFILTER, IID_IUNKNOWN, IMessageFilter_Vtbl, Interface};

/// Runs the given function with COM initialized and uninitializes COM afterward.
///
/// # Safety
///
/// See [`uninitialize`].
pub unsafe fn with_com<R, F: FnOnce() -> R>(f: F) -> Result<R, HRESULT> {
    initialize()?;
    let result = f();
    // SAFETY: the caller must ensure this is safe.
    unsafe { uninitialize() };
    Ok(result)
}

/// Initialize COM as a single threaded apartment.
///
/// This needs to be called before any COM objects are created or used.
pub fn initialize() -> Result<(), HRESULT> {
    unsafe { CoInitializeEx(core::ptr::null(), COINIT_APARTMENTTHREADED) }.ok_hresult()
}

/// Uninitialize COM.
///
/// # Safety
///
/// - This must be called on the same thread that called [`initialize`].
/// - You must ensure there are no COM objects still in use before calling this.
///
/// **WARNING**: Beware of `drop` implementations that may use COM objects.
/// Calling this directly will run before any drops that are in scope.
///
/// ## Safe example
///
/// ```rust
/// use vsdte::com;
///
/// fn main() -> Result<(), vsdte::HRESULT> {
/// com::initialize()?;
/// {
///     let _filter = com::MessageFilter::register()?;
///     // do COM stuff
/// }
///
/// // SAFETY: All uses of COM are contained and dropped by the scope above.
/// # if false { // Doing these here may interfere with other tests.
/// unsafe { com::uninitialize() };
/// # }
///
/// Ok(())
/// }
/// ```
pub unsafe fn uninitialize() {
    unsafe {
        CoUninitialize();
    }
}

const SERVERCALL_ISHANDLED: u32 = 0;
const SERVERCALL_RETRYLATER: u32 = 2;
const PENDINGMSG_WAITDEFPROCESS: u32 = 2;
/// Retry immediately. Anything in `0..100` means "retry now".
const RETRY_NOW: u32 = 99;
/// `-1` cancels the call.
const CANCEL_CALL: u32 = u32::MAX;

/// What to do when the IDE rejects one of our calls.
fn retry_policy(reject_type: u32) -> u32 {
    if reject_type == SERVERCALL_RETRYLATER {
        RETRY_NOW
    } else {
        // Too busy, give up on the call.
        CANCEL_CALL
    }
}

/// A message filter that retries calls the IDE is too busy to take.
///
/// Out of process automation servers like Visual Studio reject calls while they're busy
/// (e.g. while loading a solution). Without a filter those calls fail with
/// `RPC_E_CALL_REJECTED`. The filter is registered for the current thread while this value is
/// alive and the previously registered filter is restored on drop.
pub struct MessageFilter {
    previous: Option<IUnknown>,
}

impl MessageFilter {
    pub fn register() -> Result<Self, HRESULT> {
        let mut previous: Option<IUnknown> = None;
        unsafe {
            CoRegisterMessageFilter(
                core::ptr::from_ref(&FILTER).cast_mut().cast(),
                core::ptr::from_mut(&mut previous).cast(),
            )
            .ok_hresult()?;
        }
        Ok(Self { previous })
    }
}

impl Drop for MessageFilter {
    fn drop(&mut self) {
        let previous = self.previous.as_ref().map_or(null_mut(), Interface::as_raw);
        unsafe {
            let _ = CoRegisterMessageFilter(previous, null_mut());
        }
    }
}

#[repr(C)]
struct StaticFilter {
    vtable: &'static IMessageFilter_Vtbl,
}

// There's only ever one filter object and it lives forever so reference counting is a no-op.
static FILTER: StaticFilter = StaticFilter {
    vtable: &FILTER_VTABLE,
};

static FILTER_VTABLE: IMessageFilter_Vtbl = IMessageFilter_Vtbl {
    base__: IUnknown_Vtbl {
        QueryInterface: filter_query_interface,
        AddRef: filter_add_ref,
        Release: filter_release,
    },
    HandleInComingCall: filter_handle_incoming_call,
    RetryRejectedCall: filter_retry_rejected_call,
    MessagePending: filter_message_pending,
};

unsafe extern "system" fn filter_query_interface(
    this: *mut c_void,
    iid: *const GUID,
    interface: *mut *mut c_void,
) -> HRESULT {
    if interface.is_null() {
        return E_POINTER;
    }
    unsafe {
        if !iid.is_null() && (*iid == IID_IUNKNOWN || *iid == IID_IMESSAGEFILTER) {
            *interface = this;
            S_OK
        } else {
            *interface = null_mut();
            E_NOINTERFACE
        }
    }
}

unsafe extern "system" fn filter_add_ref(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn filter_release(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn filter_handle_incoming_call(
    _this: *mut c_void,
    _call_type: u32,
    _task_caller: *mut c_void,
    _tick_count: u32,
    _interface_info: *const c_void,
) -> u32 {
    SERVERCALL_ISHANDLED
}

unsafe extern "system" fn filter_retry_rejected_call(
    _this: *mut c_void,
    _task_callee: *mut c_void,
    _tick_count: u32,
    reject_type: u32,
) -> u32 {
    retry_policy(reject_type)
}

unsafe extern "system" fn filter_message_pending(
    _this: *mut c_void,
    _task_callee: *mut c_void,
    _tick_count: u32,
    _pending_type: u32,
) -> u32 {
    PENDINGMSG_WAITDEFPROCESS
}

mod api {
    use super::*;
    #[cfg(not(target_vendor = "win7"))]
    windows_link::link!("combase.dll" "system" fn CoInitializeEx(pvReserved: *const (), dwCoInit: u32) -> HRESULT);
    #[cfg(target_vendor = "win7")]
    windows_link::link!("ole32.dll" "system" fn CoInitializeEx(pvReserved: *const (), dwCoInit: u32) -> HRESULT);
    #[cfg(not(target_vendor = "win7"))]
    windows_link::link!("combase.dll" "system" fn CoUninitialize());
    #[cfg(target_vendor = "win7")]
    windows_link::link!("ole32.dll" "system" fn CoUninitialize());
    windows_link::link!("ole32.dll" "system" fn CoRegisterMessageFilter(
        lpMessageFilter: *mut c_void,
        lplpMessageFilter: *mut *mut c_void,
    ) -> HRESULT);
}
use api::*;
