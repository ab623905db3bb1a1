use core::ffi::c_void;

use crate::{OkHresult, defs::*};

use windows_core::{GUID, IUnknown, IUnknown_Vtbl};
use windows_result::HRESULT;

macro_rules! com_interface {
    ($(
        #[interface($iid:literal)]
        pub unsafe interface $interface:ident: $parent:ident {
            $(
                $vis:vis fn $method:ident(&self $(, $arg:ident:$ty:ty)*$(,)?) -> $rtn:ty;
            )*
        }
    )+) => {
        use crate::raw as interface;
        $(
        #[repr(transparent)]
        #[derive(Clone)]
        pub struct $interface($parent);
        #[allow(unused)]
        impl $interface {
            $(
            #[inline(always)]
            pub unsafe fn $method(
                &self,
                $(
                    $arg: $ty,
                )*
            ) -> $rtn {
                unsafe {
                    let (vtable, raw) = Interface::vtable(self);
                    ((**vtable).$method)(raw, $($arg,)*)
                }
            }
            )*
        }

        unsafe impl Interface for $interface {
            const IID: GUID = GUID::from_u128($iid);
            type Vtable = vtable::$interface;
        }
        )*

        mod vtable {
            use super::*;
            use crate::raw as interface;
            type IUnknown = IUnknown_Vtbl;

            $(
                #[repr(C)]
                pub struct $interface {
                    pub base__: $parent,
                    $(
                        pub $method: unsafe extern "system" fn(this: *mut ::core::ffi::c_void, $($arg:$ty,)*) -> $rtn,
                    )*
                }
            )+
        }
    };
}

// Replacement for the windows-rs proc macro
// This is purely for compile-time performance.
com_interface!(
    #[interface(0x_00020400_0000_0000_c000_000000000046)]
    pub unsafe interface IDispatch: IUnknown {
        pub fn GetTypeInfoCount(&self, pctinfo: *mut u32) -> HRESULT;
        pub fn GetTypeInfo(&self, iTInfo: u32, lcid: LCID, ppTInfo: *mut *mut c_void) -> HRESULT;
        pub fn GetIDsOfNames(
            &self,
            riid: *const GUID,
            rgszNames: *const LPCOLESTR,
            cNames: u32,
            lcid: LCID,
            rgDispId: *mut DISPID,
        ) -> HRESULT;
        pub fn Invoke(
            &self,
            dispIdMember: DISPID,
            riid: *const GUID,
            lcid: LCID,
            wFlags: u16,
            pDispParams: *mut DISPPARAMS,
            pVarResult: *mut VARIANT,
            pExcepInfo: *mut EXCEPINFO,
            puArgErr: *mut u32,
        ) -> HRESULT;
    }

    #[interface(0x_0000000e_0000_0000_c000_000000000046)]
    pub unsafe interface IBindCtx: IUnknown {}

    #[interface(0x_0000010c_0000_0000_c000_000000000046)]
    pub unsafe interface IPersist: IUnknown {
        pub fn GetClassID(&self, pClassID: *mut GUID) -> HRESULT;
    }

    #[interface(0x_00000109_0000_0000_c000_000000000046)]
    pub unsafe interface IPersistStream: IPersist {
        pub fn IsDirty(&self) -> HRESULT;
        pub fn Load(&self, pStm: *mut c_void) -> HRESULT;
        pub fn Save(&self, pStm: *mut c_void, fClearDirty: i32) -> HRESULT;
        pub fn GetSizeMax(&self, pcbSize: *mut u64) -> HRESULT;
    }

    #[interface(0x_0000000f_0000_0000_c000_000000000046)]
    pub unsafe interface IMoniker: IPersistStream {
        pub fn BindToObject(
            &self,
            pbc: *mut c_void,
            pmkToLeft: *mut c_void,
            riidResult: *const GUID,
            ppvResult: *mut *mut c_void,
        ) -> HRESULT;
        pub fn BindToStorage(
            &self,
            pbc: *mut c_void,
            pmkToLeft: *mut c_void,
            riid: *const GUID,
            ppvObj: *mut *mut c_void,
        ) -> HRESULT;
        pub fn Reduce(
            &self,
            pbc: *mut c_void,
            dwReduceHowFar: u32,
            ppmkToLeft: *mut *mut c_void,
            ppmkReduced: *mut *mut c_void,
        ) -> HRESULT;
        pub fn ComposeWith(
            &self,
            pmkRight: *mut c_void,
            fOnlyIfNotGeneric: i32,
            ppmkComposite: *mut *mut c_void,
        ) -> HRESULT;
        pub fn Enum(&self, fForward: i32, ppenumMoniker: *mut *mut c_void) -> HRESULT;
        pub fn IsEqual(&self, pmkOtherMoniker: *mut c_void) -> HRESULT;
        pub fn Hash(&self, pdwHash: *mut u32) -> HRESULT;
        pub fn IsRunning(
            &self,
            pbc: *mut c_void,
            pmkToLeft: *mut c_void,
            pmkNewlyRunning: *mut c_void,
        ) -> HRESULT;
        pub fn GetTimeOfLastChange(
            &self,
            pbc: *mut c_void,
            pmkToLeft: *mut c_void,
            pFileTime: *mut FILETIME,
        ) -> HRESULT;
        pub fn Inverse(&self, ppmk: *mut *mut c_void) -> HRESULT;
        pub fn CommonPrefixWith(&self, pmkOther: *mut c_void, ppmkPrefix: *mut *mut c_void) -> HRESULT;
        pub fn RelativePathTo(&self, pmkOther: *mut c_void, ppmkRelPath: *mut *mut c_void) -> HRESULT;
        pub fn GetDisplayName(
            &self,
            pbc: *mut c_void,
            pmkToLeft: *mut c_void,
            ppszDisplayName: *mut *mut u16,
        ) -> HRESULT;
    }

    #[interface(0x_00000102_0000_0000_c000_000000000046)]
    pub unsafe interface IEnumMoniker: IUnknown {
        pub fn Next(
            &self,
            celt: u32,
            rgelt: *mut Option<interface::IMoniker>,
            pceltFetched: *mut u32,
        ) -> HRESULT;
        pub fn Skip(&self, celt: u32) -> HRESULT;
        pub fn Reset(&self) -> HRESULT;
        pub fn Clone(&self, ppenum: *mut Option<interface::IEnumMoniker>) -> HRESULT;
    }

    #[interface(0x_00000010_0000_0000_c000_000000000046)]
    pub unsafe interface IRunningObjectTable: IUnknown {
        pub fn Register(
            &self,
            grfFlags: u32,
            punkObject: *mut c_void,
            pmkObjectName: *mut c_void,
            pdwRegister: *mut u32,
        ) -> HRESULT;
        pub fn Revoke(&self, dwRegister: u32) -> HRESULT;
        pub fn IsRunning(&self, pmkObjectName: *mut c_void) -> HRESULT;
        pub fn GetObject(
            &self,
            pmkObjectName: *mut c_void,
            ppunkObject: *mut Option<interface::IUnknown>,
        ) -> HRESULT;
        pub fn NoteChangeTime(&self, dwRegister: u32, pfiletime: *const FILETIME) -> HRESULT;
        pub fn GetTimeOfLastChange(&self, pmkObjectName: *mut c_void, pfiletime: *mut FILETIME) -> HRESULT;
        pub fn EnumRunning(&self, ppenumMoniker: *mut Option<interface::IEnumMoniker>) -> HRESULT;
    }
);

pub const IID_IUNKNOWN: GUID = GUID::from_u128(0x_00000000_0000_0000_c000_000000000046);
pub const IID_IMESSAGEFILTER: GUID = GUID::from_u128(0x_00000016_0000_0000_c000_000000000046);

// IMessageFilter is implemented by us rather than called, so only its vtable layout is needed.
#[repr(C)]
pub struct IMessageFilter_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub HandleInComingCall: unsafe extern "system" fn(
        this: *mut c_void,
        dwCallType: u32,
        htaskCaller: *mut c_void,
        dwTickCount: u32,
        lpInterfaceInfo: *const c_void,
    ) -> u32,
    pub RetryRejectedCall: unsafe extern "system" fn(
        this: *mut c_void,
        htaskCallee: *mut c_void,
        dwTickCount: u32,
        dwRejectType: u32,
    ) -> u32,
    pub MessagePending: unsafe extern "system" fn(
        this: *mut c_void,
        htaskCallee: *mut c_void,
        dwTickCount: u32,
        dwPendingType: u32,
    ) -> u32,
}

pub(crate) unsafe trait Interface: Sized {
    const IID: GUID;
    type Vtable;

    #[inline(always)]
    unsafe fn vtable(&self) -> (*const *mut Self::Vtable, *mut c_void) {
        unsafe {
            let raw = self.as_raw();
            let vtable = raw.cast::<*mut Self::Vtable>();
            (vtable, raw)
        }
    }

    #[inline(always)]
    fn as_raw(&self) -> *mut c_void {
        unsafe { *(core::ptr::from_ref(self).cast::<*mut c_void>()) }
    }

    #[inline(always)]
    fn cast<I: Interface>(&self) -> Result<I, HRESULT> {
        unsafe {
            let (vtable, raw) = self.vtable();
            let vtable = vtable.cast::<*mut IUnknown_Vtbl>();
            let mut interface = None;
            ((**vtable).QueryInterface)(raw, &I::IID, core::ptr::from_mut(&mut interface).cast())
                .ok_hresult()?;
            interface.ok_or(E_POINTER)
        }
    }

    unsafe fn from_raw(raw: *mut c_void) -> Self {
        unsafe { core::mem::transmute_copy(&raw) }
    }
}

unsafe impl Interface for IUnknown {
    const IID: GUID = IID_IUNKNOWN;
    type Vtable = IUnknown_Vtbl;
}
