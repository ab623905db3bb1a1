use core::ffi::c_void;
use core::mem::ManuallyDrop;
use windows_core::GUID;
use windows_result::HRESULT;
use windows_strings::BSTR;

// Windows.Win32.Foundation.FILETIME
#[repr(C)]
#[derive(Default, Debug, Clone, Copy)]
pub struct FILETIME {
    pub dwLowDateTime: u32,
    pub dwHighDateTime: u32,
}

pub type LCID = u32;
pub type LPCOLESTR = *const u16;
pub type VARIANT_BOOL = i16;
pub type DISPID = i32;

// VARIANT stuff
// Automation only hands us a handful of types so only those are supported.

pub type VARTYPE = u16;
pub const VT_EMPTY: VARTYPE = 0;
pub const VT_NULL: VARTYPE = 1;
pub const VT_I2: VARTYPE = 2;
pub const VT_I4: VARTYPE = 3;
pub const VT_BSTR: VARTYPE = 8;
pub const VT_DISPATCH: VARTYPE = 9;
pub const VT_BOOL: VARTYPE = 11;
pub const VT_I1: VARTYPE = 16;
pub const VT_UI1: VARTYPE = 17;
pub const VT_UI2: VARTYPE = 18;
pub const VT_UI4: VARTYPE = 19;
pub const VT_I8: VARTYPE = 20;
pub const VT_UI8: VARTYPE = 21;
pub const VT_INT: VARTYPE = 22;
pub const VT_UINT: VARTYPE = 23;

// Windows.Win32.System.Variant.VARIANT
#[repr(C)]
pub struct VARIANT {
    pub vt: VARTYPE,
    wReserved1: u16,
    wReserved2: u16,
    wReserved3: u16,
    pub data: VARIANT_DATA,
}

impl VARIANT {
    pub const fn new() -> Self {
        Self {
            vt: VT_EMPTY,
            wReserved1: 0,
            wReserved2: 0,
            wReserved3: 0,
            data: VARIANT_DATA { llVal: 0 },
        }
    }

    pub fn from_i32(value: i32) -> Self {
        let mut variant = Self::new();
        variant.vt = VT_I4;
        variant.data.lVal = value;
        variant
    }

    pub fn from_bstr(value: BSTR) -> Self {
        let mut variant = Self::new();
        variant.vt = VT_BSTR;
        variant.data.bstrVal = ManuallyDrop::new(value);
        variant
    }

    /// Take the contents, leaving `VT_EMPTY` behind so nothing is freed twice.
    pub fn take(&mut self) -> VARIANT {
        core::mem::replace(self, Self::new())
    }
}

impl Default for VARIANT {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VARIANT {
    fn drop(&mut self) {
        if self.vt != VT_EMPTY {
            unsafe {
                let _ = VariantClear(self);
            }
        }
    }
}

#[repr(C)]
pub union VARIANT_DATA {
    pub llVal: u64,
    pub lVal: i32,
    pub iVal: i16,
    pub cVal: i8,
    pub boolVal: VARIANT_BOOL,
    pub bstrVal: ManuallyDrop<BSTR>,
    pub pdispVal: *mut c_void,
    // This is necessary to correctly size the union for types we don't support.
    __unknown__: [*mut (); 2],
}

// Windows.Win32.System.Com.DISPPARAMS
#[repr(C)]
pub struct DISPPARAMS {
    pub rgvarg: *mut VARIANT,
    pub rgdispidNamedArgs: *mut DISPID,
    pub cArgs: u32,
    pub cNamedArgs: u32,
}

// Windows.Win32.System.Com.EXCEPINFO
#[repr(C)]
pub struct EXCEPINFO {
    pub wCode: u16,
    pub wReserved: u16,
    pub bstrSource: BSTR,
    pub bstrDescription: BSTR,
    pub bstrHelpFile: BSTR,
    pub dwHelpContext: u32,
    pub pvReserved: *mut c_void,
    pub pfnDeferredFillIn: Option<unsafe extern "system" fn(*mut EXCEPINFO) -> HRESULT>,
    pub scode: i32,
}

impl Default for EXCEPINFO {
    fn default() -> Self {
        Self {
            wCode: 0,
            wReserved: 0,
            bstrSource: BSTR::new(),
            bstrDescription: BSTR::new(),
            bstrHelpFile: BSTR::new(),
            dwHelpContext: 0,
            pvReserved: core::ptr::null_mut(),
            pfnDeferredFillIn: None,
            scode: 0,
        }
    }
}

pub const DISPATCH_METHOD: u16 = 1;
pub const DISPATCH_PROPERTYGET: u16 = 2;
pub const DISPATCH_PROPERTYPUT: u16 = 4;
pub const DISPID_PROPERTYPUT: DISPID = -3;

pub const IID_NULL: GUID = GUID::from_u128(0);
pub const LOCALE_USER_DEFAULT: LCID = 0x0400;

pub const CLSCTX_ALL: u32 = 23;
pub const COINIT_APARTMENTTHREADED: u32 = 2;
pub const S_OK: HRESULT = HRESULT(0);
pub const S_FALSE: HRESULT = HRESULT(1);
pub const E_POINTER: HRESULT = HRESULT(0x80004003_u32 as i32);
pub const E_NOINTERFACE: HRESULT = HRESULT(0x80004002_u32 as i32);
pub const DISP_E_EXCEPTION: HRESULT = HRESULT(0x80020009_u32 as i32);

mod api {
    use super::*;
    windows_link::link!("oleaut32.dll" "system" fn VariantClear(pvarg: *mut VARIANT) -> HRESULT);
}
use api::*;

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    pub fn variant_size_align() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(size_of::<VARIANT>(), 24);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(size_of::<VARIANT>(), 16);

        assert_eq!(align_of::<VARIANT>(), 8);
    }

    #[test]
    pub fn variant_constructors() {
        let int = VARIANT::from_i32(-7);
        assert_eq!(int.vt, VT_I4);
        assert_eq!(unsafe { int.data.lVal }, -7);

        let mut text = VARIANT::from_bstr(BSTR::from("Debug"));
        let taken = text.take();
        assert_eq!(text.vt, VT_EMPTY);
        assert_eq!(taken.vt, VT_BSTR);
    }
}
