//! Late bound calls on automation objects.
//!
//! The DTE object model differs between Visual Studio versions, so members are looked up by name at
//! runtime through `IDispatch` rather than through a fixed vtable.

use core::fmt;
use core::iter::once;
use core::mem::ManuallyDrop;
use core::ptr::null_mut;

use tracing::error;
use windows_core::GUID;
use windows_result::HRESULT;
use windows_strings::BSTR;

use crate::defs::*;
use crate::raw::{IDispatch, Interface};
use crate::{Error, OkHresult, Result};

/// A value returned from an automation object.
pub enum Variant {
    Empty,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Bstr(BSTR),
    Dispatch(Dispatch),
    /// A type this crate doesn't handle.
    Unknown(u16),
}

impl Variant {
    fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "nothing",
            Self::Bool(_) => "a bool",
            Self::Signed(_) | Self::Unsigned(_) => "an integer",
            Self::Bstr(_) => "a string",
            Self::Dispatch(_) => "an object",
            Self::Unknown(_) => "an unsupported type",
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Signed(n) => write!(f, "[int]{n}"),
            Self::Unsigned(n) => write!(f, "[uint]{n}"),
            Self::Bstr(bstr) => write!(f, "{bstr}"),
            Self::Dispatch(_) => write!(f, "<object>"),
            Self::Unknown(vt) => write!(f, "<unknown {vt}>"),
        }
    }
}

impl From<VARIANT> for Variant {
    fn from(mut value: VARIANT) -> Self {
        // Take what we need out of the variant and let drop clear anything else.
        let vt = value.vt;
        unsafe {
            match vt {
                VT_EMPTY | VT_NULL => Variant::Empty,
                VT_BOOL => Variant::Bool(value.data.boolVal != 0),
                VT_I1 => Variant::Signed(value.data.cVal.into()),
                VT_I2 => Variant::Signed(value.data.iVal.into()),
                VT_I4 | VT_INT => Variant::Signed(value.data.lVal.into()),
                VT_I8 => Variant::Signed(value.data.llVal as i64),
                VT_UI1 => Variant::Unsigned((value.data.llVal as u8).into()),
                VT_UI2 => Variant::Unsigned((value.data.llVal as u16).into()),
                VT_UI4 | VT_UINT => Variant::Unsigned((value.data.llVal as u32).into()),
                VT_UI8 => Variant::Unsigned(value.data.llVal),
                VT_BSTR => {
                    let mut taken = ManuallyDrop::new(value.take());
                    Variant::Bstr(ManuallyDrop::take(&mut taken.data.bstrVal))
                }
                VT_DISPATCH => {
                    let taken = ManuallyDrop::new(value.take());
                    if taken.data.pdispVal.is_null() {
                        Variant::Empty
                    } else {
                        // The variant's reference is moved into the `Dispatch`.
                        Variant::Dispatch(Dispatch::from_raw(IDispatch::from_raw(
                            taken.data.pdispVal,
                        )))
                    }
                }
                _ => Variant::Unknown(vt),
            }
        }
    }
}

/// An argument to a property or method.
#[derive(Clone, Copy, Debug)]
pub enum Arg<'a> {
    Int(i32),
    Str(&'a str),
}

impl Arg<'_> {
    fn to_variant(self) -> VARIANT {
        match self {
            Self::Int(value) => VARIANT::from_i32(value),
            Self::Str(value) => VARIANT::from_bstr(BSTR::from(value)),
        }
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

/// An automation object.
#[derive(Clone)]
pub struct Dispatch {
    raw: IDispatch,
}

impl Dispatch {
    /// Create a new instance of the class registered for `prog_id`.
    ///
    /// This will fail if COM is not already initialized.
    pub fn create(prog_id: &str) -> Result<Self> {
        let prog_id = wide(prog_id);
        unsafe {
            let mut clsid = GUID::from_u128(0);
            CLSIDFromProgID(prog_id.as_ptr(), &mut clsid)
                .ok_hresult()
                .map_err(|e| Error::com("CLSIDFromProgID", e))?;

            let mut interface = null_mut();
            CoCreateInstance(
                &clsid,
                null_mut(),
                CLSCTX_ALL,
                &IDispatch::IID,
                &mut interface,
            )
            .ok_hresult()
            .map_err(|e| Error::com("CoCreateInstance", e))?;
            if interface.is_null() {
                return Err(Error::com("CoCreateInstance", E_POINTER));
            }
            Ok(Self::from_raw(IDispatch::from_raw(interface)))
        }
    }

    /// Get a property.
    pub fn get(&self, name: &str) -> Result<Variant> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    /// Set a property.
    pub fn put<'a>(&self, name: &str, value: impl Into<Arg<'a>>) -> Result<()> {
        self.invoke(name, DISPATCH_PROPERTYPUT, &[value.into()])
            .map(drop)
    }

    /// Call a method.
    pub fn call(&self, name: &str, args: &[Arg<'_>]) -> Result<Variant> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.get(name)? {
            Variant::Bstr(bstr) => Ok(bstr.to_string()),
            // A missing string is reported as empty.
            Variant::Empty => Ok(String::new()),
            other => Err(unexpected(name, "a string", &other)),
        }
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        match self.get(name)? {
            Variant::Signed(n) => i32::try_from(n).map_err(|_| unexpected_int(name)),
            Variant::Unsigned(n) => i32::try_from(n).map_err(|_| unexpected_int(name)),
            other => Err(unexpected(name, "an integer", &other)),
        }
    }

    pub fn get_object(&self, name: &str) -> Result<Dispatch> {
        into_object(name, self.get(name)?)
    }

    pub fn call_object(&self, name: &str, args: &[Arg<'_>]) -> Result<Dispatch> {
        into_object(name, self.call(name, args)?)
    }

    /// The items of a 1-based automation collection (anything with `Count` and `Item(i)`).
    pub fn items(&self) -> Result<Vec<Dispatch>> {
        let count = self.get_i32("Count")?;
        (1..=count)
            .map(|i| self.call_object("Item", &[Arg::Int(i)]))
            .collect()
    }

    fn invoke(&self, name: &str, flags: u16, args: &[Arg<'_>]) -> Result<Variant> {
        let result = self.try_invoke(name, flags, args);
        if let Err(e) = &result {
            error!("Error accessing \"{name}\"");
            error!("{e}");
        }
        result
    }

    fn try_invoke(&self, name: &str, flags: u16, args: &[Arg<'_>]) -> Result<Variant> {
        let id = self.dispid(name)?;

        // Arguments are passed in reverse order.
        let mut args: Vec<VARIANT> = args.iter().rev().map(|arg| arg.to_variant()).collect();
        let mut put_id = DISPID_PROPERTYPUT;
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let mut params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: if is_put {
                core::ptr::from_mut(&mut put_id)
            } else {
                null_mut()
            },
            cArgs: args.len() as u32,
            cNamedArgs: is_put.into(),
        };

        // Property puts don't return anything.
        let mut result = VARIANT::new();
        let result_ptr = if is_put {
            null_mut()
        } else {
            core::ptr::from_mut(&mut result)
        };
        let mut exception = EXCEPINFO::default();
        let mut arg_err = 0;
        let hresult = unsafe {
            self.raw.Invoke(
                id,
                &IID_NULL,
                LOCALE_USER_DEFAULT,
                flags,
                &mut params,
                result_ptr,
                &mut exception,
                &mut arg_err,
            )
        };
        if hresult.is_err() {
            return Err(member_error(name, hresult, exception));
        }
        Ok(result.into())
    }

    fn dispid(&self, name: &str) -> Result<DISPID> {
        let wide_name = wide(name);
        let names = [wide_name.as_ptr()];
        let mut id = 0;
        unsafe {
            self.raw
                .GetIDsOfNames(&IID_NULL, names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
                .ok_hresult()
                .map_err(|e| member_error(name, e, EXCEPINFO::default()))?;
        }
        Ok(id)
    }

    pub(crate) fn from_raw(raw: IDispatch) -> Dispatch {
        Dispatch { raw }
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(once(0)).collect()
}

fn into_object(name: &str, value: Variant) -> Result<Dispatch> {
    match value {
        Variant::Dispatch(object) => Ok(object),
        other => Err(unexpected(name, "an object", &other)),
    }
}

fn unexpected(name: &str, expected: &'static str, got: &Variant) -> Error {
    error!("\"{name}\" returned {}, expected {expected}", got.kind());
    Error::UnexpectedType {
        member: name.into(),
        expected,
    }
}

fn unexpected_int(name: &str) -> Error {
    error!("\"{name}\" is out of range for a 32-bit integer");
    Error::UnexpectedType {
        member: name.into(),
        expected: "a 32-bit integer",
    }
}

fn member_error(name: &str, hresult: HRESULT, mut exception: EXCEPINFO) -> Error {
    let mut message = hresult.message();
    if hresult == DISP_E_EXCEPTION {
        if let Some(fill) = exception.pfnDeferredFillIn {
            unsafe {
                let _ = fill(&mut exception);
            }
        }
        if !exception.bstrDescription.is_empty() {
            message = exception.bstrDescription.to_string();
        }
    }
    Error::Member {
        member: name.into(),
        code: hresult.0 as u32,
        message,
    }
}

mod api {
    use super::*;
    #[cfg(not(target_vendor = "win7"))]
    windows_link::link!("combase.dll" "system" fn CoCreateInstance(
        rclsid: *const GUID,
        pUnkOuter: *mut core::ffi::c_void,
        dwClsContext: u32,
        riid: *const GUID,
        ppv: *mut *mut core::ffi::c_void,
    ) -> HRESULT);
    #[cfg(target_vendor = "win7")]
    windows_link::link!("ole32.dll" "system" fn CoCreateInstance(
        rclsid: *const GUID,
        pUnkOuter: *mut core::ffi::c_void,
        dwClsContext: u32,
        riid: *const GUID,
        ppv: *mut *mut core::ffi::c_void,
    ) -> HRESULT);
    #[cfg(not(target_vendor = "win7"))]
    windows_link::link!("combase.dll" "system" fn CLSIDFromProgID(
        lpszProgID: *const u16,
        lpclsid: *mut GUID,
    ) -> HRESULT);
    #[cfg(target_vendor = "win7")]
    windows_link::link!("ole32.dll" "system" fn CLSIDFromProgID(
        lpszProgID: *const u16,
        lpclsid: *mut GUID,
    ) -> HRESULT);
}
use api::*;
