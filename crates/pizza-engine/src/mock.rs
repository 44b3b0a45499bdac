//! Call recording for mocks
//!
//! A [`CallRecorder`] keeps an append-only list of the calls a fake made,
//! so a case can check the interaction afterwards. Clones share the same
//! list: the engine keeps one clone of every recorder it hands out and
//! destroys whatever is still alive when it ends.
//!
//! ```
//! use pizza_engine::mock::{CallRecorder, MockArg};
//!
//! let recorder = CallRecorder::new();
//! recorder.add_call("open", &[MockArg::cstr("/tmp/x"), MockArg::i32(0)], 2).unwrap();
//! recorder.add_call("close", &[], 0).unwrap();
//! assert!(recorder.expect_sequence(&["open", "close"]).is_ok());
//! ```

use crate::case::{CaseError, CaseResult};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    #[error("call recorder has been destroyed")]
    InvalidHandle,

    #[error("function name cannot be empty")]
    EmptyFunctionName,

    #[error("call to '{function}' declares {declared} arguments but only {available} were given")]
    MissingArguments {
        function: String,
        declared: usize,
        available: usize,
    },
}

/// Type tag carried by an argument snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Hex,
    Octal,
    F32,
    F64,
    WStr,
    CStr,
    CChar,
    WChar,
    Bool,
    Size,
    Any,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::I8 => "i8",
            ArgType::I16 => "i16",
            ArgType::I32 => "i32",
            ArgType::I64 => "i64",
            ArgType::U8 => "u8",
            ArgType::U16 => "u16",
            ArgType::U32 => "u32",
            ArgType::U64 => "u64",
            ArgType::Hex => "hex",
            ArgType::Octal => "octal",
            ArgType::F32 => "f32",
            ArgType::F64 => "f64",
            ArgType::WStr => "wstr",
            ArgType::CStr => "cstr",
            ArgType::CChar => "cchar",
            ArgType::WChar => "wchar",
            ArgType::Bool => "bool",
            ArgType::Size => "size",
            ArgType::Any => "any",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional naming metadata for an argument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArgAttribute {
    pub name: String,
    pub description: String,
    pub id: String,
}

/// Snapshot of one argument at call time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockArg {
    pub kind: ArgType,
    pub value: String,
    pub mutable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<ArgAttribute>,
}

impl MockArg {
    pub fn new(kind: ArgType, value: impl fmt::Display) -> Self {
        Self {
            kind,
            value: value.to_string(),
            mutable: false,
            attribute: None,
        }
    }

    pub fn i32(value: i32) -> Self {
        Self::new(ArgType::I32, value)
    }

    pub fn i64(value: i64) -> Self {
        Self::new(ArgType::I64, value)
    }

    pub fn u64(value: u64) -> Self {
        Self::new(ArgType::U64, value)
    }

    pub fn f64(value: f64) -> Self {
        Self::new(ArgType::F64, value)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ArgType::Bool, value)
    }

    pub fn cstr(value: &str) -> Self {
        Self::new(ArgType::CStr, value)
    }

    pub fn hex(value: u64) -> Self {
        Self::new(ArgType::Hex, format!("{:#x}", value))
    }

    /// Mark the argument as passed by mutable reference
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.attribute = Some(ArgAttribute {
            name: name.into(),
            description: description.into(),
            id: id.into(),
        });
        self
    }
}

impl fmt::Display for MockArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.value)?;
        if self.mutable {
            f.write_str(" (mut)")?;
        }
        if let Some(attr) = &self.attribute {
            write!(f, " [{}#{}: {}]", attr.name, attr.id, attr.description)?;
        }
        Ok(())
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub function_name: String,
    pub args: Vec<MockArg>,
}

impl CallRecord {
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

/// Append-only call list shared between clones
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    // `None` once destroyed
    calls: Rc<RefCell<Option<Vec<CallRecord>>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Some(Vec::new()))),
        }
    }

    /// Record a call with the first `num_args` entries of `args`.
    ///
    /// Extra entries are ignored. Identical calls are recorded every time.
    pub fn add_call(
        &self,
        function_name: &str,
        args: &[MockArg],
        num_args: usize,
    ) -> Result<(), MockError> {
        let mut calls = self.calls.borrow_mut();
        let calls = calls.as_mut().ok_or(MockError::InvalidHandle)?;

        if function_name.is_empty() {
            return Err(MockError::EmptyFunctionName);
        }
        if num_args > args.len() {
            return Err(MockError::MissingArguments {
                function: function_name.to_string(),
                declared: num_args,
                available: args.len(),
            });
        }

        tracing::debug!(function = function_name, args = num_args, "mock call recorded");
        calls.push(CallRecord {
            function_name: function_name.to_string(),
            args: args[..num_args].to_vec(),
        });
        Ok(())
    }

    /// Number of recorded calls
    pub fn len(&self) -> Result<usize, MockError> {
        self.with_calls(|calls| calls.len())
    }

    pub fn is_empty(&self) -> Result<bool, MockError> {
        self.with_calls(|calls| calls.is_empty())
    }

    /// Copy of every record, in call order
    pub fn calls(&self) -> Result<Vec<CallRecord>, MockError> {
        self.with_calls(|calls| calls.to_vec())
    }

    /// How many times `function_name` was called
    pub fn count_calls(&self, function_name: &str) -> Result<usize, MockError> {
        self.with_calls(|calls| {
            calls
                .iter()
                .filter(|c| c.function_name == function_name)
                .count()
        })
    }

    /// Fail the case unless the recorded call names equal `expected`
    pub fn expect_sequence(&self, expected: &[&str]) -> CaseResult {
        let actual: Vec<String> =
            self.with_calls(|calls| calls.iter().map(|c| c.function_name.clone()).collect())?;

        if actual.iter().map(String::as_str).eq(expected.iter().copied()) {
            Ok(())
        } else {
            Err(CaseError::assertion(format!(
                "expected calls {:?}, got {:?}",
                expected, actual
            )))
        }
    }

    /// Render every record, in call order
    pub fn render(&self) -> Result<String, MockError> {
        self.with_calls(format_calls)
    }

    /// Write every record to `out`, in call order. A destroyed recorder
    /// fails with an `Other` error wrapping [`MockError::InvalidHandle`];
    /// writer errors pass through unchanged.
    pub fn print_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let rendered = self
            .render()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        out.write_all(rendered.as_bytes())
    }

    /// Print every record to stdout
    pub fn print(&self) -> Result<(), MockError> {
        let rendered = self.render()?;
        print!("{}", rendered);
        Ok(())
    }

    /// Release every record. Later calls on this recorder or any clone fail.
    pub fn destroy(&self) -> Result<(), MockError> {
        self.calls
            .borrow_mut()
            .take()
            .map(|_| ())
            .ok_or(MockError::InvalidHandle)
    }

    pub fn is_destroyed(&self) -> bool {
        self.calls.borrow().is_none()
    }

    fn with_calls<T>(&self, f: impl FnOnce(&[CallRecord]) -> T) -> Result<T, MockError> {
        let calls = self.calls.borrow();
        calls
            .as_deref()
            .map(f)
            .ok_or(MockError::InvalidHandle)
    }
}

fn format_calls(calls: &[CallRecord]) -> String {
    let mut out = String::new();
    for (i, call) in calls.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({} args)",
            i + 1,
            call.function_name,
            call.arg_count()
        );
        for arg in &call.args {
            let _ = writeln!(out, "     - {}", arg);
        }
    }
    out
}

/// Run `f` against an in-memory writer and return what it wrote
pub fn capture_output<F>(f: F) -> io::Result<String>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut buffer = Vec::new();
    f(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Exact comparison of captured output with the expected text
pub fn compare_output(captured: &str, expected: &str) -> bool {
    captured == expected
}
