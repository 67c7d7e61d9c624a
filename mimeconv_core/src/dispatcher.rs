//! Conversion dispatch: identity short-circuit, converter lookup, one
//! converter run per request.

use crate::converter_name;
use crate::converter_process::{split_file_name, ConverterInvocation, ConverterRunner};
use crate::errors::{ConvertError, Result};
use crate::inventory::ConverterInventory;
use crate::mime_type::MimeType;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Input path that stands for standard input.
pub const STDIN_SENTINEL: &str = "-";

/// One conversion: an input and the pair of types to convert between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub src: MimeType,
    pub dest: MimeType,
}

impl ConversionRequest {
    /// Request with both types left as `application/octet-stream`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            src: MimeType::default(),
            dest: MimeType::default(),
        }
    }

    pub fn from_type(mut self, src: impl Into<MimeType>) -> Self {
        self.src = src.into();
        self
    }

    pub fn to_type(mut self, dest: impl Into<MimeType>) -> Self {
        self.dest = dest.into();
        self
    }

    pub fn is_stdin(&self) -> bool {
        self.input == Path::new(STDIN_SENTINEL)
    }
}

/// Borrows an inventory for the lifetime of the dispatcher and hands
/// resolved calls to a runner. Converters are never retried.
pub struct Dispatcher<'a, R> {
    inventory: &'a ConverterInventory,
    runner: R,
}

impl<'a, R: ConverterRunner> Dispatcher<'a, R> {
    pub fn new(inventory: &'a ConverterInventory, runner: R) -> Self {
        Self { inventory, runner }
    }

    pub fn inventory(&self) -> &ConverterInventory {
        self.inventory
    }

    /// Convert `request.input` and return the converted bytes.
    pub fn convert(&self, request: &ConversionRequest) -> Result<Vec<u8>> {
        if !request.is_stdin() && !request.input.exists() {
            return Err(ConvertError::FileNotFound(request.input.clone()));
        }

        if request.src == request.dest {
            debug!(input = ?request.input, mime = %request.src, "Identity conversion");
            return read_input(request);
        }

        let invocation = self.resolve(request)?;
        info!(
            input = ?request.input,
            src = %request.src,
            dest = %request.dest,
            converter = %invocation.converter,
            "Dispatching conversion"
        );
        self.runner.run(&invocation)
    }

    /// Look up the converter for the request's type pair.
    pub fn resolve(&self, request: &ConversionRequest) -> Result<ConverterInvocation> {
        let id = converter_name::encode(&request.src, &request.dest);
        if !self.inventory.exists(&id) {
            return Err(ConvertError::ConverterNotFound(id.to_string()));
        }

        let (extension, base_name) = split_file_name(&request.input);
        Ok(ConverterInvocation {
            converter: id.to_string(),
            program: self.inventory.path_for(&id),
            input: request.input.clone(),
            src: request.src.clone(),
            dest: request.dest.clone(),
            extension,
            base_name,
        })
    }
}

fn read_input(request: &ConversionRequest) -> Result<Vec<u8>> {
    if request.is_stdin() {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read(&request.input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records every invocation and answers with a canned result.
    struct FakeRunner {
        calls: RefCell<Vec<ConverterInvocation>>,
        outcome: fn(&ConverterInvocation) -> Result<Vec<u8>>,
    }

    impl FakeRunner {
        fn new(outcome: fn(&ConverterInvocation) -> Result<Vec<u8>>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome,
            }
        }

        fn echoing() -> Self {
            Self::new(|inv| Ok(format!("converted by {}", inv.converter).into_bytes()))
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ConverterRunner for FakeRunner {
        fn run(&self, invocation: &ConverterInvocation) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(invocation.clone());
            (self.outcome)(invocation)
        }
    }

    fn input_file(temp_dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = temp_dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_identity_returns_raw_bytes_without_runner() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = b"\x00\x01 binary \xFF payload".to_vec();
        let path = input_file(&temp_dir, "data.bin", &bytes);

        // An empty inventory proves the lookup is skipped.
        let inventory = ConverterInventory::from_names("/nowhere", Vec::<String>::new());
        let runner = FakeRunner::echoing();
        let dispatcher = Dispatcher::new(&inventory, &runner);

        for mime in ["application/octet-stream", "text/plain", "x/y"] {
            let request = ConversionRequest::new(&path).from_type(mime).to_type(mime);
            assert_eq!(dispatcher.convert(&request).unwrap(), bytes);
        }
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_default_request_is_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = input_file(&temp_dir, "plain", b"as is");
        let inventory = ConverterInventory::from_names("/nowhere", Vec::<String>::new());
        let dispatcher = Dispatcher::new(&inventory, FakeRunner::echoing());

        let request = ConversionRequest::new(&path);
        assert_eq!(request.src.as_str(), "application/octet-stream");
        assert_eq!(dispatcher.convert(&request).unwrap(), b"as is");
    }

    #[test]
    fn test_missing_input_is_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.txt");
        let inventory = ConverterInventory::from_names("/conv", ["text_plain→text_html"]);
        let runner = FakeRunner::echoing();
        let dispatcher = Dispatcher::new(&inventory, &runner);

        let request = ConversionRequest::new(&missing)
            .from_type("text/plain")
            .to_type("text/html");
        match dispatcher.convert(&request) {
            Err(ConvertError::FileNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected FileNotFound, got {:?}", other),
        }

        // Also before the identity shortcut.
        let request = ConversionRequest::new(&missing);
        assert!(matches!(
            dispatcher.convert(&request),
            Err(ConvertError::FileNotFound(_))
        ));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_unknown_pair_is_converter_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = input_file(&temp_dir, "in.ab", b"data");
        let inventory = ConverterInventory::from_names("/conv", ["c_d→a_b", "a_b→c_e"]);
        let runner = FakeRunner::echoing();
        let dispatcher = Dispatcher::new(&inventory, &runner);

        let request = ConversionRequest::new(&path).from_type("a/b").to_type("c/d");
        match dispatcher.convert(&request) {
            Err(ConvertError::ConverterNotFound(id)) => assert_eq!(id, "a_b→c_d"),
            other => panic!("expected ConverterNotFound, got {:?}", other),
        }
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_runner_receives_resolved_invocation() {
        let temp_dir = TempDir::new().unwrap();
        let path = input_file(&temp_dir, "report.final.txt", b"hello");
        let inventory = ConverterInventory::from_names("/conv", ["text_plain→text_html"]);
        let runner = FakeRunner::echoing();
        let dispatcher = Dispatcher::new(&inventory, &runner);

        let request = ConversionRequest::new(&path)
            .from_type("text/plain")
            .to_type("text/html");
        let output = dispatcher.convert(&request).unwrap();
        assert_eq!(output, b"converted by text_plain\xE2\x86\x92text_html");

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.program, Path::new("/conv").join("text_plain→text_html"));
        assert_eq!(call.input, path);
        assert_eq!(call.src.as_str(), "text/plain");
        assert_eq!(call.dest.as_str(), "text/html");
        assert_eq!(call.extension, ".txt");
        assert_eq!(call.base_name, "report.final");
    }

    #[test]
    fn test_runner_failure_propagates_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = input_file(&temp_dir, "in.txt", b"hello");
        let inventory = ConverterInventory::from_names("/conv", ["text_plain→text_html"]);
        let runner = FakeRunner::new(|inv| {
            Err(ConvertError::ConversionFailed {
                converter: inv.converter.clone(),
                exit_code: Some(4),
                stderr: "nope".to_string(),
            })
        });
        let dispatcher = Dispatcher::new(&inventory, &runner);

        let request = ConversionRequest::new(&path)
            .from_type("text/plain")
            .to_type("text/html");
        match dispatcher.convert(&request) {
            Err(ConvertError::ConversionFailed { exit_code, .. }) => assert_eq!(exit_code, Some(4)),
            other => panic!("expected ConversionFailed, got {:?}", other),
        }
        // No retry.
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_stdin_skips_existence_check() {
        let inventory = ConverterInventory::from_names("/conv", ["text_plain→text_html"]);
        let dispatcher = Dispatcher::new(&inventory, FakeRunner::echoing());

        let request = ConversionRequest::new(STDIN_SENTINEL)
            .from_type("text/plain")
            .to_type("text/html");
        assert!(request.is_stdin());

        let invocation = dispatcher.resolve(&request).unwrap();
        assert_eq!(invocation.input, Path::new("-"));
        assert_eq!(invocation.extension, "");
        assert_eq!(invocation.base_name, "-");
        assert!(dispatcher.convert(&request).is_ok());
    }
}
