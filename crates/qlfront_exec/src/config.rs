use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use qlfront_parser::ParseOptions;
use qlfront_parser::context::DEFAULT_READ_SIZE;
use qlfront_repr::scalar::ScalarValue;

use crate::errors::{ExecError, Result};

pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_PAGE_SIZE: u64 = 5000;

/// Configuration for statement processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendConfig {
    pub trace_scanning: bool,
    pub trace_parsing: bool,
    pub scanner_read_size: u64,
    pub metadata_lock_timeout_ms: u64,
    /// Rows per page when the statement has no LIMIT, 0 for no paging.
    pub default_page_size: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            trace_scanning: false,
            trace_parsing: false,
            scanner_read_size: DEFAULT_READ_SIZE as u64,
            metadata_lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FrontendConfig {
    pub fn set_from_scalar(&mut self, name: &str, value: &ScalarValue) -> Result<()> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| ExecError::UnknownSetting(name.to_string()))?;
        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| ExecError::UnknownSetting(name.to_string()))?;
        Ok((func.get)(self))
    }

    /// Reset a single setting to its default.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();
        let value = def_conf.get_as_scalar(name)?;
        self.set_from_scalar(name, &value)
    }

    /// Name and description of every setting, sorted by name.
    pub fn settings() -> Vec<(&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, funcs)| (*name, funcs.description))
            .collect();
        settings.sort_unstable();
        settings
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            trace_scanning: self.trace_scanning,
            trace_parsing: self.trace_parsing,
            read_size: self.scanner_read_size as usize,
            ..Default::default()
        }
    }

    pub fn metadata_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_lock_timeout_ms)
    }
}

struct SettingFunctions {
    description: &'static str,
    set: fn(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()>,
    get: fn(conf: &FrontendConfig) -> ScalarValue,
}

impl SettingFunctions {
    const fn new<S: FrontendSetting>() -> Self {
        SettingFunctions {
            description: S::DESCRIPTION,
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
        }
    }
}

fn insert_setting<S: FrontendSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<TraceScanning>(&mut map);
    insert_setting::<TraceParsing>(&mut map);
    insert_setting::<ScannerReadSize>(&mut map);
    insert_setting::<MetadataLockTimeoutMs>(&mut map);
    insert_setting::<DefaultPageSize>(&mut map);

    map
});

pub trait FrontendSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()>;
    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue;
}

fn expect_bool<S: FrontendSetting>(value: &ScalarValue) -> Result<bool> {
    value.try_as_bool().ok_or_else(|| ExecError::InvalidSetting {
        name: S::NAME,
        reason: format!("expected a boolean, got {value}"),
    })
}

fn expect_u64_in<S: FrontendSetting>(value: &ScalarValue, min: u64, max: u64) -> Result<u64> {
    let val = value
        .try_as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| ExecError::InvalidSetting {
            name: S::NAME,
            reason: format!("expected a non-negative integer, got {value}"),
        })?;

    if val < min || val > max {
        return Err(ExecError::InvalidSetting {
            name: S::NAME,
            reason: format!("{val} is outside the range {min}..={max}"),
        });
    }

    Ok(val)
}

pub struct TraceScanning;

impl FrontendSetting for TraceScanning {
    const NAME: &'static str = "trace_scanning";
    const DESCRIPTION: &'static str = "Log every token produced while scanning statements";

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()> {
        conf.trace_scanning = expect_bool::<Self>(value)?;
        Ok(())
    }

    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue {
        conf.trace_scanning.into()
    }
}

pub struct TraceParsing;

impl FrontendSetting for TraceParsing {
    const NAME: &'static str = "trace_parsing";
    const DESCRIPTION: &'static str = "Log grammar productions while parsing statements";

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()> {
        conf.trace_parsing = expect_bool::<Self>(value)?;
        Ok(())
    }

    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue {
        conf.trace_parsing.into()
    }
}

const MIN_READ_SIZE: u64 = 1;
const MAX_READ_SIZE: u64 = 1 << 20;

pub struct ScannerReadSize;

impl FrontendSetting for ScannerReadSize {
    const NAME: &'static str = "scanner_read_size";
    const DESCRIPTION: &'static str = "Max bytes the scanner reads from a statement at once";

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()> {
        conf.scanner_read_size = expect_u64_in::<Self>(value, MIN_READ_SIZE, MAX_READ_SIZE)?;
        Ok(())
    }

    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue {
        ScalarValue::Int64(conf.scanner_read_size as i64)
    }
}

const MAX_LOCK_TIMEOUT_MS: u64 = 60_000;

pub struct MetadataLockTimeoutMs;

impl FrontendSetting for MetadataLockTimeoutMs {
    const NAME: &'static str = "metadata_lock_timeout_ms";
    const DESCRIPTION: &'static str =
        "Milliseconds to wait for the metadata lock before failing a virtual table read";

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()> {
        conf.metadata_lock_timeout_ms = expect_u64_in::<Self>(value, 0, MAX_LOCK_TIMEOUT_MS)?;
        Ok(())
    }

    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue {
        ScalarValue::Int64(conf.metadata_lock_timeout_ms as i64)
    }
}

const MAX_PAGE_SIZE: u64 = 1_000_000;

pub struct DefaultPageSize;

impl FrontendSetting for DefaultPageSize {
    const NAME: &'static str = "default_page_size";
    const DESCRIPTION: &'static str = "Rows per page for statements without a LIMIT, 0 disables paging";

    fn set_from_scalar(value: &ScalarValue, conf: &mut FrontendConfig) -> Result<()> {
        conf.default_page_size = expect_u64_in::<Self>(value, 0, MAX_PAGE_SIZE)?;
        Ok(())
    }

    fn get_as_scalar(conf: &FrontendConfig) -> ScalarValue {
        ScalarValue::Int64(conf.default_page_size as i64)
    }
}
