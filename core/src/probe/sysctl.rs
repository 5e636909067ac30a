//! Sysctl value health probing

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Probe, ProbeError};

/// Probe that compares `/proc/sys` values against expected settings
///
/// Variables use the dotted sysctl form (`net.ipv4.ip_forward`); dots map
/// to path separators under the root. A missing or unreadable file reads
/// as the empty string, so it can never equal a non-empty expectation and
/// the mismatch message shows exactly what was read.
#[derive(Debug, Clone)]
pub struct SysctlProbe {
    root: PathBuf,
    variables: Vec<(String, String)>,
}

impl SysctlProbe {
    /// Create a new sysctl probe over `/proc/sys`
    pub fn new(variables: Vec<(String, String)>) -> Self {
        Self::with_root("/proc/sys", variables)
    }

    /// Create a probe reading under an alternate root
    pub fn with_root(root: impl Into<PathBuf>, variables: Vec<(String, String)>) -> Self {
        Self {
            root: root.into(),
            variables,
        }
    }
}

/// Read one sysctl variable under `root`, trimmed; errors read as empty
pub(crate) fn read_value(root: &Path, variable: &str) -> String {
    read_path(&root.join(variable.replace('.', "/")))
}

/// Read one proc file verbatim, trimmed; errors read as empty
pub(crate) fn read_path(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|contents| contents.trim_end().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl Probe for SysctlProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        for (variable, expected) in &self.variables {
            let actual = read_value(&self.root, variable);
            if &actual != expected {
                return Err(ProbeError::Mismatch(format!(
                    "sysctl {} is \"{}\" (expected \"{}\")",
                    variable, actual, expected
                )));
            }
        }
        Ok(String::new())
    }
}
