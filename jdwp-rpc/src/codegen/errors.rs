// Error-code table and diagnostics

use crate::error::LookupError;
use crate::spec::ConstantSet;
use std::collections::HashMap;
use tracing::warn;

const ERROR_PREFIX: &str = "Error_";

/// Numeric JDWP error code -> symbolic name. Built once from the error
/// constant set and never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    names: HashMap<u16, String>,
}

impl ErrorTable {
    pub fn from_constants(set: &ConstantSet) -> Self {
        let mut names = HashMap::with_capacity(set.constants.len());
        for constant in &set.constants {
            let Ok(code) = u16::try_from(constant.value) else {
                warn!("Skipping error constant {} = {}", constant.name, constant.value);
                continue;
            };
            let name = constant
                .name
                .strip_prefix(ERROR_PREFIX)
                .unwrap_or(&constant.name);
            names.insert(code, name.to_string());
        }
        Self { names }
    }

    pub fn lookup(&self, code: u16) -> Result<&str, LookupError> {
        self.names
            .get(&code)
            .map(String::as_str)
            .ok_or(LookupError::UnknownErrorCode(code))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Render one log line for a failed command. Advisory only.
    pub fn diagnostic(
        &self,
        code: u16,
        request_id: u32,
        command_set_id: u8,
        command_id: u8,
        request_summary: &str,
    ) -> String {
        let name = match self.lookup(code) {
            Ok(name) => name.to_string(),
            Err(e) => e.to_string(),
        };
        format!(
            "JdwpError {}: req_id:{}, cmd:({},{}), req:{}, {}",
            code, request_id, command_set_id, command_id, request_summary, name
        )
    }
}
