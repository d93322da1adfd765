//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod run;
pub mod show;
pub mod validate;

use crate::domain::CasewiseError;

/// Exit code for a failed pipeline run
pub fn exit_code_for(error: &CasewiseError) -> i32 {
    match error.root() {
        CasewiseError::Configuration(_) => 2,
        CasewiseError::Input(_) => 3,
        CasewiseError::Extraction { .. } | CasewiseError::Retrieval(_) => 4,
        _ => 5,
    }
}
