/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the errors raised while screening, reconstructing and scoring a single observation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use ferreus_g2s::G2sError;
use std::error::Error;
use std::fmt;

/// Convenience alias for results returned by the pipeline.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while processing an observation. All of them are
/// fatal for the observation at hand only.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The record is malformed: mismatched list lengths, no sources or
    /// non-finite values.
    InvalidRecord { reason: String },

    /// Too little data survives a stage to continue.
    InsufficientData {
        stage: &'static str,
        reason: String,
    },

    /// A configuration value is out of range.
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// The surface reconstruction failed.
    Reconstruction(G2sError),
}

impl PipelineError {
    pub(crate) fn insufficient(stage: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<G2sError> for PipelineError {
    fn from(e: G2sError) -> Self {
        PipelineError::Reconstruction(e)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidRecord { reason } => write!(f, "invalid record: {}", reason),
            PipelineError::InsufficientData { stage, reason } => {
                write!(f, "insufficient data for {}: {}", stage, reason)
            }
            PipelineError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{}': {}", name, reason)
            }
            PipelineError::Reconstruction(e) => write!(f, "reconstruction failed: {}", e),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Reconstruction(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstruction_errors_chain_their_source() {
        let inner = G2sError::InvalidConfiguration {
            reason: "even window".into(),
        };
        let err: PipelineError = inner.clone().into();
        assert!(err.to_string().contains("even window"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), inner.to_string());
    }

    #[test]
    fn other_errors_have_no_source() {
        let err = PipelineError::insufficient("beam selection", "no sources inside the beam");
        assert!(err.source().is_none());
        assert_eq!(
            err.to_string(),
            "insufficient data for beam selection: no sources inside the beam"
        );
    }
}
