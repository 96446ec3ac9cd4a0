/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error taxonomy shared by basis generation, local differentiation and surface reconstruction.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::error::Error;
use std::fmt;

/// Convenience alias for results returned by this crate.
pub type G2sResult<T> = std::result::Result<T, G2sError>;

/// Errors that can occur while building bases, differentiation operators
/// or reconstructing a surface from its gradient.
#[derive(Debug, Clone, PartialEq)]
pub enum G2sError {
    /// A basis candidate collapsed to (numerically) zero norm. This happens
    /// when the support contains duplicate points.
    NumericalDegeneracy {
        /// Basis column that could not be normalised.
        column: usize,
        /// Norm of the candidate before normalisation.
        norm: f64,
    },

    /// Window length, basis order or sample count are incompatible.
    InvalidConfiguration { reason: String },

    /// Grid, operator or support sizes disagree.
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// The deflated Sylvester system is singular. Should not occur for
    /// operators produced by [`crate::diff_local`].
    SingularConfiguration { reason: String },
}

impl G2sError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        G2sError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn singular(reason: impl Into<String>) -> Self {
        G2sError::SingularConfiguration {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for G2sError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            G2sError::NumericalDegeneracy { column, norm } => write!(
                f,
                "basis column {} has norm {:e}; the support contains duplicate points",
                column, norm
            ),
            G2sError::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            G2sError::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "dimension mismatch for {}: expected {}x{}, found {}x{}",
                what, expected.0, expected.1, found.0, found.1
            ),
            G2sError::SingularConfiguration { reason } => {
                write!(f, "singular configuration: {}", reason)
            }
        }
    }
}

impl Error for G2sError {}
