/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for gradient-to-surface reconstruction.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Global least-squares surface reconstruction from gradient fields.
//!
//! Given two gridded gradient components `Zx` and `Zy` sampled on (possibly
//! irregular) supports `x` and `y`, this crate finds the surface `Z` whose
//! discrete derivatives best match them in the least-squares sense.
//!
//! The crate is built from three layers:
//!
//! - **Discrete orthogonal polynomials** ([`dop`]) - an orthonormal polynomial
//!   basis and its exact derivative over an arbitrary 1D support, following `1`.
//! - **Local differentiation operators** ([`diff_local`]) - banded matrices
//!   assembled from local polynomial fits of a fixed window length.
//! - **Surface reconstruction** ([`g2s`], [`g2s_sylvester`]) - the normal
//!   equations form a rank deficient Sylvester equation which is deflated by
//!   Householder reflections and solved in the eigenbasis of the normal
//!   matrices, following `2`.
//!
//! The reconstructed surface is unique only up to an additive constant.
//! Callers fix it explicitly, usually by subtracting the mean.
//!
//! Nothing here prints. Non-fatal warnings are sent to an optional
//! [`progress::ProgressSink`].
//!
//! # Examples
//!
//! ```
//! use faer::Mat;
//! use ferreus_g2s::{g2s, linspace};
//!
//! let x = linspace(-1.0, 1.0, 25);
//! let y = linspace(-1.0, 1.0, 20);
//!
//! // Gradient of z = x^2 - x y + 2 y^2
//! let zx = Mat::<f64>::from_fn(y.len(), x.len(), |i, j| 2.0 * x[j] - y[i]);
//! let zy = Mat::<f64>::from_fn(y.len(), x.len(), |i, j| 4.0 * y[i] - x[j]);
//!
//! let z = g2s(&x, &y, &zx, &zy, 3, &None).unwrap();
//!
//! // Differences are free of the additive constant: z(1, 1) - z(-1, 1)
//! let expected = 2.0 - 4.0;
//! let found = z[(19, 24)] - z[(19, 0)];
//! assert!((found - expected).abs() < 1e-8);
//! ```
//!
//! # References
//! 1.  P. O'Leary and M. Harker. An Algebraic Framework for Discrete Basis
//!     Functions in Computer Vision. IEEE ICVGIP, 2008.
//! 2.  M. Harker and P. O'Leary. Least squares surface reconstruction from
//!     measured gradient fields. IEEE CVPR, 2008.
pub mod basis;

pub mod diff_local;

pub mod sylvester;

pub mod linalg;

pub mod error;

pub mod progress;

pub use {
    basis::{dop, linspace, DiscreteBasis, RecurrenceCoefficients, Support},
    diff_local::diff_local,
    error::{G2sError, G2sResult},
    sylvester::{g2s, g2s_sylvester, DEFAULT_SUPPORT_LENGTH},
};
