// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for feed gateway abuse simulation.
//!
//! Drives the rate limiter with flood patterns and supplies hostile
//! payload corpora for the sanitizer and URL validator.

pub mod attacks;
pub mod generators;
pub mod metrics;
