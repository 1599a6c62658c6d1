// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Lake Loader
//!
//! Forwards newline-delimited text into a data lake pool.
//!
//! Lines are read from standard input or files ([`input`]), accumulated into a
//! [`batch::Batch`] and handed to a [`client::Loader`] whenever the batch fills
//! up or the input goes idle. The [`forwarder`] module owns that loop; the
//! [`client`] module speaks the lake service's HTTP load API.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batch;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod forwarder;
pub mod http;
pub mod input;
pub mod logger;
