// SPDX-License-Identifier: PMPL-1.0-or-later
//! OPAL Index
//!
//! Async index façade over OpenSearch-compatible engines. Query inputs are
//! turned into search bodies with `opal-query`; the engine itself sits
//! behind the [`SearchBackend`] trait, with a REST implementation
//! ([`HttpBackend`]) and an in-process one ([`MemoryBackend`]).

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod memory;

pub use backend::SearchBackend;
pub use config::{Auth, BackendConfig, IndexConfig};
pub use error::{IndexError, Result};
pub use http::HttpBackend;
pub use index::{Index, SearchInput};
pub use memory::MemoryBackend;
