// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the crawl engine's working parts.

pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod session;
pub mod transport;

pub use crawler::Crawler;
pub use fetch::PageFetcher;
pub use session::{Credentials, Session, SessionState};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
