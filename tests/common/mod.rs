// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: a scripted in-memory transport plus page builders.

use async_trait::async_trait;
use club_crawler::services::transport::{HttpResponse, HttpTransport, TransportError};
use club_crawler::services::{Credentials, Crawler};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "https://club.test";

/// One scripted exchange.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Scripted {
    Respond(u16, String),
    /// Respond after a (virtual) delay, for interleaving-sensitive tests.
    RespondAfter(u64, u16, String),
    Disconnect,
}

/// In-memory [`HttpTransport`] with per-URI response queues, sticky
/// fallbacks, and a full request log.
#[derive(Default)]
pub struct ScriptedTransport {
    queues: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sticky: Mutex<HashMap<String, Scripted>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for a URI; consumed in FIFO order before
    /// any sticky response.
    pub fn enqueue(&self, uri: &str, scripted: Scripted) {
        self.queues
            .lock()
            .unwrap()
            .entry(uri.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Install a repeatable response for a URI.
    pub fn set(&self, uri: &str, scripted: Scripted) {
        self.sticky.lock().unwrap().insert(uri.to_string(), scripted);
    }

    pub fn get_count(&self, uri: &str) -> usize {
        self.gets.lock().unwrap().iter().filter(|u| *u == uri).count()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn post_count(&self, uri: &str) -> usize {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == uri)
            .count()
    }

    pub fn last_post_form(&self, uri: &str) -> Option<Vec<(String, String)>> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == uri)
            .map(|(_, form)| form.clone())
    }

    fn next_for(&self, uri: &str) -> Scripted {
        if let Some(queue) = self.queues.lock().unwrap().get_mut(uri) {
            if let Some(scripted) = queue.pop_front() {
                return scripted;
            }
        }
        if let Some(scripted) = self.sticky.lock().unwrap().get(uri) {
            return scripted.clone();
        }
        Scripted::Respond(404, String::new())
    }

    async fn resolve(scripted: Scripted) -> Result<HttpResponse, TransportError> {
        match scripted {
            Scripted::Respond(status, body) => Ok(HttpResponse { status, body }),
            Scripted::RespondAfter(millis, status, body) => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(HttpResponse { status, body })
            }
            Scripted::Disconnect => Err(TransportError::Disconnected(
                "scripted connection drop".to_string(),
            )),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError> {
        self.gets.lock().unwrap().push(uri.to_string());
        let scripted = self.next_for(uri);
        Self::resolve(scripted).await
    }

    async fn post_form(
        &self,
        uri: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let recorded = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.posts.lock().unwrap().push((uri.to_string(), recorded));
        let scripted = self.next_for(uri);
        Self::resolve(scripted).await
    }
}

// ─── Page builders ───────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn login_page() -> String {
    r#"<html><head><meta name="csrf-token" content="tok-abc123==" /></head>
    <body><form action="/session"></form></body></html>"#
        .to_string()
}

/// A signed-in response body (no logged-out marker in the prefix).
#[allow(dead_code)]
pub fn dashboard_page() -> String {
    "<html><body class=\"dashboard\"><h2>Your feed</h2></body></html>".to_string()
}

/// A signed-out response body; the marker sits well inside the scanned
/// prefix and an alert box is present.
#[allow(dead_code)]
pub fn logged_out_page() -> String {
    r#"<html><body class="logged-out">
    <div class="alert-message">Invalid email or password.</div>
    </body></html>"#
        .to_string()
}

/// Legacy markup for one single-athlete feed block.
#[allow(dead_code)]
pub fn single_block(href: &str, date: &str, updated_at: i64) -> String {
    format!(
        r#"<div class="activity entity-details feed-entry" data-updated-at="{updated_at}">
          <div class="entry-head">
            <time class="timestamp" datetime="{date} 05:38:29 UTC">{date}</time>
            <a class="entry-athlete" href="/athletes/1">Athlete</a>
          </div>
          <h3 class="entry-title activity-title"><strong><a href="{href}">Run</a></strong></h3>
        </div>"#
    )
}

/// Legacy markup for a group feed block expanding to one entry per href.
#[allow(dead_code)]
pub fn group_block(hrefs: &[&str], date: &str, updated_at: i64) -> String {
    let members: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li class="feed-entry entity-details"><a class="minimal" href="{href}">Run</a></li>"#
            )
        })
        .collect();
    format!(
        r#"<div class="feed-entry group-activity" data-updated-at="{updated_at}">
          <time class="timestamp" datetime="{date} 06:00:00 UTC">{date}</time>
          <div class="group-map"></div>
          <ul>{members}</ul>
        </div>"#
    )
}

/// A feed page of single blocks, one per (href, date), all sharing one
/// trailing cursor value.
#[allow(dead_code)]
pub fn feed_page_of(entries: &[(&str, &str)], updated_at: i64) -> String {
    let blocks: String = entries
        .iter()
        .map(|(href, date)| single_block(href, date, updated_at))
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

#[allow(dead_code)]
pub fn empty_feed_page() -> String {
    "<html><body><div class=\"feed\"></div></body></html>".to_string()
}

/// A complete, extractable detail page.
#[allow(dead_code)]
pub fn detail_page_for(athlete: &str, title: &str, date: &str) -> String {
    format!(
        r#"<html><body>
        <span class="title"><a href="/athletes/9">{athlete}</a> – <span>Run</span></span>
        <h1 class="activity-name">{title}</h1>
        <div class="details"><time datetime="{date} 05:38:29 UTC">{date}</time></div>
        <ul class="inline-stats section">
          <li><strong>6.25 km</strong><div class="label">Distance</div></li>
          <li><strong>1:18:53</strong><div class="label">Moving Time</div></li>
          <li><strong>4:25/km</strong><div class="label">Pace</div></li>
        </ul>
        </body></html>"#
    )
}

/// A detail page whose primary metrics are degenerate (not a run).
#[allow(dead_code)]
pub fn non_run_detail_page(date: &str) -> String {
    format!(
        r#"<html><body>
        <span class="title"><a href="/athletes/9">A</a> – <span>Workout</span></span>
        <h1 class="activity-name">Weights</h1>
        <div class="details"><time datetime="{date} 05:38:29 UTC">{date}</time></div>
        <ul class="inline-stats section">
          <li><strong>0.00 km</strong><div class="label">Distance</div></li>
          <li><strong>45:00</strong><div class="label">Moving Time</div></li>
        </ul>
        </body></html>"#
    )
}

/// What a deleted activity's redirect target looks like: no title marker.
#[allow(dead_code)]
pub fn redirected_dashboard_page() -> String {
    "<html><body class=\"dashboard\"><h2>Your feed</h2></body></html>".to_string()
}

// ─── Engine helpers ──────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn credentials() -> Credentials {
    Credentials {
        email: "athlete@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

/// Script a clean login flow onto the transport.
#[allow(dead_code)]
pub fn install_login(transport: &ScriptedTransport) {
    transport.set(
        &format!("{BASE}/login"),
        Scripted::Respond(200, login_page()),
    );
    transport.set(
        &format!("{BASE}/session"),
        Scripted::Respond(200, dashboard_page()),
    );
}

/// Log in over the scripted transport and return the engine.
#[allow(dead_code)]
pub async fn authenticated_crawler(transport: Arc<ScriptedTransport>) -> Crawler {
    install_login(&transport);
    Crawler::login(transport, credentials(), BASE)
        .await
        .expect("scripted login should succeed")
}

#[allow(dead_code)]
pub fn feed_root(club_id: u64) -> String {
    format!("{BASE}/clubs/{club_id}/feed?feed_type=club")
}

#[allow(dead_code)]
pub fn feed_next(club_id: u64, before: i64) -> String {
    format!("{}&before={before}&cursor={before}.0", feed_root(club_id))
}

#[allow(dead_code)]
pub fn detail_url(href: &str) -> String {
    format!("{BASE}{href}")
}
