//! Realm lookup cache
//!
//! Caches realm records by subdomain and the rendered login-page
//! description. Every realm save flushes the realm's entries, and a
//! subdomain change also flushes the old subdomain.

use realm_org::Realm;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

/// Rendered forms of a realm description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDescription {
    /// HTML for the login page
    pub html: String,
    /// Plain text for link previews
    pub text: String,
}

impl RenderedDescription {
    /// Render a markdown description.
    ///
    /// Blank lines separate paragraphs; everything else is escaped text.
    pub fn render(description: &str) -> Self {
        let paragraphs: Vec<&str> = description
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let html = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect::<Vec<_>>()
            .join("\n");
        let text = paragraphs.join(" ");
        Self { html, text }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Shared realm cache.
#[derive(Debug, Clone, Default)]
pub struct RealmCache {
    by_subdomain: Arc<RwLock<HashMap<String, Realm>>>,
    descriptions: Arc<RwLock<HashMap<Uuid, RenderedDescription>>>,
    stats: Arc<RwLock<CacheStats>>,
}

impl RealmCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached realm for a subdomain.
    pub async fn get(&self, subdomain: &str) -> Option<Realm> {
        let found = self.by_subdomain.read().await.get(subdomain).cloned();
        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    /// Cache a realm under its current subdomain.
    pub async fn put(&self, realm: &Realm) {
        self.by_subdomain
            .write()
            .await
            .insert(realm.string_id.clone(), realm.clone());
    }

    /// Drop every entry for a realm.
    pub async fn flush_realm(&self, realm: &Realm) {
        trace!(realm_id = %realm.id, "Flushing realm cache");
        self.by_subdomain
            .write()
            .await
            .retain(|subdomain, cached| cached.id != realm.id && *subdomain != realm.string_id);
        self.flush_description(realm.id).await;
    }

    /// Drop the entry for a subdomain.
    pub async fn flush_subdomain(&self, subdomain: &str) {
        self.by_subdomain.write().await.remove(subdomain);
    }

    /// Rendered description, rendering and caching it on a miss.
    pub async fn description(&self, realm: &Realm) -> RenderedDescription {
        if let Some(rendered) = self.descriptions.read().await.get(&realm.id) {
            return rendered.clone();
        }
        let rendered = RenderedDescription::render(&realm.description);
        self.descriptions
            .write()
            .await
            .insert(realm.id, rendered.clone());
        rendered
    }

    /// Drop the rendered description for a realm.
    pub async fn flush_description(&self, realm_id: Uuid) {
        self.descriptions.write().await.remove(&realm_id);
    }

    /// Hit and miss counts for subdomain lookups.
    pub async fn stats(&self) -> CacheStats {
        *self.stats.read().await
    }
}
