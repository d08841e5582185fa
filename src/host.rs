//! Render resource hosts.
//!
//! A host turns a [`PreviewDocument`] into a revocable handle that an
//! isolated rendering surface can load. In a browser this is an object URL;
//! here it is either an in-process blob store served by the web surface
//! ([`MemoryHost`]) or a self-contained data URL ([`DataUrlHost`]).
//!
//! Only [`crate::registry::RenderResourceRegistry`] calls into a host.

use std::collections::HashMap;

use base64::Engine as _;
use serde::Serialize;
use uuid::Uuid;

use crate::error::HostError;
use crate::preview::PreviewDocument;

/// URI scheme prefix of memory-backed resources.
pub const BLOB_PREFIX: &str = "blob:model-compare/";

/// Opaque, revocable handle to a hosted preview document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RenderHandle {
    pub id: Uuid,
    /// Source for the rendering surface (iframe `src`).
    pub uri: String,
}

impl std::fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Capability to create and revoke transient rendering resources.
pub trait RenderResource {
    fn create(&mut self, document: &PreviewDocument) -> Result<RenderHandle, HostError>;

    /// Revoke a handle. Revoking an unknown or already revoked handle is a
    /// no-op.
    fn revoke(&mut self, handle: &RenderHandle);
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// In-process blob store.
#[derive(Debug, Default)]
pub struct MemoryHost {
    documents: HashMap<Uuid, PreviewDocument>,
    max_live: Option<usize>,
    max_document_bytes: Option<usize>,
    created: u64,
    revoked: u64,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of simultaneously live documents.
    pub fn with_max_live(mut self, limit: usize) -> Self {
        self.max_live = Some(limit);
        self
    }

    /// Reject documents larger than `limit` bytes.
    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = Some(limit);
        self
    }

    pub fn resolve(&self, handle: &RenderHandle) -> Option<&PreviewDocument> {
        self.documents.get(&handle.id)
    }

    pub fn resolve_id(&self, id: Uuid) -> Option<&PreviewDocument> {
        self.documents.get(&id)
    }

    pub fn is_live(&self, handle: &RenderHandle) -> bool {
        self.documents.contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.documents.len()
    }

    /// Total handles created over the host's lifetime.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Total handles revoked over the host's lifetime.
    pub fn revoked_count(&self) -> u64 {
        self.revoked
    }
}

impl RenderResource for MemoryHost {
    fn create(&mut self, document: &PreviewDocument) -> Result<RenderHandle, HostError> {
        if let Some(limit) = self.max_document_bytes {
            if document.len() > limit {
                return Err(HostError::TooLarge {
                    size: document.len(),
                    limit,
                });
            }
        }
        if let Some(limit) = self.max_live {
            if self.documents.len() >= limit {
                return Err(HostError::Exhausted {
                    live: self.documents.len(),
                    limit,
                });
            }
        }

        let id = Uuid::new_v4();
        self.documents.insert(id, document.clone());
        self.created += 1;
        Ok(RenderHandle {
            id,
            uri: format!("{BLOB_PREFIX}{id}"),
        })
    }

    fn revoke(&mut self, handle: &RenderHandle) {
        if self.documents.remove(&handle.id).is_some() {
            self.revoked += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// DataUrlHost
// ---------------------------------------------------------------------------

/// Stateless host that inlines the document into a `data:` URI.
///
/// Useful for writing standalone pages; there is nothing to revoke.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlHost;

impl RenderResource for DataUrlHost {
    fn create(&mut self, document: &PreviewDocument) -> Result<RenderHandle, HostError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(document.as_str());
        Ok(RenderHandle {
            id: Uuid::new_v4(),
            uri: format!("data:text/html;charset=utf-8;base64,{encoded}"),
        })
    }

    fn revoke(&mut self, _handle: &RenderHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::preview::build_preview;

    fn doc(body: &str) -> PreviewDocument {
        build_preview(body, &Language::Markup).expect("document")
    }

    #[test]
    fn test_memory_host_create_resolve_revoke() {
        let mut host = MemoryHost::new();
        let d = doc("<p>a</p>");
        let h = host.create(&d).expect("create");
        assert!(h.uri.starts_with(BLOB_PREFIX));
        assert_eq!(host.resolve(&h), Some(&d));
        assert_eq!(host.resolve_id(h.id), Some(&d));
        assert_eq!(host.live_count(), 1);

        host.revoke(&h);
        assert!(host.resolve(&h).is_none());
        assert_eq!(host.live_count(), 0);
        assert_eq!((host.created_count(), host.revoked_count()), (1, 1));
    }

    #[test]
    fn test_double_revoke_is_noop() {
        let mut host = MemoryHost::new();
        let h = host.create(&doc("<p>a</p>")).expect("create");
        host.revoke(&h);
        host.revoke(&h);
        assert_eq!(host.revoked_count(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut host = MemoryHost::new();
        let d = doc("<p>a</p>");
        let a = host.create(&d).expect("create");
        let b = host.create(&d).expect("create");
        assert_ne!(a, b);
        assert_eq!(host.live_count(), 2);
    }

    #[test]
    fn test_max_live_exhausts() {
        let mut host = MemoryHost::new().with_max_live(1);
        let d = doc("<p>a</p>");
        let first = host.create(&d).expect("create");
        assert_eq!(
            host.create(&d),
            Err(HostError::Exhausted { live: 1, limit: 1 })
        );
        host.revoke(&first);
        assert!(host.create(&d).is_ok());
    }

    #[test]
    fn test_max_document_bytes() {
        let mut host = MemoryHost::new().with_max_document_bytes(16);
        let d = doc("<p>far too long for sixteen bytes</p>");
        assert!(matches!(
            host.create(&d),
            Err(HostError::TooLarge { limit: 16, .. })
        ));
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn test_data_url_host_encodes_document() {
        let mut host = DataUrlHost;
        let d = doc("<p>a</p>");
        let h = host.create(&d).expect("create");
        let encoded = h
            .uri
            .strip_prefix("data:text/html;charset=utf-8;base64,")
            .expect("data prefix");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .expect("base64");
        assert_eq!(String::from_utf8(decoded).expect("utf8"), d.as_str());
    }
}
