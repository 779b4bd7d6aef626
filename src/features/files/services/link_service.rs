use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::LinkCacheConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{CreateLinkRequest, ResolvedLink, UpdateLinkRequest};
use crate::features::files::models::{PermissionTier, ResourceType, ShareableLink, REC_LINK};
use crate::modules::store::{self, DocumentStoreRef, IDX_BY_RESOURCE};

/// Shareable Link Manager: issues token-addressed links to files and folders
/// and resolves them on access, with an in-process TTL cache over per-resource
/// link listings.
pub struct LinkService {
    store: DocumentStoreRef,
    /// Listing cache keyed by `{type}#{id}`. TTL- and capacity-bounded;
    /// mutations invalidate only the affected resource's entry.
    cache: Cache<String, Arc<Vec<ShareableLink>>>,
}

impl LinkService {
    pub fn new(store: DocumentStoreRef, config: &LinkCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { store, cache }
    }

    /// Create a shareable link for one file or folder.
    pub async fn create_link(&self, request: CreateLinkRequest) -> Result<ShareableLink> {
        let resource_type = ResourceType::parse(&request.resource_type)?;
        if request.resource_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Resource id must not be empty".to_string(),
            ));
        }
        let permission = PermissionTier::parse(&request.permission)?;
        let password_hash = match request.password.as_deref() {
            Some("") => {
                return Err(AppError::InvalidArgument(
                    "Password must not be empty".to_string(),
                ))
            }
            Some(password) => Some(hash_password(password)),
            None => None,
        };
        if let Some(max_uses) = request.max_uses {
            if max_uses <= 0 {
                return Err(AppError::InvalidArgument(
                    "Max uses must be positive".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let link = ShareableLink {
            token: Uuid::new_v4().simple().to_string(),
            resource_type,
            resource_id: request.resource_id.clone(),
            permission,
            is_public: request.is_public,
            password_hash,
            expires_at: request.expires_at,
            max_uses: request.max_uses,
            current_uses: 0,
            created_by: request.created_by,
            is_active: true,
            metadata: request.metadata,
            resource_key: ShareableLink::resource_key(resource_type, &request.resource_id),
            created_at: now,
            updated_at: now,
        };

        self.store
            .put(&link.record_key(), store::to_document(REC_LINK, &link)?)
            .await?;
        self.cache.invalidate(&link.resource_key).await;

        info!(
            "Created {} link for {} (expires: {:?}, max uses: {:?})",
            request.permission, link.resource_key, link.expires_at, link.max_uses
        );
        Ok(link)
    }

    /// All links issued for one resource, newest first. Served from the
    /// in-process cache within its TTL.
    pub async fn list_links_for_resource(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<ShareableLink>> {
        let key = ShareableLink::resource_key(resource_type, resource_id);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Link listing cache hit for {}", key);
            return Ok((*cached).clone());
        }

        let docs = self.store.query_index(IDX_BY_RESOURCE, &key).await?;
        let mut links = Vec::with_capacity(docs.len());
        for doc in docs {
            if store::record_type(&doc) != Some(REC_LINK) {
                continue;
            }
            links.push(store::from_document::<ShareableLink>(doc)?);
        }
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.cache.insert(key, Arc::new(links.clone())).await;
        Ok(links)
    }

    /// Resolve a link token on access.
    ///
    /// Inactive links are reported exactly like absent ones; expiry beats
    /// remaining uses. A successful resolution counts as one use (atomic
    /// increment-with-check at the store, so concurrent callers cannot
    /// exceed the cap) before the grant is returned.
    pub async fn resolve_link(
        &self,
        token: &str,
        password: Option<&str>,
    ) -> Result<ResolvedLink> {
        let key = ShareableLink::key_for(token);
        let link: ShareableLink = match self.store.get(&key).await {
            Ok(Some(doc)) => store::from_document(doc)?,
            Ok(None) => return Err(AppError::NotFound("Link not found".to_string())),
            // Public resolution path: no store internals in the message.
            Err(_) => {
                return Err(AppError::StoreUnavailable(
                    "Link resolution temporarily unavailable".to_string(),
                ))
            }
        };
        if !link.is_active {
            return Err(AppError::NotFound("Link not found".to_string()));
        }

        if let Some(expires_at) = link.expires_at {
            if Utc::now() > expires_at {
                return Err(AppError::PreconditionFailed(
                    "Link has expired".to_string(),
                ));
            }
        }
        if let Some(max_uses) = link.max_uses {
            if link.current_uses >= max_uses {
                return Err(AppError::PreconditionFailed(
                    "Link has no remaining uses".to_string(),
                ));
            }
        }
        if let Some(expected) = &link.password_hash {
            if !password_matches(password, expected) {
                return Err(AppError::PreconditionFailed(
                    "Invalid link password".to_string(),
                ));
            }
        }

        // The use is consumed before the caller gets the grant. `None` here
        // means a concurrent resolution took the last use.
        let counted = self
            .store
            .increment_within_limit(&key, "current_uses", link.max_uses)
            .await?;
        if counted.is_none() {
            return Err(AppError::PreconditionFailed(
                "Link has no remaining uses".to_string(),
            ));
        }

        debug!("Resolved link {} for {}", token, link.resource_key);
        Ok(ResolvedLink {
            permission: link.permission,
            resource_type: link.resource_type,
            resource_id: link.resource_id,
            is_public: link.is_public,
        })
    }

    /// Patch an existing link.
    pub async fn update_link(
        &self,
        token: &str,
        request: UpdateLinkRequest,
    ) -> Result<ShareableLink> {
        let key = ShareableLink::key_for(token);
        let mut link: ShareableLink = match self.store.get(&key).await? {
            Some(doc) => store::from_document(doc)?,
            None => return Err(AppError::NotFound("Link not found".to_string())),
        };

        if let Some(permission) = &request.permission {
            link.permission = PermissionTier::parse(permission)?;
        }
        if let Some(is_public) = request.is_public {
            link.is_public = is_public;
        }
        if request.clear_password {
            link.password_hash = None;
        } else if let Some(password) = request.password.as_deref() {
            if password.is_empty() {
                return Err(AppError::InvalidArgument(
                    "Password must not be empty".to_string(),
                ));
            }
            link.password_hash = Some(hash_password(password));
        }
        if request.clear_expiry {
            link.expires_at = None;
        } else if let Some(expires_at) = request.expires_at {
            link.expires_at = Some(expires_at);
        }
        if request.clear_max_uses {
            link.max_uses = None;
        } else if let Some(max_uses) = request.max_uses {
            if max_uses <= 0 {
                return Err(AppError::InvalidArgument(
                    "Max uses must be positive".to_string(),
                ));
            }
            link.max_uses = Some(max_uses);
        }
        if let Some(is_active) = request.is_active {
            link.is_active = is_active;
        }
        if let Some(metadata) = request.metadata {
            link.metadata = Some(metadata);
        }
        link.updated_at = Utc::now();

        self.store
            .put(&key, store::to_document(REC_LINK, &link)?)
            .await?;
        // Key-scoped invalidation: only this resource's listing is evicted.
        self.cache.invalidate(&link.resource_key).await;
        Ok(link)
    }

    /// Delete a link outright.
    pub async fn delete_link(&self, token: &str) -> Result<()> {
        let key = ShareableLink::key_for(token);
        let link: ShareableLink = match self.store.get(&key).await? {
            Some(doc) => store::from_document(doc)?,
            None => return Err(AppError::NotFound("Link not found".to_string())),
        };

        self.store.delete(&key).await?;
        self.cache.invalidate(&link.resource_key).await;
        info!("Deleted link {} for {}", token, link.resource_key);
        Ok(())
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Check a supplied password against a stored digest in fixed time: the
/// whole digest is always compared, with no early exit on the first
/// mismatched byte.
fn password_matches(supplied: Option<&str>, expected_hex: &str) -> bool {
    let Some(supplied) = supplied else {
        return false;
    };
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    let digest = Sha256::digest(supplied.as_bytes());
    if digest.len() != expected.len() {
        return false;
    }
    digest
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::modules::store::DocumentStore;
    use crate::shared::test_helpers::test_link_service;

    fn view_link_for(resource_id: &str) -> CreateLinkRequest {
        CreateLinkRequest {
            resource_type: "file".to_string(),
            resource_id: resource_id.to_string(),
            permission: "view".to_string(),
            is_public: true,
            password: None,
            expires_at: None,
            max_uses: None,
            metadata: None,
            created_by: "frank".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_link_validates_inputs() {
        let (links, _) = test_link_service();

        let mut bad_type = view_link_for("f1");
        bad_type.resource_type = "task".to_string();
        assert!(matches!(
            links.create_link(bad_type).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));

        let empty_id = view_link_for("   ");
        assert!(matches!(
            links.create_link(empty_id).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));

        let mut bad_tier = view_link_for("f1");
        bad_tier.permission = "owner".to_string();
        assert!(matches!(
            links.create_link(bad_tier).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));

        let mut bad_cap = view_link_for("f1");
        bad_cap.max_uses = Some(0);
        assert!(matches!(
            links.create_link(bad_cap).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_single_use_link_is_exhausted_after_one_resolve() {
        let (links, store) = test_link_service();

        let mut request = view_link_for("f1");
        request.max_uses = Some(1);
        let link = links.create_link(request).await.unwrap();

        let resolved = links.resolve_link(&link.token, None).await.unwrap();
        assert_eq!(resolved.permission, PermissionTier::View);
        assert_eq!(resolved.resource_id, "f1");

        let stored = store
            .get(&ShareableLink::key_for(&link.token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["current_uses"], json!(1));

        let err = links.resolve_link(&link.token, None).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_expired_link_fails_regardless_of_uses() {
        let (links, _) = test_link_service();

        let mut request = view_link_for("f1");
        request.max_uses = Some(100);
        request.expires_at = Some(Utc::now() - Duration::minutes(1));
        let link = links.create_link(request).await.unwrap();

        let err = links.resolve_link(&link.token, None).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_password_protected_link() {
        let (links, _) = test_link_service();

        let mut request = view_link_for("f1");
        request.password = Some("s3cret".to_string());
        let link = links.create_link(request).await.unwrap();

        assert!(matches!(
            links.resolve_link(&link.token, None).await.unwrap_err(),
            AppError::PreconditionFailed(_)
        ));
        assert!(matches!(
            links
                .resolve_link(&link.token, Some("wrong"))
                .await
                .unwrap_err(),
            AppError::PreconditionFailed(_)
        ));
        assert!(links
            .resolve_link(&link.token, Some("s3cret"))
            .await
            .is_ok());
    }

    #[test]
    fn test_password_check_rejects_missing_and_malformed_input() {
        let stored = hash_password("s3cret");
        assert!(password_matches(Some("s3cret"), &stored));
        assert!(!password_matches(Some("wrong"), &stored));
        assert!(!password_matches(None, &stored));
        // A stored value that is not a digest can never match.
        assert!(!password_matches(Some("s3cret"), "not-hex"));
        assert!(!password_matches(Some("s3cret"), "abcd"));
    }

    #[tokio::test]
    async fn test_inactive_link_reads_as_missing() {
        let (links, _) = test_link_service();

        let link = links.create_link(view_link_for("f1")).await.unwrap();
        links
            .update_link(
                &link.token,
                UpdateLinkRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = links.resolve_link(&link.token, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let missing = links.resolve_link("no-such-token", None).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_cache_is_key_scoped() {
        let (links, store) = test_link_service();

        let first = links.create_link(view_link_for("f1")).await.unwrap();
        links.create_link(view_link_for("f1")).await.unwrap();
        assert_eq!(
            links
                .list_links_for_resource(ResourceType::File, "f1")
                .await
                .unwrap()
                .len(),
            2
        );

        // Slip a third link into the store behind the cache's back.
        let mut hidden = first.clone();
        hidden.token = "hidden-token".to_string();
        store
            .put(
                &ShareableLink::key_for(&hidden.token),
                store::to_document(REC_LINK, &hidden).unwrap(),
            )
            .await
            .unwrap();

        // Cached listing still served.
        assert_eq!(
            links
                .list_links_for_resource(ResourceType::File, "f1")
                .await
                .unwrap()
                .len(),
            2
        );

        // Mutating another resource's links must not evict f1's entry.
        links.create_link(view_link_for("f2")).await.unwrap();
        assert_eq!(
            links
                .list_links_for_resource(ResourceType::File, "f1")
                .await
                .unwrap()
                .len(),
            2
        );

        // Mutating f1 itself does.
        links
            .update_link(
                &first.token,
                UpdateLinkRequest {
                    is_public: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            links
                .list_links_for_resource(ResourceType::File, "f1")
                .await
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_link() {
        let (links, _) = test_link_service();

        let link = links.create_link(view_link_for("f1")).await.unwrap();
        let updated = links
            .update_link(
                &link.token,
                UpdateLinkRequest {
                    permission: Some("download".to_string()),
                    max_uses: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.permission, PermissionTier::Download);
        assert_eq!(updated.max_uses, Some(5));

        links.delete_link(&link.token).await.unwrap();
        assert!(matches!(
            links.resolve_link(&link.token, None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            links.delete_link(&link.token).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
