//! Per-user effective permission sets and their cache.
//!
//! The effective set of a user is the union of the resolved sets of all
//! assigned roles plus direct grants, materialized to full `Permission`
//! values in catalog order. It is derived state: the cache may be dropped at
//! any time and is rebuilt from the current snapshot on the next request.
//!
//! Cache entries remember the snapshot they were computed against. After a
//! snapshot swap every older entry is ignored, so permissions resolved
//! against two different role graphs are never mixed. An optional TTL bounds
//! how long an entry can outlive a missed `invalidate` call.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use warden_contracts::{
    ids::{PermissionId, SnapshotId, UserId},
    permission::Permission,
    user::UserAuth,
};

use crate::snapshot::PolicySnapshot;

/// The fully resolved, de-duplicated permissions one user holds.
#[derive(Debug, Clone)]
pub struct EffectivePermissions {
    pub user_id: UserId,
    pub snapshot_id: SnapshotId,
    pub computed_at: DateTime<Utc>,
    /// In catalog declaration order.
    permissions: Vec<Arc<Permission>>,
    ids: HashSet<PermissionId>,
}

impl EffectivePermissions {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Permission>> {
        if !self.contains(id) {
            return None;
        }
        self.permissions.iter().find(|p| p.id.as_str() == id)
    }

    /// Entries granting `action` on `resource`, in catalog order.
    pub fn candidates<'a>(
        &'a self,
        resource: &'a str,
        action: &'a str,
    ) -> impl Iterator<Item = &'a Arc<Permission>> + 'a {
        self.permissions.iter().filter(move |p| p.matches(resource, action))
    }

    pub fn permissions(&self) -> &[Arc<Permission>] {
        &self.permissions
    }

    pub fn ids(&self) -> impl Iterator<Item = &PermissionId> {
        self.permissions.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

struct CacheEntry {
    value: Arc<EffectivePermissions>,
    stored_at: Instant,
}

/// Computes and caches effective permission sets, keyed by user id.
pub struct PermissionAggregator {
    cache: DashMap<UserId, CacheEntry>,
    ttl: Option<Duration>,
}

impl PermissionAggregator {
    /// `ttl = None` keeps entries until they are invalidated or the snapshot
    /// changes.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Return the user's effective set, from cache when still valid.
    pub fn compute_effective_permissions(
        &self,
        snapshot: &PolicySnapshot,
        user: &UserAuth,
    ) -> Arc<EffectivePermissions> {
        let cached = self.cache.get(&user.id).and_then(|entry| {
            let same_snapshot = entry.value.snapshot_id == snapshot.id;
            let fresh = self.ttl.map_or(true, |ttl| entry.stored_at.elapsed() < ttl);
            (same_snapshot && fresh).then(|| entry.value.clone())
        });
        if let Some(hit) = cached {
            return hit;
        }

        let computed = Arc::new(Self::materialize(snapshot, user));
        debug!(
            user_id = %user.id,
            snapshot_id = %snapshot.id,
            permissions = computed.len(),
            "effective permissions computed"
        );
        self.cache.insert(
            user.id.clone(),
            CacheEntry {
                value: computed.clone(),
                stored_at: Instant::now(),
            },
        );
        computed
    }

    /// Compute a user's effective set without touching the cache.
    ///
    /// Roles that cannot be resolved (unknown or quarantined) and direct
    /// grants missing from the catalog contribute nothing.
    pub fn materialize(snapshot: &PolicySnapshot, user: &UserAuth) -> EffectivePermissions {
        let mut ids: HashSet<PermissionId> = HashSet::new();

        for role_id in &user.role_ids {
            match snapshot.roles.resolve_effective_permissions(role_id) {
                Ok(set) => ids.extend(set.iter().cloned()),
                Err(e) => warn!(
                    user_id = %user.id,
                    role_id = %role_id,
                    error = %e,
                    "assigned role does not resolve; ignoring it"
                ),
            }
        }

        for permission in &user.direct_permissions {
            if snapshot.catalog.contains(permission.as_str()) {
                ids.insert(permission.clone());
            } else {
                warn!(
                    user_id = %user.id,
                    permission_id = %permission,
                    "direct grant references unknown permission; ignoring it"
                );
            }
        }

        let permissions: Vec<Arc<Permission>> = snapshot
            .catalog
            .iter()
            .filter(|p| ids.contains(p.id.as_str()))
            .cloned()
            .collect();

        EffectivePermissions {
            user_id: user.id.clone(),
            snapshot_id: snapshot.id,
            computed_at: Utc::now(),
            permissions,
            ids,
        }
    }

    pub fn invalidate(&self, user_id: &UserId) {
        self.cache.remove(user_id);
    }

    pub fn invalidate_users<'a>(&self, user_ids: impl IntoIterator<Item = &'a UserId>) {
        for user_id in user_ids {
            self.cache.remove(user_id);
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Number of cached entries, including stale ones not yet replaced.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for PermissionAggregator {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(60)))
    }
}
