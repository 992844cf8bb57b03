//! Cache key layout.
//!
//! All artifact keys live under `user:{uid}:page:{page}:`.

/// Prefix shared by every key belonging to `uid`.
pub fn user_prefix(uid: &str) -> String {
    format!("user:{uid}:")
}

/// Archived artifact generated against one exact base document.
pub fn artifact(uid: &str, page: &str, base_hash: &str) -> String {
    format!("user:{uid}:page:{page}:base:{base_hash}:html")
}

/// Most recent artifact for (user, page), regardless of base hash.
pub fn latest_artifact(uid: &str, page: &str) -> String {
    format!("user:{uid}:page:{page}:latest:html")
}

/// Base hash the latest artifact was built against.
pub fn latest_base_hash(uid: &str, page: &str) -> String {
    format!("user:{uid}:page:{page}:latest:basehash")
}
