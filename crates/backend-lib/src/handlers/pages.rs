// ============================
// crates/backend-lib/src/handlers/pages.rs
// ============================
use axum::response::Html;

use crate::middleware::{CurrentIdentity, SignedIn};
use crate::views;

pub async fn index(CurrentIdentity(current): CurrentIdentity) -> Html<String> {
    let summary = current.map(|identity| identity.summary());
    views::index(summary.as_ref())
}

pub async fn profile(SignedIn(identity): SignedIn) -> Html<String> {
    views::profile(&identity.summary())
}

/// Only reachable once the guard has admitted an administrator
pub async fn admin(SignedIn(identity): SignedIn) -> Html<String> {
    views::admin(&identity.summary())
}
