//! Profile lookup keyed by verified email.
//!
//! The only backing store today is [`StaticProfileStore`], which answers
//! every lookup with the same demo record. Resolvers must keep "no such
//! profile" (`Ok(None)`) distinct from a failed lookup (`Err`).

use identity::{ProfileStats, UserProfile};

const DEMO_NAME: &str = "Cuong Lam";
const DEMO_EMAIL: &str = "test@test.com";
const DEMO_AVATAR: &str = "https://cuongday.com/_next/image?url=%2Fimages%2Favatar.png&w=256&q=100";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("profile lookup failed: {0}")]
    Lookup(String),
}

#[async_trait::async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Find the profile owned by `email`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if the backing store could not be queried.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, ProfileError>;
}

/// Stub store returning the constant demo profile for any email.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProfileStore;

impl StaticProfileStore {
    #[must_use]
    pub fn demo_profile() -> UserProfile {
        UserProfile {
            name: DEMO_NAME.to_owned(),
            email: DEMO_EMAIL.to_owned(),
            avatar: DEMO_AVATAR.to_owned(),
            stats: ProfileStats { posts: 42, followers: 1234, following: 321 },
        }
    }
}

#[async_trait::async_trait]
impl ProfileResolver for StaticProfileStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserProfile>, ProfileError> {
        tracing::debug!("resolving profile from static store");
        Ok(Some(Self::demo_profile()))
    }
}
