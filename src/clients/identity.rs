use crate::error::Result;
use crate::models::AuthUser;
use async_trait::async_trait;

/// External identity collaborator. The core only ever reads the current
/// user snapshot; sign-in/up/out protocol details live behind this seam.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Latest identity snapshot, read at the point of use.
    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;
}
