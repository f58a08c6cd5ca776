//! Plan upgrades triggered by the payment provider.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::Plan;

/// Why an upgrade could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("No profile with that email")]
    ProfileNotFound,

    /// More than one account shares the email; refuse to guess.
    #[error("{0} profiles share the same email")]
    AmbiguousEmail(usize),

    #[error(transparent)]
    Store(#[from] AppError),
}

/// Move the single profile registered under `email` to the pro plan.
///
/// Returns the upgraded user's ID. Safe to repeat: the end state is the same.
pub async fn upgrade_plan_by_email(
    store: &dyn ProfileStore,
    email: &str,
) -> Result<String, UpgradeError> {
    // Two is enough to tell "exactly one" from "more than one".
    let mut matches = store.find_profiles_by_email(email, 2).await?;

    let profile = match matches.len() {
        0 => return Err(UpgradeError::ProfileNotFound),
        1 => matches.remove(0),
        n => return Err(UpgradeError::AmbiguousEmail(n)),
    };

    if profile.plan == Plan::Pro {
        tracing::info!(user_id = %profile.user_id, "Profile already on pro plan");
    }

    store.set_plan(&profile.user_id, Plan::Pro).await?;

    tracing::info!(user_id = %profile.user_id, "Plan upgraded to pro");
    Ok(profile.user_id)
}
