//! Consent gate.  Every digest run, preview or persisted, starts here.

use uuid::Uuid;

use compass_store::{PartnerShare, SharedDatabase};

use crate::error::{DigestError, Result};

/// Return the relationship for the exact (user, partner) pair if it exists
/// and consent is currently granted.
pub async fn check_consent(db: &SharedDatabase, user_id: Uuid, partner_id: Uuid) -> Result<PartnerShare> {
    let share = db
        .call(move |db| db.find_partner_share(user_id, partner_id))
        .await?;

    match share {
        Some(share) if share.consent => Ok(share),
        _ => {
            tracing::debug!(user = %user_id, partner = %partner_id, "consent check refused");
            Err(DigestError::NoConsent {
                user_id,
                partner_id,
            })
        }
    }
}
