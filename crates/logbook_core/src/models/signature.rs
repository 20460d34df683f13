use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::LogKind;
use crate::models::user::UserId;

// ---------------------------------------------------------------------------
// Audit record appended once per successful sign-off. Never mutated.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalSignature {
    pub id: Uuid,
    pub signer_id: UserId,
    pub entity_type: LogKind,
    pub entity_id: Uuid,

    #[serde(with = "time::serde::iso8601")]
    pub signed_at: OffsetDateTime,
}

impl DigitalSignature {
    pub fn new(signer_id: UserId, entity_type: LogKind, entity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            signer_id,
            entity_type,
            entity_id,
            signed_at: OffsetDateTime::now_utc(),
        }
    }
}
