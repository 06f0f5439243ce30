use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubscriptionStateResponse {
    pub course_id: Uuid,
    pub is_subscribed: bool,
}

impl SubscriptionStateResponse {
    pub fn new(course_id: Uuid, is_subscribed: bool) -> Self {
        Self {
            course_id,
            is_subscribed,
        }
    }
}
