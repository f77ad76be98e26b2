use serde::Serialize;

use crate::model::progression::BadgeProgress;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PointsSummaryResponse {
    pub total: i64,
    pub badges: BadgeProgress,
}
