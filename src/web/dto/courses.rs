use serde::{Deserialize, Serialize};

use crate::model::entity::{CourseSummaryRow, LessonOutlineRow, ReviewRow};

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: CourseSummaryRow,
    pub lessons: Vec<LessonOutlineRow>,
    pub reviews: Vec<ReviewRow>,
}
