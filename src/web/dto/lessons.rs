use serde::Serialize;
use uuid::Uuid;

use crate::model::{
    entity::{CourseProgress, LessonCompletion, LessonWithStatusRow},
    progression::ProgressStatus,
};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    video_url: Option<String>,
    order_index: i32,
    completed: bool,
}

impl From<LessonWithStatusRow> for LessonResponse {
    fn from(row: LessonWithStatusRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            content: row.content,
            video_url: row.video_url,
            order_index: row.order_index,
            completed: row.completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    course_id: Uuid,
    percentage: i32,
    status: String,
}

impl From<&CourseProgress> for ProgressResponse {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            course_id: progress.course_id(),
            percentage: progress.percentage(),
            status: progress.status().to_string(),
        }
    }
}

impl ProgressResponse {
    /// Progress of an enrollment whose row has not been written yet.
    pub fn not_started(course_id: Uuid) -> Self {
        Self {
            course_id,
            percentage: 0,
            status: ProgressStatus::YetToStart.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonCompletionResponse {
    lesson_id: Uuid,
    progress: ProgressResponse,
    newly_completed: bool,
    points_awarded: i32,
}

impl LessonCompletionResponse {
    pub fn new(lesson_id: Uuid, completion: &LessonCompletion) -> Self {
        Self {
            lesson_id,
            progress: ProgressResponse::from(&completion.progress),
            newly_completed: completion.newly_completed,
            points_awarded: completion.points_awarded,
        }
    }
}
