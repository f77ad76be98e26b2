use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::routes::{
    admin, assignments, auth, certificates, community, courses, learner, lessons, live_classes,
    public, quizzes,
};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "learnhub", description = "Courses, progress, certificates and community"),
    paths(
        auth::auth_signup_handler,
        auth::auth_signin_handler,
        auth::auth_signout_handler,
        auth::auth_me_handler,
        auth::auth_update_handler,
        auth::auth_delete_handler,
        public::public_courses_handler,
        public::public_course_detail_handler,
        public::public_certificate_handler,
        public::public_stats_handler,
        courses::courses_create_handler,
        courses::courses_mine_handler,
        courses::courses_get_handler,
        courses::courses_update_handler,
        courses::courses_delete_handler,
        courses::courses_lessons_handler,
        courses::courses_students_handler,
        courses::courses_reviews_handler,
        courses::courses_review_create_handler,
        lessons::lessons_create_handler,
        lessons::lessons_get_handler,
        lessons::lessons_update_handler,
        lessons::lessons_delete_handler,
        lessons::lessons_complete_handler,
        quizzes::quizzes_create_handler,
        quizzes::quizzes_by_course_handler,
        quizzes::quizzes_get_handler,
        quizzes::quizzes_update_handler,
        quizzes::quizzes_delete_handler,
        quizzes::quizzes_submit_handler,
        quizzes::quizzes_attempts_handler,
        learner::learner_enroll_handler,
        learner::learner_enrollments_handler,
        learner::learner_progress_handler,
        learner::learner_points_handler,
        learner::learner_points_history_handler,
        learner::learner_leaderboard_handler,
        assignments::assignments_create_handler,
        assignments::assignments_by_course_handler,
        assignments::assignments_update_handler,
        assignments::assignments_delete_handler,
        assignments::assignments_submit_handler,
        assignments::assignments_submissions_handler,
        assignments::assignments_grade_handler,
        live_classes::live_create_handler,
        live_classes::live_upcoming_handler,
        live_classes::live_by_course_handler,
        live_classes::live_update_handler,
        live_classes::live_delete_handler,
        certificates::certificates_generate_handler,
        certificates::certificates_list_handler,
        certificates::certificates_download_handler,
        community::community_messages_handler,
        community::community_post_handler,
        admin::admin_users_handler,
        admin::admin_user_role_handler,
        admin::admin_user_delete_handler,
        admin::admin_courses_handler,
        admin::admin_stats_handler,
        admin::admin_badges_handler,
        admin::admin_badge_create_handler,
        admin::admin_badge_update_handler,
        admin::admin_badge_delete_handler,
    ),
    tags(
        (name = "auth", description = "Accounts and sessions"),
        (name = "public", description = "Catalog and verification, no session needed"),
        (name = "courses", description = "Course authoring and reviews"),
        (name = "lessons", description = "Lesson content and completion"),
        (name = "quizzes", description = "Quizzes and attempts"),
        (name = "learner", description = "Enrollment, progress and points"),
        (name = "assignments", description = "Assignments and grading"),
        (name = "live-classes", description = "Scheduled live sessions"),
        (name = "certificates", description = "Completion certificates"),
        (name = "community", description = "Shared chat"),
        (name = "admin", description = "Platform administration"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
