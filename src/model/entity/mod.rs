mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseSummaryRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonOutlineRow, LessonWithStatusRow};

mod quiz;
pub use quiz::{
    Quiz, QuizCreate, QuizOption, QuizOptionCreate, QuizQuestion, QuizQuestionCreate, score_answers,
};

mod quiz_attempt;
pub use quiz_attempt::{QuizAttempt, QuizAttemptCreate};

mod enrollment;
pub use enrollment::{CourseStudentRow, EnrolledCourseRow, Enrollment};

mod course_progress;
pub use course_progress::{CourseProgress, LessonCompletion};

mod points;
pub use points::{LeaderboardRow, PointsEntry, PointsReason};

mod badge;
pub use badge::{Badge, BadgeCreate};

mod certificate;
pub use certificate::{Certificate, CertificateCreate, CertificateRow, CertificateVerificationRow};

mod assignment;
pub use assignment::{Assignment, AssignmentCreate};

mod submission;
pub use submission::{Submission, SubmissionRow};

mod live_session;
pub use live_session::{LiveSession, LiveSessionCreate};

mod review;
pub use review::{Review, ReviewCreate, ReviewRow};

mod chat_message;
pub use chat_message::{CHAT_WRITE_LOCK, ChatMessage, MAX_MESSAGE_CHARS, normalize_message};

mod stats;
pub use stats::{AdminStats, PublicStats};
