pub mod admin;
pub mod assignments;
pub mod auth;
pub mod community;
pub mod courses;
pub mod learner;
pub mod lessons;
pub mod quizzes;
