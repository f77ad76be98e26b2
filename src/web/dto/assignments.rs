use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmissionBody {
    pub content: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GradeBody {
    pub grade: i32,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl GradeBody {
    pub fn validate(&self, max_score: i32) -> Result<(), String> {
        if !(0..=max_score).contains(&self.grade) {
            return Err(format!("grade must be between 0 and {}", max_score));
        }
        Ok(())
    }
}
