use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RoleBody {
    /// `learner`, `instructor` or `admin`.
    pub role: String,
}
