use serde::Deserialize;

pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
pub const MAX_MESSAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Only messages with a greater id are returned.
    pub after_id: Option<i64>,
    pub limit: Option<i64>,
}

impl MessagesQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MessageBody {
    pub content: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let query = |limit| MessagesQuery {
            after_id: None,
            limit,
        };
        assert_eq!(query(None).limit(), DEFAULT_MESSAGE_LIMIT);
        assert_eq!(query(Some(0)).limit(), 1);
        assert_eq!(query(Some(500)).limit(), MAX_MESSAGE_LIMIT);
    }
}
