use serde::{Deserialize, Serialize};
use thiserror::Error;

use cinebot_tools::UserProfile;

/// One chat turn as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("sessionId is required")]
    MissingSession,
    #[error("message is required")]
    MissingMessage,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.session_id.trim().is_empty() {
            return Err(RequestError::MissingSession);
        }
        if self.message.trim().is_empty() {
            return Err(RequestError::MissingMessage);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieCard {
    pub id: u64,
    pub reason: String,
    pub why_for_user: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub summary: String,
    pub movies: Vec<MovieCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_camel_case_session_id() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"sessionId":"abc","message":"hi","profile":{"likes":[1],"tags":["Drama"]}}"#,
        )
        .unwrap();
        assert_eq!(req.session_id, "abc");
        assert_eq!(req.profile.unwrap().likes, vec![1]);

        let resp = ChatResponse {
            summary: "s".into(),
            movies: vec![MovieCard {
                id: 7,
                reason: "r".into(),
                why_for_user: "w".into(),
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"why_for_user\":\"w\""));
    }

    #[test]
    fn missing_fields_fail_validation() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.validate(), Err(RequestError::MissingSession));
        assert_eq!(
            ChatRequest::new("s", "   ").validate(),
            Err(RequestError::MissingMessage)
        );
        assert!(ChatRequest::new("s", "hi").validate().is_ok());
    }
}
