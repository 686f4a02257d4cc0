//! Request DTOs for the API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /notifications
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyRequest {
    /// Destination address for the notification
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Message body
    #[serde(default)]
    pub body: String,
}

impl NotifyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.recipient.is_empty() {
            return Some("recipient cannot be empty".to_string());
        }
        if !self.recipient.contains('@') {
            return Some("recipient must be a valid address".to_string());
        }
        if self.recipient.len() > 254 {
            return Some("recipient exceeds maximum length of 254 characters".to_string());
        }
        if self.subject.is_empty() {
            return Some("subject cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_request_deserialize() {
        let json = r#"{"recipient": "a@example.com", "subject": "hi"}"#;
        let req: NotifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.recipient, "a@example.com");
        assert_eq!(req.subject, "hi");
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_notify_request_valid() {
        let req = NotifyRequest {
            recipient: "a@example.com".to_string(),
            subject: "hi".to_string(),
            body: "hello".to_string(),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_notify_request_rejects_empty_recipient() {
        let req = NotifyRequest {
            recipient: String::new(),
            subject: "hi".to_string(),
            body: String::new(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_notify_request_rejects_bad_address() {
        let req = NotifyRequest {
            recipient: "not-an-address".to_string(),
            subject: "hi".to_string(),
            body: String::new(),
        };
        assert!(req.validate().unwrap().contains("valid address"));
    }

    #[test]
    fn test_notify_request_rejects_empty_subject() {
        let req = NotifyRequest {
            recipient: "a@example.com".to_string(),
            subject: String::new(),
            body: String::new(),
        };
        assert!(req.validate().unwrap().contains("subject"));
    }
}
