//! Event records and the results of their external fetches

use crate::processor::SourceType;
use serde::Serialize;

/// Contact details scraped from an external page
///
/// Empty lists are left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
}

impl ContactInfo {
    /// Returns true if nothing was found
    pub fn is_empty(&self) -> bool {
        self.email.is_empty() && self.phone.is_empty() && self.address.is_empty()
    }
}

/// Data read from a successfully fetched external page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalPage {
    pub title: String,
    pub description: String,
    pub ticket_url: Option<String>,
    pub contact_info: ContactInfo,
    pub raw_text_content: String,
    pub source_type: SourceType,
}

/// How one external fetch ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExternalOutcome {
    Success(ExternalPage),
    Error { error_message: String },
}

/// Result of one child fetch, attached to its parent record
///
/// Serializes as `{"url": ..., "status": "success", "title": ...}` or
/// `{"url": ..., "status": "error", "error_message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalResult {
    pub url: String,

    #[serde(flatten)]
    pub outcome: ExternalOutcome,
}

impl ExternalResult {
    /// Builds a success result
    pub fn success(url: impl Into<String>, page: ExternalPage) -> Self {
        Self {
            url: url.into(),
            outcome: ExternalOutcome::Success(page),
        }
    }

    /// Builds an error result
    pub fn error(url: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: ExternalOutcome::Error {
                error_message: error_message.into(),
            },
        }
    }

    /// Returns true if the fetch succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExternalOutcome::Success(_))
    }

    /// The error message, if the fetch failed
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ExternalOutcome::Error { error_message } => Some(error_message),
            ExternalOutcome::Success(_) => None,
        }
    }
}

/// Fields read from an event detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventFields {
    pub title: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub event_url: String,
    pub description: Option<String>,
    pub contact_email_on_main_site: Option<String>,
}

/// An event together with the results of its external fetches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRecord {
    /// Aggregation key, never written to output
    #[serde(skip)]
    pub identifier: String,

    #[serde(flatten)]
    pub fields: EventFields,

    pub external_data: Vec<ExternalResult>,
}

impl ParentRecord {
    /// Creates a record with no external data yet
    ///
    /// The identifier is `"{title}_{event_url}"`.
    pub fn new(fields: EventFields) -> Self {
        Self {
            identifier: format!("{}_{}", fields.title, fields.event_url),
            fields,
            external_data: Vec::new(),
        }
    }

    /// Number of failed external fetches
    pub fn error_count(&self) -> usize {
        self.external_data.iter().filter(|r| !r.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> EventFields {
        EventFields {
            title: "Flanders Flooring Days".to_string(),
            event_url: "https://www.kortrijkxpo.com/kalender/event/pxk/12/ffd/".to_string(),
            ..EventFields::default()
        }
    }

    #[test]
    fn test_identifier() {
        let record = ParentRecord::new(fields());
        assert_eq!(
            record.identifier,
            "Flanders Flooring Days_https://www.kortrijkxpo.com/kalender/event/pxk/12/ffd/"
        );
    }

    #[test]
    fn test_success_serialization() {
        let page = ExternalPage {
            title: "FFD".to_string(),
            description: "Floors".to_string(),
            ticket_url: Some("https://ffd.example.com/tickets".to_string()),
            contact_info: ContactInfo {
                email: vec!["info@ffd.example.com".to_string()],
                ..ContactInfo::default()
            },
            raw_text_content: "Welcome".to_string(),
            source_type: SourceType::PrimaryExternalEventSite,
        };
        let value = serde_json::to_value(ExternalResult::success("https://ffd.example.com/", page))
            .unwrap();

        assert_eq!(
            value,
            json!({
                "url": "https://ffd.example.com/",
                "status": "success",
                "title": "FFD",
                "description": "Floors",
                "ticket_url": "https://ffd.example.com/tickets",
                "contact_info": {"email": ["info@ffd.example.com"]},
                "raw_text_content": "Welcome",
                "source_type": "primary_external_event_site"
            })
        );
    }

    #[test]
    fn test_error_serialization() {
        let value = serde_json::to_value(ExternalResult::error(
            "https://down.example.com/",
            "HTTP status 500",
        ))
        .unwrap();

        assert_eq!(
            value,
            json!({
                "url": "https://down.example.com/",
                "status": "error",
                "error_message": "HTTP status 500"
            })
        );
    }

    #[test]
    fn test_parent_serialization_hides_identifier() {
        let mut record = ParentRecord::new(fields());
        record
            .external_data
            .push(ExternalResult::error("https://x.example.com/", "timeout"));
        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get("identifier").is_none());
        assert_eq!(value["title"], "Flanders Flooring Days");
        assert_eq!(value["date"], serde_json::Value::Null);
        assert_eq!(value["external_data"][0]["status"], "error");
        assert_eq!(record.error_count(), 1);
    }
}
