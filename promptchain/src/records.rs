//! Typed records extracted from emails.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{parser::ResponseSchema, vector::Document};

/// Details of a storm damage insurance claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ClaimDetails {
    /// The date when the storm occurred, in 'Month DD' or 'YYYY-MM-DD' format if possible
    pub storm_date: String,
    /// City and state where the storm occurred
    pub location: String,
    /// The policy number for the homeowner's insurance claim
    pub policy_number: String,
}

impl ClaimDetails {
    #[must_use]
    pub fn response_schemas() -> Vec<ResponseSchema> {
        vec![
            ResponseSchema::new(
                "storm_date",
                "The date when the storm occurred, in 'Month DD' or 'YYYY-MM-DD' format if possible",
            ),
            ResponseSchema::new("location", "City and state where the storm occurred"),
            ResponseSchema::new(
                "policy_number",
                "The policy number for the homeowner's insurance claim",
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct EmailInfo {
    /// The sender email address
    pub sender: String,
    /// Subject of the email
    pub subject: String,
    /// Date the email was sent
    pub date: String,
    /// Important topics mentioned
    pub key_topics: Vec<String>,
}

impl EmailInfo {
    /// A searchable summary of the email, dated through its metadata.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Document::new(format!(
            "Subject: {}\nSender: {}\nDate: {}\nTopics: {}",
            self.subject,
            self.sender,
            self.date,
            self.key_topics.join(", ")
        ))
        .with_metadata("email_date", self.date.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct VacationInfo {
    /// Departure time to Europe
    pub leave_time: String,
    /// Departure location (city, airport, state)
    pub leave_from: String,
    /// List of cities to visit
    pub cities_to_visit: Vec<String>,
    /// Number of people on the trip
    #[validate(range(min = 1, message = "Number of people must be positive"))]
    pub num_people: i64,
}
