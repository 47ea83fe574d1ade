use serde::{Deserialize, Deserializer, Serialize, de};

/// A row of the `schools` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub image: Option<String>,
    pub email_id: String,
    pub description: Option<String>,
}

/// A school as it appears on the browse page, with its rating aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchoolListing {
    #[serde(flatten)]
    pub school: School,
    pub avg_rating: f64,
    pub rating_count: i64,
}

impl SchoolListing {
    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            avg_rating: self.avg_rating,
            rating_count: self.rating_count,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub rating_count: i64,
}

/// Payload for creating or editing a school.
///
/// `contact` is accepted as either a JSON string or number, forms tend to
/// send phone numbers both ways.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub contact: String,
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatingRequest {
    #[serde(default)]
    pub rating: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: i32,
}

/// Body shape shared by every API response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            error: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::ok().with_message(message)
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        }),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}
