use serde::Deserialize;
use serde_json::Value;

/// One entry from the list endpoint; lives for one listing response.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub id: String,
    pub title: String,
}

/// Full remote representation of one dashboard. Opaque to the bot except for
/// the title, which is replaced once before the payload is resubmitted as a
/// create request.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardDetail(Value);

impl DashboardDetail {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Value::Object(fields) = &mut self.0 {
            fields.insert("title".to_string(), Value::String(title.into()));
        }
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Identity of a freshly created dashboard plus its shareable link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedDashboard {
    pub id: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::DashboardDetail;

    #[test]
    fn set_title_replaces_existing_title() {
        let mut detail = DashboardDetail::new(json!({
            "id": "abc-123",
            "title": "Prod Overview",
            "widgets": [{"definition": {"type": "timeseries"}}],
        }));

        detail.set_title("happy-run");

        assert_eq!(detail.title(), Some("happy-run"));
        assert_eq!(detail.as_json()["widgets"][0]["definition"]["type"], "timeseries");
    }

    #[test]
    fn set_title_inserts_when_missing() {
        let mut detail = DashboardDetail::new(json!({"id": "abc-123"}));
        detail.set_title("calm-dive");
        assert_eq!(detail.title(), Some("calm-dive"));
    }
}
