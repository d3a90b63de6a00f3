use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Listing endpoint body: either a bare array or `{"items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Plain(Vec<ListItem>),
    Wrapped {
        #[serde(default)]
        items: Vec<ListItem>,
    },
}

impl ListResponse {
    pub fn into_items(self) -> Vec<ListItem> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Wrapped { items } => items,
        }
    }
}

/// One tweet from the listing endpoint. Only the id drives the pipeline; the
/// rest rides along into the output unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default = "empty_object")]
    pub author: Value,
    #[serde(default)]
    pub flat_tags: Vec<String>,
    #[serde(default)]
    pub publish_date: String,
}

impl ListItem {
    /// Tweet id as a string, whether the API sent a string or a number.
    pub fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Full tweet record from the detail endpoint. Validated once here at the
/// network boundary; nested fields with unexpected shapes collapse to empty
/// values rather than failing the whole record.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetailRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(deserialize_with = "lenient_media")]
    pub media_extended: Vec<MediaEntry>,
    #[serde(deserialize_with = "lenient_qrt")]
    pub qrt: Option<QuotedTweet>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MediaEntry {
    #[serde(rename = "altText", deserialize_with = "lenient_string")]
    pub alt_text: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct QuotedTweet {
    #[serde(deserialize_with = "lenient_string")]
    pub text: String,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().unwrap_or_default().to_string())
}

fn lenient_media<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<MediaEntry>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| serde_json::from_value(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default())
}

fn lenient_qrt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<QuotedTweet>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

/// What the language model returns for one prompt. Required fields only;
/// tag count is deliberately not enforced even though the instruction asks
/// for five.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    pub translated_text_zh: String,
    pub tags: Vec<String>,
    pub cleaned_text: String,
}

/// Final per-tweet record, appended in order and written out once at the end
/// of the run. `embedding` is empty when the embedding call failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedItem {
    pub id: String,
    pub original_prompt: String,
    pub translated_prompt_zh: String,
    pub cleaned_prompt: String,
    pub tags: Vec<String>,
    pub api_tags: Vec<String>,
    pub embedding: Vec<f32>,
    pub author: Value,
    pub publish_date: String,
    pub processed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_bare_array() {
        let items: ListResponse =
            serde_json::from_str(r#"[{"id": "1"}, {"id": "2"}]"#).unwrap();
        let items = items.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id().as_deref(), Some("1"));
    }

    #[test]
    fn list_response_items_wrapper() {
        let items: ListResponse =
            serde_json::from_str(r#"{"items": [{"id": 42}]}"#).unwrap();
        let items = items.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id().as_deref(), Some("42"));
    }

    #[test]
    fn list_item_without_id() {
        let item: ListItem = serde_json::from_str(r#"{"flat_tags": ["x"]}"#).unwrap();
        assert!(item.id().is_none());
        assert_eq!(item.flat_tags, vec!["x"]);
    }

    #[test]
    fn detail_record_tolerates_malformed_nesting() {
        let detail: DetailRecord = serde_json::from_str(
            r#"{"text": 7, "media_extended": [null, {"altText": 3}, {"altText": "ok"}], "qrt": "not an object"}"#,
        )
        .unwrap();
        assert_eq!(detail.text, "");
        // null entry dropped, numeric altText collapses to empty string
        assert_eq!(detail.media_extended.len(), 2);
        assert_eq!(detail.media_extended[0].alt_text, "");
        assert_eq!(detail.media_extended[1].alt_text, "ok");
        assert!(detail.qrt.is_none());
    }

    #[test]
    fn detail_record_media_not_an_array() {
        let detail: DetailRecord =
            serde_json::from_str(r#"{"text": "hi", "media_extended": {"altText": "x"}}"#).unwrap();
        assert!(detail.media_extended.is_empty());
    }
}
