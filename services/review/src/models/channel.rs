//! Channel data: the media batch descriptor stored in `channel_data`
//!
//! The producer stores this document as a JSON string (or an inline JSON
//! document). Decoding is strict: unknown fields, missing required fields, a
//! zero selection limit and duplicate file ids are all rejected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while decoding `channel_data`
#[derive(Error, Debug)]
pub enum ChannelDataError {
    /// The document is not valid JSON or does not match the schema
    #[error("Invalid channel data: {0}")]
    Json(#[from] serde_json::Error),

    /// `to_select` must allow at least one file
    #[error("Invalid channel data: to_select must be at least 1")]
    ZeroSelectionLimit,

    /// Two files share the same id
    #[error("Invalid channel data: duplicate file_id {0}")]
    DuplicateFileId(String),
}

/// Kind of media in the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Image,
    Video,
}

/// One candidate file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaFile {
    #[serde(deserialize_with = "string_or_number")]
    pub file_id: String,
    pub name: String,
    pub s3_url: String,
}

/// Media batch awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelData {
    pub author: String,
    pub channel_name: String,
    pub video_lenght_in_seconds: Number,
    pub max_file_size: Number,
    pub fps: Number,
    pub stability_prompt: String,
    /// Maximum number of files the reviewer may pick; absent means one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_select: Option<u32>,
    /// Absent in the image-only variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub list_of_files: Vec<MediaFile>,
}

impl ChannelData {
    /// Decode and validate a `channel_data` column value
    ///
    /// A JSON string is parsed as the serialized document; any other value is
    /// taken as the document itself.
    pub fn decode(value: &Value) -> Result<Self, ChannelDataError> {
        let data: ChannelData = match value {
            Value::String(text) => serde_json::from_str(text)?,
            other => serde_json::from_value(other.clone())?,
        };
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<(), ChannelDataError> {
        if self.to_select == Some(0) {
            return Err(ChannelDataError::ZeroSelectionLimit);
        }

        let mut seen = HashSet::new();
        for file in &self.list_of_files {
            if !seen.insert(file.file_id.as_str()) {
                return Err(ChannelDataError::DuplicateFileId(file.file_id.clone()));
            }
        }

        Ok(())
    }

    /// How many files may be selected at once
    pub fn selection_limit(&self) -> usize {
        self.to_select.unwrap_or(1) as usize
    }

    /// Kind of media to render
    pub fn content_type(&self) -> ContentType {
        self.content_type.unwrap_or_default()
    }
}

/// Accept file ids written either as strings or as bare numbers
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "file_id must be a string or a number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn channel_json(to_select: Option<u32>, file_ids: &[&str]) -> Value {
        let files: Vec<Value> = file_ids
            .iter()
            .map(|id| {
                json!({
                    "file_id": id,
                    "name": format!("Frame {}", id),
                    "s3_url": format!("https://bucket.s3.amazonaws.com/{}.png", id),
                })
            })
            .collect();

        let mut data = json!({
            "author": "Ada",
            "channel_name": "Daily Shorts",
            "video_lenght_in_seconds": 59.5,
            "max_file_size": 104857600,
            "fps": 30,
            "stability_prompt": "a lighthouse at dusk",
            "content_type": "image",
            "list_of_files": files,
        });
        if let Some(limit) = to_select {
            data["to_select"] = json!(limit);
        }
        data
    }

    #[test]
    fn test_decode_from_serialized_string() {
        let text = channel_json(Some(2), &["f1", "f2"]).to_string();
        let data = ChannelData::decode(&Value::String(text)).unwrap();

        assert_eq!(data.author, "Ada");
        assert_eq!(data.selection_limit(), 2);
        assert_eq!(data.content_type(), ContentType::Image);
        assert_eq!(data.list_of_files[1].file_id, "f2");
    }

    #[test]
    fn test_missing_to_select_means_single_select() {
        let data = ChannelData::decode(&channel_json(None, &["f1"])).unwrap();
        assert_eq!(data.to_select, None);
        assert_eq!(data.selection_limit(), 1);
    }

    #[test]
    fn test_missing_content_type_defaults_to_image() {
        let mut value = channel_json(None, &["f1"]);
        value.as_object_mut().unwrap().remove("content_type");
        let data = ChannelData::decode(&value).unwrap();
        assert_eq!(data.content_type(), ContentType::Image);
    }

    #[test]
    fn test_round_trip_keeps_field_names_and_numbers() {
        let value = channel_json(Some(3), &["f1", "f2"]);
        let data = ChannelData::decode(&value).unwrap();
        assert_eq!(serde_json::to_value(&data).unwrap(), value);
    }

    #[test]
    fn test_numeric_file_ids_are_accepted() {
        let mut value = channel_json(None, &["f1"]);
        value["list_of_files"][0]["file_id"] = json!(17);
        let data = ChannelData::decode(&value).unwrap();
        assert_eq!(data.list_of_files[0].file_id, "17");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = ChannelData::decode(&Value::String("{\"author\": ".to_string())).unwrap_err();
        assert!(matches!(err, ChannelDataError::Json(_)));
        assert!(err.to_string().starts_with("Invalid channel data"));
    }

    #[test]
    fn test_unknown_and_missing_fields_are_rejected() {
        let mut unknown = channel_json(None, &["f1"]);
        unknown["thumbnail"] = json!("x");
        assert!(ChannelData::decode(&unknown).is_err());

        let mut missing = channel_json(None, &["f1"]);
        missing.as_object_mut().unwrap().remove("fps");
        assert!(ChannelData::decode(&missing).is_err());
    }

    #[test]
    fn test_zero_limit_and_duplicate_ids_are_rejected() {
        assert!(matches!(
            ChannelData::decode(&channel_json(Some(0), &["f1"])),
            Err(ChannelDataError::ZeroSelectionLimit)
        ));
        assert!(matches!(
            ChannelData::decode(&channel_json(None, &["f1", "f1"])),
            Err(ChannelDataError::DuplicateFileId(id)) if id == "f1"
        ));
    }
}
