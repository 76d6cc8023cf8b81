//! Serde-deserializable types matching WaniKani API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{Assignment, ContextSentence, Subject, SubjectType};

/// Collection envelope: every listing endpoint wraps its records in `data`
/// and carries the continuation link under `pages.next_url`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiCollection<T> {
  #[serde(default)]
  pub data: Vec<T>,
  pub pages: Option<ApiPages>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPages {
  pub next_url: Option<String>,
}

/// Resource wrapper: each record carries its stable id at the top level with
/// the payload nested under `data`.
#[derive(Debug, Deserialize)]
pub struct ApiResource<T> {
  pub id: u64,
  pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ApiAssignmentData {
  pub subject_id: u64,
  pub subject_type: SubjectType,
  #[serde(default)]
  pub srs_stage: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApiSubjectData {
  pub slug: String,
  pub level: u32,
  #[serde(default)]
  pub context_sentences: Vec<ApiContextSentence>,
}

#[derive(Debug, Deserialize)]
pub struct ApiContextSentence {
  pub ja: String,
  pub en: String,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiResource<ApiAssignmentData> {
  pub fn into_assignment(self) -> Assignment {
    Assignment {
      subject_id: self.data.subject_id,
      subject_type: self.data.subject_type,
      srs_stage: self.data.srs_stage,
    }
  }
}

impl ApiResource<ApiSubjectData> {
  pub fn into_subject(self) -> Subject {
    Subject {
      id: self.id,
      slug: self.data.slug,
      level: self.data.level,
      context_sentences: self
        .data
        .context_sentences
        .into_iter()
        .map(|s| ContextSentence { ja: s.ja, en: s.en })
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_assignment_page() {
    let body = r#"{
      "data": [
        {"id": 80463006, "data": {"subject_id": 8761, "subject_type": "vocabulary", "srs_stage": 4}},
        {"id": 80463007, "data": {"subject_id": 440, "subject_type": "radical", "srs_stage": 8}}
      ],
      "pages": {"next_url": "https://api.wanikani.com/v2/assignments?page_after_id=80463007"}
    }"#;

    let page: ApiCollection<ApiResource<ApiAssignmentData>> = serde_json::from_str(body).unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(
      page.pages.unwrap().next_url.as_deref(),
      Some("https://api.wanikani.com/v2/assignments?page_after_id=80463007")
    );

    let first = page.data.into_iter().next().unwrap().into_assignment();
    assert_eq!(first.subject_id, 8761);
    assert_eq!(first.subject_type, SubjectType::Vocabulary);
    assert_eq!(first.srs_stage, 4);
  }

  #[test]
  fn test_unknown_subject_type_maps_to_other() {
    let body = r#"{"id": 1, "data": {"subject_id": 2, "subject_type": "kanji", "srs_stage": 3}}"#;
    let record: ApiResource<ApiAssignmentData> = serde_json::from_str(body).unwrap();
    assert_eq!(record.data.subject_type, SubjectType::Other);
  }

  #[test]
  fn test_parse_subject_with_sentences() {
    let body = r#"{
      "id": 2467,
      "data": {
        "slug": "一",
        "level": 1,
        "context_sentences": [
          {"ja": "一ページを読んでください。", "en": "Please read one page."}
        ]
      }
    }"#;

    let subject = serde_json::from_str::<ApiResource<ApiSubjectData>>(body)
      .unwrap()
      .into_subject();
    assert_eq!(subject.id, 2467);
    assert_eq!(subject.slug, "一");
    assert_eq!(subject.level, 1);
    assert_eq!(subject.context_sentences.len(), 1);
  }

  #[test]
  fn test_missing_sentences_default_to_empty() {
    let body = r#"{"id": 3, "data": {"slug": "二", "level": 1}}"#;
    let subject = serde_json::from_str::<ApiResource<ApiSubjectData>>(body)
      .unwrap()
      .into_subject();
    assert!(subject.context_sentences.is_empty());
  }
}
