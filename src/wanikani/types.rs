use serde::{Deserialize, Serialize};

/// A vocabulary subject: stable id, display slug, level, and its example
/// sentences. This is the shape cached under `subjectId_{id}` and persisted
/// in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id: u64,
  pub slug: String,
  pub level: u32,
  pub context_sentences: Vec<ContextSentence>,
}

/// A Japanese example sentence with its English translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSentence {
  pub ja: String,
  pub en: String,
}

/// Kind of subject an assignment points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
  Vocabulary,
  KanaVocabulary,
  #[serde(other)]
  Other,
}

/// A learner's progress record for one subject. Transient: fetched fresh each
/// sync and never cached.
#[derive(Debug, Clone)]
pub struct Assignment {
  pub subject_id: u64,
  pub subject_type: SubjectType,
  pub srs_stage: u32,
}

impl Assignment {
  /// Vocabulary the learner has actually started (SRS stage 0 means the
  /// subject has not been learned yet).
  pub fn is_started_vocabulary(&self) -> bool {
    matches!(
      self.subject_type,
      SubjectType::Vocabulary | SubjectType::KanaVocabulary
    ) && self.srs_stage > 0
  }
}
