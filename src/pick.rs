//! Random sentence selection and the explain-link builder.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::wanikani::types::Subject;

const DUCK_AI_BASE_URL: &str = "https://duckduckgo.com/";

const DUCK_AI_PROMPT_TEMPLATE: &str = "Please break down the following Japanese sentence:

{sentence}

 - Explain the meaning of each component.
 - Describe the grammatical structure.
 - Explain any conjugations used.
";

/// A sentence drawn for study: the vocabulary slug plus one of its context
/// sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePick {
  pub slug: String,
  pub ja: String,
  pub en: String,
}

/// Pick one context sentence from one subject, both uniformly at random.
/// Subjects without sentences are skipped up front; returns `None` when no
/// subject has any.
pub fn random_sentence<R: Rng + ?Sized>(rng: &mut R, vocab: &[Subject]) -> Option<SentencePick> {
  let candidates: Vec<&Subject> = vocab
    .iter()
    .filter(|subject| !subject.context_sentences.is_empty())
    .collect();

  let subject = candidates.choose(rng)?;
  let sentence = subject.context_sentences.choose(rng)?;

  Some(SentencePick {
    slug: subject.slug.clone(),
    ja: sentence.ja.clone(),
    en: sentence.en.clone(),
  })
}

/// duck.ai chat link asking for a breakdown of the sentence.
pub fn explain_link(ja: &str) -> String {
  let prompt = DUCK_AI_PROMPT_TEMPLATE.replace("{sentence}", ja);
  let query = url::form_urlencoded::Serializer::new(String::new())
    .append_pair("q", &prompt)
    .append_pair("ia", "chat")
    .append_pair("bang", "true")
    .finish();
  format!("{}?{}", DUCK_AI_BASE_URL, query)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::wanikani::types::ContextSentence;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn subject(id: u64, sentences: &[(&str, &str)]) -> Subject {
    Subject {
      id,
      slug: format!("word-{}", id),
      level: 1,
      context_sentences: sentences
        .iter()
        .map(|(ja, en)| ContextSentence {
          ja: ja.to_string(),
          en: en.to_string(),
        })
        .collect(),
    }
  }

  #[test]
  fn test_empty_vocab_yields_none() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(random_sentence(&mut rng, &[]), None);
  }

  #[test]
  fn test_all_subjects_without_sentences_yield_none() {
    let mut rng = StdRng::seed_from_u64(1);
    let vocab = vec![subject(1, &[]), subject(2, &[])];
    assert_eq!(random_sentence(&mut rng, &vocab), None);
  }

  #[test]
  fn test_sentence_less_subjects_are_skipped() {
    let mut rng = StdRng::seed_from_u64(7);
    let vocab = vec![
      subject(1, &[]),
      subject(2, &[("例文です。", "It is an example sentence.")]),
      subject(3, &[]),
    ];

    for _ in 0..32 {
      let pick = random_sentence(&mut rng, &vocab).unwrap();
      assert_eq!(pick.slug, "word-2");
      assert_eq!(pick.ja, "例文です。");
    }
  }

  #[test]
  fn test_pick_carries_slug_and_both_sides() {
    let mut rng = StdRng::seed_from_u64(3);
    let vocab = vec![subject(9, &[("犬が好きです。", "I like dogs.")])];

    let pick = random_sentence(&mut rng, &vocab).unwrap();
    assert_eq!(
      pick,
      SentencePick {
        slug: "word-9".to_string(),
        ja: "犬が好きです。".to_string(),
        en: "I like dogs.".to_string(),
      }
    );
  }

  #[test]
  fn test_explain_link_embeds_sentence() {
    let link = explain_link("犬が好きです。");
    assert!(link.starts_with("https://duckduckgo.com/?q="));
    assert!(link.contains("ia=chat"));
    assert!(link.contains("bang=true"));
    // The sentence is percent-encoded into the prompt
    assert!(link.contains("%E7%8A%AC"));
    assert!(!link.contains("犬"));
  }
}
