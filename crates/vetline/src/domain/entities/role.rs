//! Role / Category / Question - Question Bank Configuration
//!
//! Immutable, versioned catalog of per-role question sequences and scoring
//! rubrics. Defined at deploy time in a JSON document and validated as a
//! closed structure at load: a malformed role definition fails fast rather
//! than producing a meaningless category result later.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{RecommendationPolicy, Tier};

/// One rubric tier: a numeric score and the criteria that earn it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricTier {
    pub score: f64,
    pub description: String,
}

/// Per-question scoring criteria with four tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    pub ideal: RubricTier,
    pub acceptable: RubricTier,
    pub red_flag: RubricTier,
    pub no_response: RubricTier,
}

impl Rubric {
    /// Numeric score for a tier. The failure marker scores zero; it must
    /// never be silently promoted to a rubric score.
    pub fn score_for(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Ideal => self.ideal.score,
            Tier::Acceptable => self.acceptable.score,
            Tier::RedFlag => self.red_flag.score,
            Tier::NoResponse => self.no_response.score,
            Tier::EvaluationError => 0.0,
        }
    }

    /// Maximum attainable score for this question.
    pub fn max_score(&self) -> f64 {
        self.ideal.score
    }
}

/// A single scripted question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within the role (e.g. "knowledge_margarita").
    /// Answers are matched to questions by this key and never by position.
    pub key: String,
    /// Category key this question belongs to.
    pub category: String,
    /// Spoken prompt text (fallback when no audio asset is available).
    pub prompt: String,
    /// Pre-recorded prompt audio reference.
    #[serde(default)]
    pub audio_url: Option<String>,
    pub rubric: Rubric,
}

/// Named grouping of questions with its own pass threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub name: String,
    /// Pass threshold as a percentage of the category maximum, in (0, 100].
    pub pass_threshold_pct: f64,
}

/// A job type: an ordered question sequence partitioned into categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub intro_audio: Option<String>,
    #[serde(default)]
    pub goodbye_audio: Option<String>,
    #[serde(default)]
    pub recommendation_policy: RecommendationPolicy,
    pub categories: Vec<Category>,
    pub questions: Vec<Question>,
}

impl Role {
    /// Validate the role as a closed data structure.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.questions.is_empty() {
            return Err(DomainError::Validation(format!(
                "role {} has no questions",
                self.key
            )));
        }

        let category_keys: HashSet<&str> =
            self.categories.iter().map(|c| c.key.as_str()).collect();
        if category_keys.len() != self.categories.len() {
            return Err(DomainError::Validation(format!(
                "role {} has duplicate category keys",
                self.key
            )));
        }

        for category in &self.categories {
            if category.pass_threshold_pct <= 0.0 || category.pass_threshold_pct > 100.0 {
                return Err(DomainError::Validation(format!(
                    "category {} of role {} has pass threshold {} outside (0, 100]",
                    category.key, self.key, category.pass_threshold_pct
                )));
            }
            if !self.questions.iter().any(|q| q.category == category.key) {
                return Err(DomainError::Validation(format!(
                    "category {} of role {} has no questions",
                    category.key, self.key
                )));
            }
        }

        let mut question_keys = HashSet::new();
        for question in &self.questions {
            if !question_keys.insert(question.key.as_str()) {
                return Err(DomainError::Validation(format!(
                    "role {} has duplicate question key {}",
                    self.key, question.key
                )));
            }
            if !category_keys.contains(question.category.as_str()) {
                return Err(DomainError::Validation(format!(
                    "question {} of role {} references unknown category {}",
                    question.key, self.key, question.category
                )));
            }
            let rubric = &question.rubric;
            for (label, tier) in [
                ("ideal", &rubric.ideal),
                ("acceptable", &rubric.acceptable),
                ("red_flag", &rubric.red_flag),
                ("no_response", &rubric.no_response),
            ] {
                if tier.score < 0.0 {
                    return Err(DomainError::Validation(format!(
                        "question {} of role {} has negative {label} score",
                        question.key, self.key
                    )));
                }
                if tier.score > rubric.ideal.score {
                    return Err(DomainError::Validation(format!(
                        "question {} of role {}: {label} score exceeds ideal",
                        question.key, self.key
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn questions_in_category(&self, category_key: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category_key)
            .collect()
    }
}

/// The full question bank: every role this deployment can assess.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    roles: HashMap<String, Role>,
}

impl QuestionBank {
    /// Parse and validate a question bank from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let roles: HashMap<String, Role> = serde_json::from_str(json)
            .map_err(|e| DomainError::Validation(format!("invalid question bank JSON: {e}")))?;

        for (key, role) in &roles {
            if key != &role.key {
                return Err(DomainError::Validation(format!(
                    "role map key {key} does not match role key {}",
                    role.key
                )));
            }
            role.validate()?;
        }

        if roles.is_empty() {
            return Err(DomainError::Validation(
                "question bank defines no roles".to_string(),
            ));
        }

        Ok(Self { roles })
    }

    /// The roles shipped with this crate.
    pub fn builtin() -> Result<Self, DomainError> {
        Self::from_json(include_str!("../../../data/roles.json"))
    }

    pub fn role(&self, key: &str) -> Option<&Role> {
        self.roles.get(key)
    }

    pub fn role_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.roles.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    //! Fixtures shared by unit tests across this crate.

    use super::*;

    pub fn sample_rubric() -> Rubric {
        Rubric {
            ideal: RubricTier {
                score: 10.0,
                description: "names both parts".to_string(),
            },
            acceptable: RubricTier {
                score: 7.0,
                description: "names one part".to_string(),
            },
            red_flag: RubricTier {
                score: 2.0,
                description: "names neither".to_string(),
            },
            no_response: RubricTier {
                score: 0.0,
                description: "no answer".to_string(),
            },
        }
    }

    pub fn sample_question(key: &str, category: &str) -> Question {
        Question {
            key: key.to_string(),
            category: category.to_string(),
            prompt: format!("prompt for {key}"),
            audio_url: None,
            rubric: sample_rubric(),
        }
    }

    /// Two categories with one question each, threshold 70%.
    pub fn sample_role() -> Role {
        Role {
            key: "bartender".to_string(),
            name: "Bartender".to_string(),
            intro_audio: None,
            goodbye_audio: None,
            recommendation_policy: RecommendationPolicy::default(),
            categories: vec![
                Category {
                    key: "experience".to_string(),
                    name: "Experience".to_string(),
                    pass_threshold_pct: 70.0,
                },
                Category {
                    key: "knowledge".to_string(),
                    name: "Knowledge".to_string(),
                    pass_threshold_pct: 70.0,
                },
            ],
            questions: vec![
                sample_question("experience_1", "experience"),
                sample_question("knowledge_margarita", "knowledge"),
            ],
        }
    }
}
