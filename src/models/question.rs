use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "free-text", alias = "text")]
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPair {
    pub label: String,
    pub value: String,
}

/// Ordered label/value pairs for a select question.
///
/// Loads from either a JSON object (`{"label": "value"}`, document order kept)
/// or an array of `{label, value}` objects, and always serializes back as an
/// object so existing frontends keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pairs: Vec<OptionPair>,
}

impl SelectOptions {
    pub fn new(pairs: Vec<OptionPair>) -> Self {
        Self { pairs }
    }

    pub fn from_pairs<L: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (L, V)>,
    ) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(label, value)| OptionPair {
                    label: label.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn value_for(&self, label: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.label == label)
            .map(|pair| pair.value.as_str())
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.value == value)
            .map(|pair| pair.label.as_str())
    }

    pub fn pairs(&self) -> &[OptionPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Serialize for SelectOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for pair in &self.pairs {
            map.serialize_entry(&pair.label, &pair.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SelectOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = SelectOptions;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of label/value entries or an array of {label, value}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((label, value)) = access.next_entry::<String, String>()? {
                    pairs.push(OptionPair { label, value });
                }
                Ok(SelectOptions { pairs })
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(pair) = access.next_element::<OptionPair>()? {
                    pairs.push(pair);
                }
                Ok(SelectOptions { pairs })
            }
        }

        deserializer.deserialize_any(OptionsVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SelectOptions>,
    pub prompt_template: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub exclude_from_prompt: bool,
}

/// A submitted answer: one value, or several for multi-select questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    /// Blank strings and empty lists count as "not answered".
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Single(value) => value.trim().is_empty(),
            AnswerValue::Multiple(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        AnswerValue::Multiple(values.into_iter().map(String::from).collect())
    }
}

/// Answers keyed the way the questionnaire form submits them (`question-<id>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) {
        self.0.insert(key.into(), value);
    }

    /// Answer for a question id; `question-<id>` wins over a bare `<id>` key.
    pub fn get(&self, question_id: u32) -> Option<&AnswerValue> {
        self.0
            .get(&format!("question-{}", question_id))
            .or_else(|| self.0.get(&question_id.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The loaded questionnaire: ordered questions plus how to turn answers into a prompt.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    pub questions: Vec<Question>,
    pub name_question_id: u32,
    pub separator: String,
    /// Question id to named field, recorded on every generated image.
    pub fields: BTreeMap<u32, String>,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Questionnaire {
            questions: Vec::new(),
            name_question_id: 1,
            separator: " ".to_string(),
            fields: BTreeMap::new(),
        }
    }
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_name_question(mut self, id: u32) -> Self {
        self.name_question_id = id;
        self
    }

    pub fn with_field(mut self, question_id: u32, name: impl Into<String>) -> Self {
        self.fields.insert(question_id, name.into());
        self
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let file: QuestionnaireFile = serde_json::from_str(raw)?;
        Questionnaire::try_from(file).map_err(de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionnaireFile {
    List(Vec<Question>),
    Document(QuestionnaireDocument),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionnaireDocument {
    questions: Vec<Question>,
    #[serde(default)]
    name_question_id: Option<u32>,
    #[serde(default)]
    separator: Option<String>,
    /// Keys stay strings here: untagged buffering cannot turn "2" into a u32.
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

impl TryFrom<QuestionnaireFile> for Questionnaire {
    type Error = String;

    fn try_from(file: QuestionnaireFile) -> Result<Self, Self::Error> {
        match file {
            QuestionnaireFile::List(questions) => Ok(Questionnaire::new(questions)),
            QuestionnaireFile::Document(doc) => {
                let fields = doc
                    .fields
                    .into_iter()
                    .map(|(key, name)| {
                        key.trim()
                            .parse::<u32>()
                            .map(|id| (id, name))
                            .map_err(|_| format!("fields key {:?} is not a question id", key))
                    })
                    .collect::<Result<BTreeMap<u32, String>, String>>()?;

                let defaults = Questionnaire::default();
                Ok(Questionnaire {
                    questions: doc.questions,
                    name_question_id: doc.name_question_id.unwrap_or(defaults.name_question_id),
                    separator: doc.separator.unwrap_or(defaults.separator),
                    fields,
                })
            }
        }
    }
}
