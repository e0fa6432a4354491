use super::template;
use crate::error::{AppError, Result};
use crate::models::{AnswerSet, AnswerValue, Question, QuestionKind, Questionnaire};
use std::collections::BTreeMap;

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub prompt: String,
    pub created_by: String,
    pub fields: BTreeMap<String, String>,
}

impl AssembledPrompt {
    pub fn is_empty(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// Walks the questions in configured order and renders every answered,
/// non-excluded one into a single prompt.
///
/// The name question never contributes to the prompt; its answer becomes
/// `created_by` instead. Answers for unknown question ids are ignored.
pub fn assemble(questionnaire: &Questionnaire, answers: &AnswerSet) -> AssembledPrompt {
    let mut parts = Vec::new();

    for question in &questionnaire.questions {
        if question.exclude_from_prompt || question.id == questionnaire.name_question_id {
            continue;
        }
        let Some(answer) = answered(answers, question.id) else {
            continue;
        };
        let value = resolve(question, answer);
        let part = template::render(&question.prompt_template, &value);
        if !part.trim().is_empty() {
            parts.push(part);
        }
    }

    let created_by = answered(answers, questionnaire.name_question_id)
        .map(flatten)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    let mut fields = BTreeMap::new();
    for (question_id, field) in &questionnaire.fields {
        let Some(answer) = answered(answers, *question_id) else {
            continue;
        };
        let value = match questionnaire.question(*question_id) {
            Some(question) => resolve(question, answer),
            None => answer.clone(),
        };
        fields.insert(field.clone(), flatten(&value));
    }

    AssembledPrompt {
        prompt: parts.join(&questionnaire.separator),
        created_by,
        fields,
    }
}

/// Fails when a required question has no usable answer.
pub fn check_required(questionnaire: &Questionnaire, answers: &AnswerSet) -> Result<()> {
    let missing: Vec<String> = questionnaire
        .questions
        .iter()
        .filter(|q| q.required && answered(answers, q.id).is_none())
        .map(|q| q.id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing answers for required questions: {}",
            missing.join(", ")
        )))
    }
}

fn answered(answers: &AnswerSet, question_id: u32) -> Option<&AnswerValue> {
    answers.get(question_id).filter(|answer| !answer.is_blank())
}

/// Select answers carry option labels; the prompt wants the option values.
fn resolve(question: &Question, answer: &AnswerValue) -> AnswerValue {
    let options = match (&question.kind, &question.options) {
        (QuestionKind::Select, Some(options)) => options,
        _ => return strip_blank(answer),
    };
    let lookup = |label: &str| {
        let label = label.trim();
        options.value_for(label).unwrap_or(label).to_string()
    };
    match strip_blank(answer) {
        AnswerValue::Single(label) => AnswerValue::Single(lookup(&label)),
        AnswerValue::Multiple(labels) => {
            AnswerValue::Multiple(labels.iter().map(|label| lookup(label)).collect())
        }
    }
}

fn strip_blank(answer: &AnswerValue) -> AnswerValue {
    match answer {
        AnswerValue::Single(value) => AnswerValue::Single(value.clone()),
        AnswerValue::Multiple(values) => AnswerValue::Multiple(
            values
                .iter()
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .collect(),
        ),
    }
}

fn flatten(answer: &AnswerValue) -> String {
    template::render(template::ANSWER_MARKER, answer)
}
