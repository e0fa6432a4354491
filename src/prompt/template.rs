use crate::models::AnswerValue;

pub const ANSWER_MARKER: &str = "${answer}";

const LIST_JOINER: &str = " and ";

/// Fills the first `${answer}` marker of `template` with the answer.
///
/// List answers are trimmed element-wise and joined with "and". A template
/// without the marker comes back unchanged.
pub fn render(template: &str, answer: &AnswerValue) -> String {
    let value = match answer {
        AnswerValue::Single(value) => value.trim().to_string(),
        AnswerValue::Multiple(values) => values
            .iter()
            .map(|v| v.trim())
            .collect::<Vec<_>>()
            .join(LIST_JOINER),
    };
    render_value(template, &value)
}

pub fn render_value(template: &str, value: &str) -> String {
    template.replacen(ANSWER_MARKER, value, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_answer_is_trimmed_and_substituted() {
        assert_eq!(render("A ${answer} B", &"cat".into()), "A cat B");
        assert_eq!(render("A ${answer} B", &"  cat ".into()), "A cat B");
    }

    #[test]
    fn list_answer_joins_with_and() {
        assert_eq!(
            render("A ${answer} B", &vec!["red", "blue"].into()),
            "A red and blue B"
        );
        assert_eq!(
            render("${answer}", &vec![" red ", "blue", "green"].into()),
            "red and blue and green"
        );
    }

    #[test]
    fn only_first_marker_is_replaced() {
        assert_eq!(
            render("${answer} and ${answer}", &"x".into()),
            "x and ${answer}"
        );
    }

    #[test]
    fn missing_marker_leaves_template() {
        assert_eq!(render("a fixed phrase", &"ignored".into()), "a fixed phrase");
    }
}
