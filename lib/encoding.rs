//! Realitio question-text encoding
//!
//! A template-2 question packs up to four fields into one string, separated
//! by U+241F (the printable unit-separator symbol): title, outcome list,
//! category, language. The outcome list is a comma-joined sequence of
//! double-quoted labels; quotes and backslashes inside a label are
//! backslash-escaped. Decoding is total: malformed input degrades to fewer
//! fields or fewer outcomes, never an error.

/// Field separator used by the Realitio question encoding.
pub const UNIT_SEPARATOR: char = '\u{241f}';

/// Template id for "single question with outcome list". Other template ids
/// are legacy formats this core does not decode.
pub const SINGLE_SELECT_TEMPLATE_ID: u32 = 2;

/// Collapse backslash escapes to their literal characters.
///
/// Recognized escapes are `\"` and `\\`. An unrecognized escape passes
/// through with its backslash preserved, and a trailing lone backslash is
/// kept as-is.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decoded fields of a template-2 question blob.
///
/// Fields omitted from the source blob stay `None`; an absent or empty
/// outcome field yields an empty outcome list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionData {
    pub title: Option<String>,
    pub outcomes: Vec<String>,
    pub category: Option<String>,
    pub language: Option<String>,
}

/// Split a question blob into its ordered fields and decode each one.
///
/// At most four fields are taken; anything past the third separator-delimited
/// field is ignored.
pub fn parse_question_data(data: &str) -> QuestionData {
    let mut fields = data.split(UNIT_SEPARATOR);
    let mut parsed = QuestionData::default();
    let Some(title) = fields.next() else {
        return parsed;
    };
    parsed.title = Some(unescape(title));
    if let Some(outcomes) = fields.next() {
        parsed.outcomes = parse_outcomes(outcomes);
    }
    if let Some(category) = fields.next() {
        parsed.category = Some(unescape(category));
    }
    if let Some(language) = fields.next() {
        parsed.language = Some(unescape(language));
    }
    parsed
}

/// Scan a quoted outcome list, e.g. `"Yes","No"`.
///
/// A backslash escapes the following character, so an escaped quote never
/// opens or closes a label. Text between labels (commas, stray characters)
/// is skipped, and an unterminated label contributes nothing.
fn parse_outcomes(field: &str) -> Vec<String> {
    let mut outcomes = Vec::new();
    // byte offset just past the opening quote, while inside a label
    let mut start: Option<usize> = None;
    let mut escaped = false;
    for (i, c) in field.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '"' => match start {
                None => start = Some(i + c.len_utf8()),
                Some(s) => {
                    outcomes.push(unescape(&field[s..i]));
                    start = None;
                }
            },
            '\\' => escaped = true,
            _ => (),
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::{
        QuestionData, UNIT_SEPARATOR, parse_question_data, unescape,
    };

    /// Inverse of `unescape`, for round-trip checks.
    fn escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    #[test]
    fn unescape_round_trips() {
        let cases = [
            "",
            "plain",
            r#"she said "hi""#,
            r"back\slash",
            r#"\"mixed\" "and" \\ raw"#,
            "\\",
            r#"""#,
            "unicode ⏎ § survives",
        ];
        for case in cases {
            assert_eq!(unescape(&escape(case)), case, "case: {case:?}");
        }
    }

    #[test]
    fn unescape_preserves_unrecognized_escapes() {
        assert_eq!(unescape(r"\n"), r"\n");
        assert_eq!(unescape(r"a\zb"), r"a\zb");
        // trailing lone backslash is kept
        assert_eq!(unescape("tail\\"), "tail\\");
    }

    #[test]
    fn splits_all_four_fields() {
        let data = format!(
            "Will X?{sep}\"A\",\"B\"{sep}Sports{sep}en",
            sep = UNIT_SEPARATOR
        );
        let parsed = parse_question_data(&data);
        assert_eq!(
            parsed,
            QuestionData {
                title: Some("Will X?".to_owned()),
                outcomes: vec!["A".to_owned(), "B".to_owned()],
                category: Some("Sports".to_owned()),
                language: Some("en".to_owned()),
            }
        );
    }

    #[test]
    fn omitted_fields_stay_unset() {
        let parsed = parse_question_data("Just a title");
        assert_eq!(parsed.title.as_deref(), Some("Just a title"));
        assert!(parsed.outcomes.is_empty());
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.language, None);

        let data = format!("T{sep}\"A\"", sep = UNIT_SEPARATOR);
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.outcomes, vec!["A".to_owned()]);
        assert_eq!(parsed.category, None);
    }

    #[test]
    fn fields_beyond_the_fourth_are_ignored() {
        let data = format!(
            "T{sep}{sep}Cat{sep}en{sep}extra{sep}more",
            sep = UNIT_SEPARATOR
        );
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.language.as_deref(), Some("en"));
    }

    #[test]
    fn unquoted_outcome_field_yields_no_outcomes() {
        let data = format!("T{sep}A,B", sep = UNIT_SEPARATOR);
        assert!(parse_question_data(&data).outcomes.is_empty());
    }

    #[test]
    fn outcome_labels_may_contain_escaped_quotes() {
        let data = format!(r#"T{sep}"A\"B","C""#, sep = UNIT_SEPARATOR);
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.outcomes, vec![r#"A"B"#.to_owned(), "C".to_owned()]);
    }

    #[test]
    fn outcome_labels_may_contain_escaped_backslashes() {
        let data = format!(r#"T{sep}"a\\b""#, sep = UNIT_SEPARATOR);
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.outcomes, vec![r"a\b".to_owned()]);
    }

    #[test]
    fn unterminated_outcome_contributes_nothing() {
        let data = format!(r#"T{sep}"A","B"#, sep = UNIT_SEPARATOR);
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.outcomes, vec!["A".to_owned()]);
    }

    #[test]
    fn decodes_escapes_in_title_and_category() {
        let data = format!(
            r#"A \"quoted\" title{sep}{sep}Cat\\egory"#,
            sep = UNIT_SEPARATOR
        );
        let parsed = parse_question_data(&data);
        assert_eq!(parsed.title.as_deref(), Some(r#"A "quoted" title"#));
        assert_eq!(parsed.category.as_deref(), Some(r"Cat\egory"));
    }
}
