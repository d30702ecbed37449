//! # Prompt composer
//!
//! Builds the instruction prompt sent to the generation backend. The
//! template is fixed: an instruction header declaring the SQL-expert role
//! and its rules, the retrieved schema context, then the literal question.
//! There are no conditional sections; every request uses the same shape
//! regardless of question content or context size.

/// Instruction header, ending where the schema context begins.
const HEADER: &str = "You are an expert MySQL query generator.\n\
\n\
RULES:\n\
1. Use ONLY the tables and columns from the schema provided.\n\
2. If multiple tables are related via foreign keys, use JOINs where appropriate.\n\
3. Prefer returning human-readable columns (like project_name) over IDs when possible.\n\
4. Return only the SQL query (no explanation).\n\
\n\
SCHEMA:\n";

/// Separator between the schema context block and the question.
const QUESTION_LABEL: &str = "\n\nUser question: ";

/// Closing instruction after the question.
const FOOTER: &str = "\n\nReturn only the SQL query:";

/// Merge the schema context and the user question into the fixed prompt.
pub fn compose_prompt(question: &str, schema_context: &str) -> String {
    format!("{HEADER}{schema_context}{QUESTION_LABEL}{question}{FOOTER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_fixed_sections_in_order() {
        let prompt = compose_prompt("list all tasks", "Table tasks: columns id, title");
        let header_at = prompt.find("You are an expert MySQL query generator.").unwrap();
        let schema_at = prompt.find("SCHEMA:").unwrap();
        let question_at = prompt.find("User question: list all tasks").unwrap();
        let footer_at = prompt.find("Return only the SQL query:").unwrap();
        assert!(header_at < schema_at && schema_at < question_at && question_at < footer_at);
    }

    #[test]
    fn context_and_question_round_trip() {
        let question = "list all task titles for project Alpha";
        let context = "Table tasks: columns id, project_id, title\n\
                       Table projects: columns id, project_name";
        let prompt = compose_prompt(question, context);

        let body = prompt
            .strip_prefix(HEADER)
            .and_then(|s| s.strip_suffix(FOOTER))
            .unwrap();
        let (recovered_context, recovered_question) = body.split_once(QUESTION_LABEL).unwrap();
        assert_eq!(recovered_context, context);
        assert_eq!(recovered_question, question);
    }

    #[test]
    fn template_is_unconditional() {
        // Empty inputs still produce the full template skeleton.
        let prompt = compose_prompt("", "");
        assert!(prompt.starts_with(HEADER));
        assert!(prompt.ends_with(FOOTER));
    }
}
