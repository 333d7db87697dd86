//! Answer prompt construction and transport-escape cleanup.

/// Build the constrained answer prompt from retrieved context.
///
/// The template is deterministic: same context and question, same prompt.
/// It confines the model to the supplied context, demands "I don't know"
/// for unsupported questions, forbids invented facts, and pins the output
/// to plain Markdown.
pub fn build_rag_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a support assistant answering questions from an indexed \
document collection.\n\
You will receive two sections: CONTEXT and QUESTION.\n\n\
Rules:\n\
- Use only the information found in CONTEXT to answer the QUESTION.\n\
- If the answer is not contained in CONTEXT, respond with \"I don't know.\"\n\
- Never invent details, policies, or procedures.\n\
- Keep the answer factual, concise, and friendly.\n\n\
Output Format (Markdown Required):\n\
- Respond **only in Markdown**.\n\
- Use simple Markdown formatting, such as:\n\
  - `-` for bullet points\n\
  - `**bold**` for emphasis (optional)\n\
  - tables, code blocks, titles\n\
- Do NOT use HTML.\n\n\
CONTEXT:\n{context}\n\n\
QUESTION:\n{question}\n"
    )
}

/// Undo backslash-escape artifacts introduced by the generation transport.
///
/// Recognises `\n`, `\t`, `\r`, `\"`, `\'`, `\\`, and `\uXXXX`. Anything
/// else after a backslash passes through unchanged.
pub fn decode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    None => out.push_str("\\u"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic_and_contains_sections() {
        let a = build_rag_prompt("ctx", "q");
        let b = build_rag_prompt("ctx", "q");
        assert_eq!(a, b);
        assert!(a.contains("CONTEXT:\nctx"));
        assert!(a.contains("QUESTION:\nq"));
        assert!(a.contains("I don't know"));
    }

    #[test]
    fn common_escapes_decode() {
        assert_eq!(decode_escapes(r"line one\nline two"), "line one\nline two");
        assert_eq!(decode_escapes(r#"said \"hi\""#), "said \"hi\"");
        assert_eq!(decode_escapes(r"tab\there"), "tab\there");
        assert_eq!(decode_escapes(r"back\\slash"), "back\\slash");
    }

    #[test]
    fn unicode_escapes_decode() {
        assert_eq!(decode_escapes("caf\\u00e9"), "caf\u{e9}");
        assert_eq!(decode_escapes("dash \\u2014 here"), "dash \u{2014} here");
    }

    #[test]
    fn unknown_or_truncated_escapes_pass_through() {
        assert_eq!(decode_escapes(r"path\qfile"), r"path\qfile");
        assert_eq!(decode_escapes(r"bad \uZZZZ tail"), r"bad \uZZZZ tail");
        assert_eq!(decode_escapes("trailing\\"), "trailing\\");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(decode_escapes("no escapes here"), "no escapes here");
    }
}
