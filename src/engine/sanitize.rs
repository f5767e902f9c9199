use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionError {
    #[error("code is empty")]
    Empty,
    #[error("code exceeds maximum length of {max} bytes")]
    TooLong { max: usize },
    #[error("code contains NUL bytes")]
    NulByte,
    #[error("code uses a restricted construct: {0}")]
    Forbidden(&'static str),
}

struct Rule {
    languages: &'static [&'static str],
    label: &'static str,
    pattern: Regex,
}

fn rule(languages: &'static [&'static str], label: &'static str, pattern: &str) -> Rule {
    Rule {
        languages,
        label,
        pattern: Regex::new(pattern).expect("sanitizer pattern is valid"),
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(&["python"], "subprocess", r"\bsubprocess\b"),
        rule(&["python"], "os.system", r"\bos\s*\.\s*(system|popen|exec\w*|fork|spawn\w*)\b"),
        rule(&["python"], "socket", r"\bimport\s+socket\b|\bfrom\s+socket\b"),
        rule(&["js"], "child_process", r"child_process"),
        rule(&["js"], "network module", r#"require\s*\(\s*['"](net|http|https|dgram)['"]\s*\)"#),
        rule(&["go"], "os/exec", r#""os/exec""#),
        rule(&["go"], "syscall", r#""syscall""#),
        rule(&["go"], "net", r#""net(/http)?""#),
        rule(&["c", "cpp"], "system()", r"\bsystem\s*\("),
        rule(&["c", "cpp"], "fork()", r"\b(v?fork|popen)\s*\("),
        rule(&["c", "cpp"], "exec family", r"\bexec(l|lp|le|v|vp|vpe|ve)\s*\("),
        rule(&["java"], "Runtime.exec", r"Runtime\s*\.\s*getRuntime\s*\(\s*\)\s*\.\s*exec"),
        rule(&["java"], "ProcessBuilder", r"\bProcessBuilder\b"),
    ]
});

/// Checks code before it is admitted to the pool. `max_len` is a call-site
/// policy: ad-hoc runs use a small ceiling, judged submissions a large one.
pub fn sanitize(code: &str, language: &str, max_len: usize) -> Result<(), RejectionError> {
    if code.trim().is_empty() {
        return Err(RejectionError::Empty);
    }
    if code.len() > max_len {
        return Err(RejectionError::TooLong { max: max_len });
    }
    if code.contains('\0') {
        return Err(RejectionError::NulByte);
    }
    for rule in RULES.iter() {
        if rule.languages.contains(&language) && rule.pattern.is_match(code) {
            return Err(RejectionError::Forbidden(rule.label));
        }
    }
    Ok(())
}
