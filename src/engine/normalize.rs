use std::{collections::HashMap, sync::LazyLock};

static ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let table: &[(&str, &[&str])] = &[
        (
            "js",
            &[
                "js", "jscript", "javscript", "javsscript", "javascipt", "javasript",
                "javascript", "java script", "jscipt", "node", "nodejs",
            ],
        ),
        (
            "python",
            &[
                "python", "pyt", "pyn", "pythn", "phyton", "py", "py thon", "pthon", "python3",
            ],
        ),
        ("go", &["go", "golang", "gol", "goo", "g o", "golangg"]),
        (
            "cpp",
            &["cpp", "c++", "cp", "cppp", "c plus", "cxx", "cc", "cpp "],
        ),
        ("c", &["c", " c", "c ", "clang"]),
        ("java", &["java", "jav", "jvaa", "java11", "java17"]),
    ];
    table
        .iter()
        .flat_map(|(canonical, aliases)| aliases.iter().map(move |alias| (*alias, *canonical)))
        .collect()
});

/// Maps a user-supplied language name to its canonical id. Unknown names come
/// back lower-cased and unchanged; the profile lookup rejects them.
pub fn normalize_language(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    ALIASES
        .get(lowered.as_str())
        .map(|canonical| canonical.to_string())
        .unwrap_or(lowered)
}
