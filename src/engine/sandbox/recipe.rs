//! Sandbox invocation recipes.
//!
//! Source code and stdin only ever travel as [`Artifact`] contents. Steps are
//! fixed argument vectors that refer to artifacts by relative path, so nothing
//! a submission contains can change what gets executed.

pub const INPUT_ARTIFACT: &str = "input.txt";

/// Exit status of [`Recipe::shell_script`] when a build step fails.
pub const BUILD_FAILED_STATUS: i32 = 97;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: &'static str,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub program: String,
    pub args: Vec<String>,
}

impl Step {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn shell_words(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub image: &'static str,
    pub artifacts: Vec<Artifact>,
    /// Run in order before `run`; the first nonzero exit stops the chain.
    pub build: Vec<Step>,
    /// Reads [`INPUT_ARTIFACT`] on stdin.
    pub run: Step,
}

impl Recipe {
    pub fn new(
        image: &'static str,
        source_name: &'static str,
        code: &str,
        stdin: &str,
        build: Vec<Step>,
        run: Step,
    ) -> Self {
        Self {
            image,
            artifacts: vec![
                Artifact {
                    name: source_name,
                    contents: code.to_string(),
                },
                Artifact {
                    name: INPUT_ARTIFACT,
                    contents: stdin.to_string(),
                },
            ],
            build,
            run,
        }
    }

    /// Single `sh -c` command for backends that cannot launch argv directly.
    /// A failed build exits with [`BUILD_FAILED_STATUS`] before the run step.
    pub fn shell_script(&self) -> String {
        let run = format!(
            "{} < {}",
            self.run.shell_words(),
            shell_quote(INPUT_ARTIFACT)
        );
        if self.build.is_empty() {
            return run;
        }
        let build = self
            .build
            .iter()
            .map(Step::shell_words)
            .collect::<Vec<_>>()
            .join(" && ");
        format!("{{ {build}; }} || exit {BUILD_FAILED_STATUS}; {run}")
    }
}

/// Quotes one word for POSIX `sh`. Every string interpolated into a shell
/// command goes through here.
pub fn shell_quote(word: &str) -> String {
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for ch in word.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}
