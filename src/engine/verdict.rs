use crate::engine::models::{ErrorKind, ExecutionResult, Verdict};

/// Classifies one run against an already-trimmed expected output.
///
/// Priority: deadline exceeded, then any other failure, then output
/// comparison. Only leading/trailing whitespace is ignored; everything inside
/// the output must match exactly.
pub fn classify(result: &ExecutionResult, expected_trimmed: &str) -> Verdict {
    match result.error_kind() {
        Some(ErrorKind::Timeout) => Verdict::TimeLimitExceeded,
        Some(_) => Verdict::RuntimeError,
        None if !result.success => Verdict::RuntimeError,
        None if result.output.trim() != expected_trimmed => Verdict::WrongAnswer,
        None => Verdict::Accepted,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ok(output: &str) -> ExecutionResult {
        ExecutionResult::succeeded(output.to_string(), Duration::from_millis(5))
    }

    #[test]
    fn trims_only_the_ends() {
        let expected = "5\n".trim();
        assert_eq!(classify(&ok("5"), expected), Verdict::Accepted);
        assert_eq!(classify(&ok("5 "), expected), Verdict::Accepted);
        assert_eq!(classify(&ok("\n5\n"), expected), Verdict::Accepted);
        assert_eq!(classify(&ok("05"), expected), Verdict::WrongAnswer);

        let expected = "1 2\n3".trim();
        assert_eq!(classify(&ok("1 2\n3\n"), expected), Verdict::Accepted);
        assert_eq!(classify(&ok("1  2\n3"), expected), Verdict::WrongAnswer);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert_eq!(classify(&ok("yes"), "YES"), Verdict::WrongAnswer);
    }

    #[test]
    fn timeout_outranks_other_failures() {
        let result = ExecutionResult::failed(
            ErrorKind::Timeout,
            "deadline exceeded",
            "5\n".to_string(),
            Duration::from_secs(10),
        );
        assert_eq!(classify(&result, "5"), Verdict::TimeLimitExceeded);
    }

    #[test]
    fn errors_and_unsuccessful_runs_are_runtime_errors() {
        let crashed = ExecutionResult::failed(
            ErrorKind::Runtime,
            "exit status 1",
            "5\n".to_string(),
            Duration::from_millis(3),
        );
        assert_eq!(classify(&crashed, "5"), Verdict::RuntimeError);

        let unavailable = ExecutionResult::failed(
            ErrorKind::PoolUnavailable,
            "pool closed",
            String::new(),
            Duration::ZERO,
        );
        assert_eq!(classify(&unavailable, ""), Verdict::RuntimeError);

        let mut unsuccessful = ok("5");
        unsuccessful.success = false;
        assert_eq!(classify(&unsuccessful, "5"), Verdict::RuntimeError);
    }
}
