use crate::engine::models::{Problem, TestCase};

/// Static, read-only problem set loaded at startup.
#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            problem(
                "sum-two-numbers",
                "Sum Two Numbers",
                "### Task\nRead two integers and output their sum.\n\n### Notes\n- Input fits in 32-bit signed integer.\n- Output should include a newline.",
                "Two integers A and B separated by space.",
                "`0 ≤ A, B ≤ 10^9`",
                &[("2 3\n", "5\n"), ("100 250\n", "350\n")],
            ),
            problem(
                "fizzbuzz",
                "FizzBuzz",
                "### Task\nPrint numbers from 1 to N.\n- Multiples of 3 => `Fizz`\n- Multiples of 5 => `Buzz`\n- Multiples of 15 => `FizzBuzz`",
                "Single integer N.",
                "`1 ≤ N ≤ 10^3`",
                &[
                    ("5\n", "1\n2\nFizz\n4\nBuzz\n"),
                    (
                        "15\n",
                        "1\n2\nFizz\n4\nBuzz\nFizz\n7\n8\nFizz\nBuzz\n11\nFizz\n13\n14\nFizzBuzz\n",
                    ),
                ],
            ),
            problem(
                "balanced-brackets",
                "Balanced Brackets",
                "### Task\nGiven a string of brackets, determine if the sequence is balanced.",
                "A single string containing characters `()[]{}` only.",
                "`1 ≤ length ≤ 10^5`",
                &[("{}[]()\n", "YES\n"), ("{[}]\n", "NO\n")],
            ),
            problem(
                "two-sum",
                "Two Sum",
                "### Task\nGiven an array and a target, determine if any pair sums to the target.",
                "First line: N and target. Second line: N integers.",
                "`2 ≤ N ≤ 10^5` (values fit in 32-bit signed int)",
                &[("4 9\n2 7 11 15\n", "YES\n"), ("3 10\n1 2 3\n", "NO\n")],
            ),
            problem(
                "matrix-trace",
                "Matrix Trace",
                "### Task\nCompute the trace of an `N x N` matrix (sum of diagonal elements).",
                "First line: N. Next N lines: N integers each.",
                "`1 ≤ N ≤ 200`",
                &[("3\n1 2 3\n4 5 6\n7 8 9\n", "15\n"), ("2\n10 1\n1 10\n", "20\n")],
            ),
        ])
    }

    pub fn list(&self) -> &[Problem] {
        &self.problems
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }
}

fn problem(
    id: &str,
    title: &str,
    description: &str,
    input_format: &str,
    constraints: &str,
    cases: &[(&str, &str)],
) -> Problem {
    Problem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        input_format: input_format.to_string(),
        constraints: constraints.to_string(),
        test_cases: cases
            .iter()
            .enumerate()
            .map(|(idx, (input, expected))| TestCase {
                name: format!("Sample #{}", idx + 1),
                input: input.to_string(),
                expected_output: expected.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::ProblemCatalog;

    #[test]
    fn builtin_catalog_keeps_declared_case_order() {
        let catalog = ProblemCatalog::builtin();
        assert_eq!(catalog.list().len(), 5);

        let sum = catalog.get("sum-two-numbers").unwrap();
        assert_eq!(sum.test_cases.len(), 2);
        assert_eq!(sum.test_cases[0].name, "Sample #1");
        assert_eq!(sum.test_cases[0].input, "2 3\n");
        assert_eq!(sum.test_cases[1].expected_output, "350\n");
        assert!(catalog.get("missing").is_none());
    }
}
