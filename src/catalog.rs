use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub initial_code: String,
}

impl Problem {
    fn new(id: &str, title: &str, description: &str, initial_code: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            initial_code: initial_code.to_string(),
        }
    }
}

/// Read-only list of problems. Room ids usually come from here, but the
/// relay never checks that they do.
pub struct Catalog {
    problems: Vec<Problem>,
}

impl Catalog {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn all(&self) -> &[Problem] {
        &self.problems
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Problem::new(
                "1",
                "Two Sum",
                "Return indices of the two numbers such that they add up to target.",
                "def two_sum(nums, target):\n    pass",
            ),
            Problem::new(
                "2",
                "Reverse String",
                "Reverse the input string.",
                "def reverse_string(s):\n    pass",
            ),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeSubmission {
    pub code: String,
    pub language: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub output: String,
    pub status: String,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Code runs in the browser; the server only acknowledges.
    pub fn acknowledged() -> Self {
        Self {
            output: "Hello World\n".to_string(),
            status: "browser-only".to_string(),
            error: None,
        }
    }
}
