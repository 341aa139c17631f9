// src/codeforces/models.rs
use serde::{Deserialize, Serialize};

/// A problem entry from the contest page's problem selector, in document
/// order. `letter` is the short code (`A`, `B`, ..., possibly `C1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRef {
    pub letter: String,
    pub title: String,
}

/// Everything the contest index page yields: the round title and the
/// ordered problem list. Built once per parse, immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestPage {
    pub contest_id: String,
    pub title: String,
    pub problems: Vec<ProblemRef>,
}

/// Bookkeeping for one sample test discovered on a problem page. The sample
/// bytes themselves go through the sink as they are found; the page result
/// only records which slots exist and how many bytes each received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// 1-based, assigned in discovery order of the input block.
    pub index: usize,
    pub input_len: Option<u64>,
    pub output_len: Option<u64>,
}

impl TestCase {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            input_len: None,
            output_len: None,
        }
    }
}

/// Result of one problem-page parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemPage {
    pub testcases: Vec<TestCase>,
    /// Set when the document ended while a sample block was still open.
    pub truncated: bool,
}

impl ProblemPage {
    pub fn num_tests(&self) -> usize {
        self.testcases.len()
    }
}
