// src/extractors/contest.rs
use crate::codeforces::models::{ContestPage, ProblemRef};
use crate::events::{self, Event};
use once_cell::sync::Lazy;
use regex::Regex;

// A problem selector value is one capital letter with an optional digit:
// A, B, ..., sometimes C1/C2 for split problems.
static PROBLEM_LETTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]?$").expect("Failed to compile PROBLEM_LETTER_RE"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Scanning,
    Title,
    Problem,
}

/// Contest index page extractor: recovers the round title and the ordered
/// problem list from the raw event stream, one event at a time.
///
/// The title anchor is recognized by its exact attribute list, order
/// included; the problem entries by single-attribute `option` tags whose
/// value is a problem letter. A page variant that doesn't match leaves the
/// corresponding field empty rather than erroring.
pub struct ContestExtractor {
    title_attrs: Vec<(String, String)>,
    mode: Mode,
    page: ContestPage,
}

impl ContestExtractor {
    pub fn new(contest_id: &str) -> Self {
        Self {
            title_attrs: vec![
                ("style".to_string(), "color: black".to_string()),
                ("href".to_string(), format!("/contest/{}", contest_id)),
            ],
            mode: Mode::Scanning,
            page: ContestPage {
                contest_id: contest_id.to_string(),
                ..ContestPage::default()
            },
        }
    }

    pub fn handle(&mut self, event: &Event) {
        match (self.mode, event) {
            (Mode::Scanning, Event::Start { name, attrs }) => {
                if self.page.title.is_empty() && *attrs == self.title_attrs {
                    self.mode = Mode::Title;
                } else if name == "option"
                    && attrs.len() == 1
                    && PROBLEM_LETTER_RE.is_match(&attrs[0].1)
                {
                    self.page.problems.push(ProblemRef {
                        letter: attrs[0].1.clone(),
                        title: String::new(),
                    });
                    self.mode = Mode::Problem;
                }
            }
            (Mode::Title, Event::Text(data)) => self.page.title.push_str(data),
            (Mode::Title, Event::EntityRef(name)) => {
                push_entity(&mut self.page.title, name);
            }
            (Mode::Title, Event::End { name }) if name == "a" => self.mode = Mode::Scanning,
            (Mode::Problem, Event::Text(data)) => {
                if let Some(problem) = self.page.problems.last_mut() {
                    problem.title.push_str(data);
                }
            }
            (Mode::Problem, Event::EntityRef(name)) => {
                if let Some(problem) = self.page.problems.last_mut() {
                    push_entity(&mut problem.title, name);
                }
            }
            (Mode::Problem, Event::End { name }) if name == "option" => {
                self.mode = Mode::Scanning;
            }
            _ => {} // unrelated markup
        }
    }

    pub fn finish(self) -> ContestPage {
        if self.page.title.is_empty() {
            tracing::debug!(
                "No title anchor matched for contest {}",
                self.page.contest_id
            );
        }
        self.page
    }
}

fn push_entity(buf: &mut String, name: &str) {
    match events::resolve_entity(name) {
        Some(literal) => buf.push_str(&literal),
        None => {
            buf.push('&');
            buf.push_str(name);
            buf.push(';');
        }
    }
}

/// Runs a whole contest-page event stream through a fresh extractor.
pub fn extract<I>(contest_id: &str, event_stream: I) -> ContestPage
where
    I: IntoIterator<Item = Event>,
{
    let mut extractor = ContestExtractor::new(contest_id);
    for event in event_stream {
        extractor.handle(&event);
    }
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    const CONTEST_HTML: &str = r#"
        <html><body>
        <div class="menu"><a href="/contests">Contests</a></div>
        <a style="color: black" href="/contest/1464">Codeforces Round 692</a>
        <select>
        <option value="">Choose problem</option>
        <option value="A">Peaceful Rooks</option>
        <option value="B">Grime Zoo</option>
        <option value="C1">Not Adding Up (easy version)</option>
        <option value="D" data-extra="x">Ignored Twice</option>
        </select>
        </body></html>
    "#;

    fn run(html: &str) -> ContestPage {
        extract("1464", events::stream(html))
    }

    #[test]
    fn contest_title_and_problems_in_document_order() {
        let page = run(CONTEST_HTML);
        assert_eq!(page.title, "Codeforces Round 692");
        let letters: Vec<&str> = page.problems.iter().map(|p| p.letter.as_str()).collect();
        assert_eq!(letters, ["A", "B", "C1"]);
        assert_eq!(page.problems[0].title, "Peaceful Rooks");
        assert_eq!(page.problems[2].title, "Not Adding Up (easy version)");
    }

    #[test]
    fn option_with_two_attributes_is_ignored() {
        let page = run(CONTEST_HTML);
        // "D" carries a second attribute, so it is not a selector entry
        assert!(page.problems.iter().all(|p| p.letter != "D"));
    }

    #[test]
    fn empty_or_non_letter_option_values_are_ignored() {
        let html = r#"<select>
            <option value="">none</option>
            <option value="AB">two letters</option>
            <option value="a">lowercase</option>
            <option value="A12">too long</option>
        </select>"#;
        let page = run(html);
        assert!(page.problems.is_empty());
    }

    #[test]
    fn anchor_with_different_attributes_leaves_title_empty() {
        // Same href but the style attribute differs: exact matching means
        // silent omission, not a near-match.
        let html = r#"<a style="color: red" href="/contest/1464">Round name</a>"#;
        let page = run(html);
        assert_eq!(page.title, "");
    }

    #[test]
    fn attribute_order_matters_for_the_title_anchor() {
        let html = r#"<a href="/contest/1464" style="color: black">Round name</a>"#;
        let page = run(html);
        assert_eq!(page.title, "");
    }

    #[test]
    fn title_anchor_for_another_contest_is_ignored() {
        let html = r#"<a style="color: black" href="/contest/99">Other round</a>"#;
        let page = run(html);
        assert_eq!(page.title, "");
    }

    #[test]
    fn only_the_first_matching_anchor_feeds_the_title() {
        let html = r#"
            <a style="color: black" href="/contest/1464">First</a>
            <a style="color: black" href="/contest/1464">Second</a>
        "#;
        let page = run(html);
        assert_eq!(page.title, "First");
    }

    #[test]
    fn title_concatenates_text_and_entities() {
        let html = r#"<a style="color: black" href="/contest/1464">Hello &amp; Codeforces</a>"#;
        let page = run(html);
        assert_eq!(page.title, "Hello & Codeforces");
    }

    #[test]
    fn same_stream_twice_yields_identical_pages() {
        let first = run(CONTEST_HTML);
        let second = run(CONTEST_HTML);
        assert_eq!(first.title, second.title);
        assert_eq!(first.problems, second.problems);
    }
}
