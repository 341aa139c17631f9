// src/extractors/problem.rs
use std::io::Write;
use std::mem;

use crate::codeforces::models::{ProblemPage, TestCase};
use crate::events::{self, Event};
use crate::utils::error::ExtractError;

/// Which of the two sample artifacts a sink receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Input,
    Output,
}

impl SampleKind {
    pub fn extension(self) -> &'static str {
        match self {
            SampleKind::Input => "in",
            SampleKind::Output => "out",
        }
    }
}

/// Destination factory for sample bytes. The file-backed implementation
/// lives in `storage`; the test suite substitutes an in-memory one. Writers
/// are dropped (and thereby closed) when their block ends or the stream
/// ends, whichever comes first.
pub trait SampleSink {
    type Writer: Write;

    fn open(&mut self, index: usize, kind: SampleKind) -> std::io::Result<Self::Writer>;
}

// One sample block currently owning a writer. `at_newline` tracks whether
// the last byte written was a line break; `</pre>` uses it to terminate the
// block with exactly one newline.
struct OpenBlock<W> {
    writer: W,
    kind: SampleKind,
    index: usize,
    written: u64,
    at_newline: bool,
}

impl<W: Write> OpenBlock<W> {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

enum State<W> {
    Idle,
    AwaitingPre(OpenBlock<W>),
    Copying(OpenBlock<W>),
}

/// Problem statement page extractor. Sample blocks are announced by
/// `div class=input` / `div class=output` and carried inside the following
/// `pre`; the bytes stream into the sink as they are found, and the returned
/// page only holds per-index bookkeeping.
pub struct ProblemExtractor<'a, S: SampleSink> {
    sink: &'a mut S,
    state: State<S::Writer>,
    num_tests: usize,
    page: ProblemPage,
}

impl<'a, S: SampleSink> ProblemExtractor<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            state: State::Idle,
            num_tests: 0,
            page: ProblemPage::default(),
        }
    }

    pub fn handle(&mut self, event: &Event) -> Result<(), ExtractError> {
        match event {
            Event::Start { name, attrs } if name == "div" => {
                if is_sample_div(attrs, "input") {
                    self.num_tests += 1;
                    self.open_block(SampleKind::Input)?;
                } else if is_sample_div(attrs, "output") {
                    self.open_block(SampleKind::Output)?;
                }
            }
            Event::Start { name, .. } if name == "pre" => {
                // A <pre> only starts the copy when a sample sink is waiting
                // for it; stray <pre> blocks elsewhere on the page are markup.
                let state = mem::replace(&mut self.state, State::Idle);
                self.state = match state {
                    State::AwaitingPre(block) => State::Copying(block),
                    other => other,
                };
            }
            Event::Text(data) => {
                if let State::Copying(block) = &mut self.state {
                    // Bare newlines at either end of a text chunk are markup
                    // formatting; line structure inside a sample comes from
                    // <br> tags.
                    block.write(data.trim_matches('\n').as_bytes())?;
                    block.at_newline = false;
                }
            }
            Event::EntityRef(name) => {
                if let State::Copying(block) = &mut self.state {
                    let literal =
                        events::resolve_entity(name).unwrap_or_else(|| format!("&{};", name));
                    // Decoded references leave the newline flag alone.
                    block.write(literal.as_bytes())?;
                }
            }
            Event::End { name } if name == "br" => {
                if let State::Copying(block) = &mut self.state {
                    block.write(b"\n")?;
                    block.at_newline = true;
                }
            }
            Event::End { name } if name == "pre" => {
                if let State::Copying(_) = self.state {
                    let state = mem::replace(&mut self.state, State::Idle);
                    if let State::Copying(block) = state {
                        self.close_block(block, true)?;
                    }
                }
            }
            _ => {} // all other tags are transparent
        }
        Ok(())
    }

    /// Consumes the extractor once the event stream ends. A block still open
    /// at this point means the document was cut short: it is closed as-is
    /// and the page is flagged truncated.
    pub fn finish(mut self) -> Result<ProblemPage, ExtractError> {
        let state = mem::replace(&mut self.state, State::Idle);
        match state {
            State::Idle => {}
            State::AwaitingPre(block) | State::Copying(block) => {
                tracing::warn!(
                    "Document ended inside sample {} of test {}; page marked truncated",
                    match block.kind {
                        SampleKind::Input => "input",
                        SampleKind::Output => "output",
                    },
                    block.index
                );
                self.close_block(block, false)?;
                self.page.truncated = true;
            }
        }
        Ok(self.page)
    }

    fn open_block(&mut self, kind: SampleKind) -> Result<(), ExtractError> {
        // A sample div arriving while the previous block never reached its
        // <pre> closes that sink as-is; writer handles never outlive their
        // block.
        let state = mem::replace(&mut self.state, State::Idle);
        match state {
            State::Idle => {}
            State::AwaitingPre(block) | State::Copying(block) => {
                tracing::debug!(
                    "Sample block for test {} replaced before its <pre> closed",
                    block.index
                );
                self.close_block(block, false)?;
            }
        }

        // Outputs attach to the most recently numbered test; only inputs
        // advance the counter.
        let index = self.num_tests;
        if kind == SampleKind::Output && index == 0 {
            tracing::debug!("Output block before any input block; using index 0");
        }

        self.ensure_case(index);
        let writer = self.sink.open(index, kind)?;
        self.state = State::AwaitingPre(OpenBlock {
            writer,
            kind,
            index,
            written: 0,
            at_newline: false,
        });
        Ok(())
    }

    fn close_block(
        &mut self,
        mut block: OpenBlock<S::Writer>,
        normalize: bool,
    ) -> Result<(), ExtractError> {
        if normalize && !block.at_newline {
            block.write(b"\n")?;
        }
        block.writer.flush()?;

        let case = self.ensure_case(block.index);
        match block.kind {
            SampleKind::Input => case.input_len = Some(block.written),
            SampleKind::Output => case.output_len = Some(block.written),
        }
        Ok(())
    }

    fn ensure_case(&mut self, index: usize) -> &mut TestCase {
        if let Some(pos) = self.page.testcases.iter().position(|c| c.index == index) {
            &mut self.page.testcases[pos]
        } else {
            self.page.testcases.push(TestCase::new(index));
            self.page.testcases.last_mut().unwrap()
        }
    }
}

// Sample divs carry exactly one attribute; anything richer is some other
// element that happens to share the class name.
fn is_sample_div(attrs: &[(String, String)], class: &str) -> bool {
    attrs.len() == 1 && attrs[0].0 == "class" && attrs[0].1 == class
}

/// Feeds a whole problem-page event stream through a fresh extractor.
pub fn extract<S, I>(sink: &mut S, event_stream: I) -> Result<ProblemPage, ExtractError>
where
    S: SampleSink,
    I: IntoIterator<Item = Event>,
{
    let mut extractor = ProblemExtractor::new(sink);
    for event in event_stream {
        extractor.handle(&event)?;
    }
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        files: HashMap<String, SharedBuf>,
    }

    impl SampleSink for MemorySink {
        type Writer = SharedBuf;

        fn open(&mut self, index: usize, kind: SampleKind) -> io::Result<SharedBuf> {
            let buf = SharedBuf::default();
            self.files
                .insert(format!("{}.{}", index, kind.extension()), buf.clone());
            Ok(buf)
        }
    }

    impl MemorySink {
        fn text(&self, name: &str) -> String {
            let buf = self.files.get(name).unwrap_or_else(|| {
                panic!("no sample file {:?}, have {:?}", name, self.files.keys())
            });
            String::from_utf8(buf.0.borrow().clone()).unwrap()
        }
    }

    struct FailingSink;

    impl SampleSink for FailingSink {
        type Writer = SharedBuf;

        fn open(&mut self, _index: usize, _kind: SampleKind) -> io::Result<SharedBuf> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    fn run(html: &str) -> (ProblemPage, MemorySink) {
        let mut sink = MemorySink::default();
        let page = extract(&mut sink, events::stream(html)).unwrap();
        (page, sink)
    }

    #[test]
    fn single_sample_with_br_line_break() {
        let (page, sink) = run(r#"<div class="input"><pre>3 4<br/>5 6</pre></div>"#);
        assert_eq!(page.num_tests(), 1);
        assert_eq!(sink.text("1.in"), "3 4\n5 6\n");
    }

    #[test]
    fn paired_samples_in_discovery_order() {
        let html = r#"
            <div class="input"><pre>1 2</pre></div>
            <div class="output"><pre>3</pre></div>
            <div class="input"><pre>4 5</pre></div>
            <div class="output"><pre>9</pre></div>
        "#;
        let (page, sink) = run(html);
        assert_eq!(page.num_tests(), 2);
        assert_eq!(
            page.testcases.iter().map(|c| c.index).collect::<Vec<_>>(),
            [1, 2]
        );
        assert_eq!(sink.text("1.in"), "1 2\n");
        assert_eq!(sink.text("1.out"), "3\n");
        assert_eq!(sink.text("2.in"), "4 5\n");
        assert_eq!(sink.text("2.out"), "9\n");
        assert!(!page.truncated);
    }

    #[test]
    fn trailing_br_yields_single_newline() {
        let (_, sink) = run(r#"<div class="input"><pre>7<br/></pre></div>"#);
        assert_eq!(sink.text("1.in"), "7\n");
    }

    #[test]
    fn block_without_line_break_still_ends_with_newline() {
        let (_, sink) = run(r#"<div class="input"><pre>42</pre></div>"#);
        assert_eq!(sink.text("1.in"), "42\n");
    }

    #[test]
    fn empty_pre_normalizes_to_one_newline() {
        let (_, sink) = run(r#"<div class="input"><pre></pre></div>"#);
        assert_eq!(sink.text("1.in"), "\n");
    }

    #[test]
    fn text_chunk_edges_lose_bare_newlines() {
        // Markup newlines around the payload disappear; interior line
        // structure comes from <br> only.
        let html = "<div class=\"input\"><pre>\n10 20\n</pre></div>";
        let (_, sink) = run(html);
        assert_eq!(sink.text("1.in"), "10 20\n");
    }

    #[test]
    fn entity_references_decode_to_literal_characters() {
        let (_, sink) = run(r#"<div class="input"><pre>a &amp; b &lt; c</pre></div>"#);
        assert_eq!(sink.text("1.in"), "a & b < c\n");
    }

    #[test]
    fn unknown_entity_reference_passes_through_verbatim() {
        let (_, sink) = run(r#"<div class="input"><pre>x &weird; y</pre></div>"#);
        assert_eq!(sink.text("1.in"), "x &weird; y\n");
    }

    #[test]
    fn stray_pre_without_sample_div_is_ignored() {
        let (page, sink) = run("<pre>source code listing</pre>");
        assert_eq!(page.num_tests(), 0);
        assert!(sink.files.is_empty());
    }

    #[test]
    fn transparent_tags_inside_pre_do_not_break_the_copy() {
        let html = r#"<div class="input"><pre><span>1</span> <span>2</span></pre></div>"#;
        let (_, sink) = run(html);
        assert_eq!(sink.text("1.in"), "1 2\n");
    }

    #[test]
    fn input_div_without_pre_yields_empty_truncated_sample() {
        let (page, sink) = run(r#"<div class="input">"#);
        assert_eq!(page.num_tests(), 1);
        assert_eq!(page.testcases[0].input_len, Some(0));
        assert!(page.truncated);
        assert_eq!(sink.text("1.in"), "");
    }

    #[test]
    fn stream_ending_mid_copy_closes_without_normalization() {
        let (page, sink) = run(r#"<div class="input"><pre>1 2"#);
        assert!(page.truncated);
        // No trailing newline: the block never saw its </pre>.
        assert_eq!(sink.text("1.in"), "1 2");
    }

    #[test]
    fn output_before_any_input_attaches_to_index_zero() {
        let (page, sink) = run(r#"<div class="output"><pre>ok</pre></div>"#);
        assert_eq!(sink.text("0.out"), "ok\n");
        assert_eq!(page.testcases[0].index, 0);
        assert_eq!(page.testcases[0].output_len, Some(3));
        assert_eq!(page.num_tests(), 1);
    }

    #[test]
    fn writer_failure_is_fatal_for_the_extraction() {
        let mut sink = FailingSink;
        let result = extract(&mut sink, events::stream(r#"<div class="input"><pre>1</pre></div>"#));
        assert!(matches!(result, Err(ExtractError::Sink(_))));
    }

    #[test]
    fn same_stream_twice_yields_identical_bytes() {
        let html = r#"
            <div class="input"><pre>5<br/>1 2 3 4 5</pre></div>
            <div class="output"><pre>15</pre></div>
        "#;
        let (page_a, sink_a) = run(html);
        let (page_b, sink_b) = run(html);
        assert_eq!(page_a.testcases, page_b.testcases);
        assert_eq!(sink_a.text("1.in"), sink_b.text("1.in"));
        assert_eq!(sink_a.text("1.out"), sink_b.text("1.out"));
    }
}
