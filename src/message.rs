use log::warn;

use crate::models::{Block, NotificationMessage, RunContext, RunOutcome, TestSummary};

// Slack rejects payloads beyond these limits.
const SECTION_TEXT_LIMIT: usize = 3000;
const HEADER_TEXT_LIMIT: usize = 150;
const MAX_BLOCKS: usize = 50;

pub fn headline_suffix(outcome: RunOutcome, summary: &TestSummary) -> &'static str {
    match outcome {
        RunOutcome::Unknown => "UNKNOWN RESULT",
        RunOutcome::Cancelled | RunOutcome::Skipped => "TEST NOT FINISHED",
        _ if !summary.ran => "NO TEST RESULT",
        RunOutcome::Success => "Passed",
        RunOutcome::Failure => "Failed",
    }
}

/// Build the chat message announcing the result of a test run.
pub fn build(outcome: RunOutcome, summary: &TestSummary, run: &RunContext) -> NotificationMessage {
    let headline = format!("{} - {}", run.job_name, headline_suffix(outcome, summary));

    let mut blocks = vec![
        Block::header(truncate(&headline, HEADER_TEXT_LIMIT)),
        Block::section(format!("<{}|View run>", run.run_url)),
    ];

    if summary.ran {
        blocks.push(Block::section(format!(
            "Tests: {}, failed: {}, skipped: {}",
            summary.total_tests, summary.total_failed, summary.total_skipped
        )));
    }

    if summary.has_failures() {
        blocks.push(Block::Divider);
        let title = format!("*Failed tests ({}):*", summary.total_failed);
        let budget = MAX_BLOCKS - blocks.len();
        blocks.extend(
            failure_sections(&title, &summary.failed_identifiers, budget)
                .into_iter()
                .map(Block::section),
        );
    }

    NotificationMessage {
        headline,
        detail_blocks: blocks,
    }
}

/// Cut `text` to at most `limit` characters, marking the cut with an ellipsis.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}

struct Chunk {
    text: String,
    lines: usize,
}

/// At most `budget` sections listing `ids`; when they do not fit, the last
/// section says how many identifiers were left out.
fn failure_sections(title: &str, ids: &[String], budget: usize) -> Vec<String> {
    let chunks = chunk_lines(title, ids);
    if chunks.len() <= budget {
        return chunks.into_iter().map(|chunk| chunk.text).collect();
    }

    let kept = budget.saturating_sub(1);
    let listed: usize = chunks[..kept].iter().map(|chunk| chunk.lines).sum();
    let mut sections: Vec<String> = chunks.into_iter().take(kept).map(|c| c.text).collect();
    sections.push(format!("…and {} more", ids.len() - listed));
    sections
}

/// Join `lines` under `title`, one per line, starting a new chunk whenever
/// the next line would push the text over the section limit.
fn chunk_lines(title: &str, lines: &[String]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk {
        text: title.to_string(),
        lines: 0,
    };

    for line in lines {
        if line.chars().count() > SECTION_TEXT_LIMIT {
            warn!(
                "Failed test identifier longer than {SECTION_TEXT_LIMIT} characters was shortened"
            );
        }
        let line = truncate(line, SECTION_TEXT_LIMIT);
        if !current.text.is_empty()
            && current.text.chars().count() + 1 + line.chars().count() > SECTION_TEXT_LIMIT
        {
            chunks.push(std::mem::replace(
                &mut current,
                Chunk {
                    text: String::new(),
                    lines: 0,
                },
            ));
        }
        if !current.text.is_empty() {
            current.text.push('\n');
        }
        current.text.push_str(&line);
        current.lines += 1;
    }

    if !current.text.is_empty() {
        chunks.push(current);
    }
    chunks
}
