use std::sync::OnceLock;

use regex::Regex;

use super::chunk::EntryBatch;

pub const SYSTEM_PROMPT: &str = "You are a professional AI analyst and technology editor. \
Your job is to analyse, filter and summarize important AI developments and present them in a news style. \
Output strictly in the format the user specifies and add nothing else.";

fn paragraph_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</?p(?:\s[^>]*)?>").expect("static regex"))
}

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\r\n]+").expect("static regex"))
}

/// Drop `<p>`/`</p>` markup, fold line breaks into single spaces, trim.
pub fn clean_summary(raw: &str) -> String {
    let stripped = paragraph_tags().replace_all(raw, "");
    line_breaks().replace_all(&stripped, " ").trim().to_string()
}

/// Render the user prompt for one batch. IDs are 1-based and local to the batch.
pub fn build_prompt(batch: &EntryBatch<'_>, language: &str) -> String {
    let records: Vec<String> = batch
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "ID:{}\nSource:{}\nTitle:{}\nLink:{}\nSummary:{}\n---",
                i + 1,
                e.source,
                e.title,
                e.link,
                clean_summary(&e.summary)
            )
        })
        .collect();

    format!(
        r#"
Analyse the following list of technology news collected from several sources. Your tasks:
1. **Filter**: keep only news that is directly about artificial intelligence (AI) and is significant or innovative. Strictly discard items that are unrelated, trivial, without a clear technical or research contribution, or duplicates of each other.
2. **Detailed summary**: for every item you keep, write a detailed, self-contained summary in {language} (about 200-300 words) that explains its background, the key method, what is novel, and the results or likely impact.
3. **Ranking**: order the kept items from most to least important.
4. **Output format**: output strictly in the Markdown format below. Do not include the original link. Do not add any explanation, preamble or closing remarks.

### [news title]
- **source**: [source name]
- **summary**: [your detailed summary]

---
News items to process:
{entries}
"#,
        language = language,
        entries = records.join("\n"),
    )
}
