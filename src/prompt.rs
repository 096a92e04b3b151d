use crate::core::config::SummaryLanguage;

/// Section headings the model is instructed to produce, in order.
pub const SUMMARY_SECTIONS: [&str; 4] = ["Summary", "Key Decisions", "Action Items", "Participants"];

/// Label used when a speaker cannot be resolved.
pub const UNKNOWN_SPEAKER: &str = "unknown user";

/// Renders one transcript line as `<speaker>:<body>`.
#[must_use]
pub fn render_line(speaker: &str, body: &str) -> String {
    format!("{speaker}:{body}")
}

/// Builds the summarization prompt around an already rendered transcript.
#[must_use]
pub fn build_summary_prompt(transcript: &str, language: SummaryLanguage) -> String {
    let [summary, decisions, actions, participants] = SUMMARY_SECTIONS;
    let language_rule = match language {
        SummaryLanguage::Auto => "Write the summary in the same language as the conversation.",
        SummaryLanguage::English => "Write the summary in English.",
        SummaryLanguage::Russian => "Write the summary in Russian.",
    };

    format!(
        "Analyze and summarize the following team conversation.

CONVERSATION:
{transcript}

Structure the summary as follows:
• **{summary}:** main topics and direction of the discussion
• **{decisions}:** decisions made and agreements reached
• **{actions}:** assigned tasks and deadlines
• **{participants}:** active participants and their role in the discussion

Use clear markdown formatting. {language_rule}"
    )
}
