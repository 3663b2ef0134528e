use super::ChangeRecord;

/// Rendered in place of a missing side of a before/after pair.
pub const UNKNOWN: &str = "—";

const INSTRUCTIONS: &str = r#"You are a senior flight operations analyst. Analyze each flight leg change below.

Rules:
- Write in clear, professional English.
- Use → to show old-to-new transitions.
- Pick the most fitting emoji for the title:
    ✈  aircraft registration change
    🔄 carrier / airline change
    ⚠️ both aircraft and carrier changed
    ℹ️ informational / minor
- Keep "title" to one concise line (max ~80 chars).
- In "analysis" describe WHAT changed, and briefly note any typical operational implication
  (e.g. tail swap → possible maintenance swap or wet-lease; carrier change → codeshare or subcontractor switch).
- If a value is "—" treat it as unknown/not provided.
- Return ONLY a valid JSON array — no markdown, no extra text.

Output schema (one object per LegId):
[
  {
    "legId": "<string>",
    "title": "<emoji + short title>",
    "analysis": "<detailed English explanation>"
  }
]

Flight changes to analyze:
"#;

/// Builds the single model prompt for a batch of leg changes.
///
/// Output depends only on the records and their order.
pub fn build_prompt(records: &[ChangeRecord]) -> String {
    let lines: Vec<String> = records.iter().map(render_line).collect();

    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str(&lines.join("\n"));
    prompt
}

fn render_line(record: &ChangeRecord) -> String {
    let mut parts = Vec::new();

    if let Some(pair) = transition(
        record.previous_tail_number.as_deref(),
        record.current_tail_number.as_deref(),
    ) {
        parts.push(format!("Aircraft Reg: {}", pair));
    }

    if let Some(pair) = transition(record.previous_carrier.as_deref(), record.current_carrier.as_deref()) {
        parts.push(format!("Carrier: {}", pair));
    }

    format!("• LegId {}: {}", record.leg_id, parts.join(" | "))
}

/// `None` only when both sides are absent.
fn transition(previous: Option<&str>, current: Option<&str>) -> Option<String> {
    if previous.is_none() && current.is_none() {
        return None;
    }

    Some(format!(
        "{} → {}",
        previous.unwrap_or(UNKNOWN),
        current.unwrap_or(UNKNOWN)
    ))
}
