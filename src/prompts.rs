pub const SYSTEM_INSTRUCTION: &str = r#"You translate an analyst's request into filter changes for a sentiment dashboard.
Reply with a single JSON object and nothing else. Recognized keys, all optional:
- "source_type": one of the listed source types, or "All".
- "publisher": one of the listed publishers, or "All".
- "year_range": a two-element array [min_year, max_year] of integers.
Omit every key the request does not ask to change."#;

pub fn user_filter_request(
    text: &str,
    state_json: &str,
    source_types: &str,
    publishers: &str,
    min_year: i32,
    max_year: i32,
) -> String {
    format!(
        r#"CURRENT FILTERS:
<{state}>

AVAILABLE SOURCE TYPES: {sources}
AVAILABLE PUBLISHERS: {pubs}
DATA YEARS: {lo}-{hi}

REQUEST:
<{text}>

CONSTRAINTS:
- JSON object only, no prose.
- Only listed values or "All"; years within {lo}-{hi}."#,
        state = state_json,
        sources = source_types,
        pubs = publishers,
        lo = min_year,
        hi = max_year,
        text = text
    )
}
