//! Prompt templates for the extraction calls
//!
//! Placeholders are `{name}` and are filled by [`render`]. Values are
//! inserted verbatim; templates never contain literal braces of their own.

use crate::adapters::llm::ChatMessage;

pub const CONDITION_BUNDLE: &str = "\
You link a patient's active conditions to the recent encounters and current medications that concern them.

For each entry in `conditions`:
1. Pick the `recent_encounters` that relate to it. An encounter relates when its `reason_display` or `type_display` names the condition, a synonym, or a closely related finding (an \"asthma follow-up\" relates to \"Childhood asthma (disorder)\").
2. Pick the `current_medications` that treat or manage it, judged by `name` and `instructions` (inhalers and corticosteroids for asthma, emollients or topical steroids for dermatitis).
3. An encounter or medication may relate to more than one condition, or to none.

Demographics are context only; do not use them to decide relevance.
Answer only through the provided tool, with one bundle per condition.

Patient data:
{patient_info}
";

pub const GUIDELINE_QUERIES: &str = "\
You decide which clinical guideline sections a clinician should read for one of a patient's conditions.

Write between 3 and 5 short, specific search queries for an index of medical guidelines. Cover what a clinician would look up for this condition, for example:
- stepwise or maintenance management
- the listed medications: choice, dosing, escalation, rescue use
- follow-up intervals and what to monitor at encounters
- education and prevention such as trigger avoidance or skin care

Mention the condition and, where useful, the medications or encounter findings in each query.
Answer only through the provided tool.

Patient:
{patient_info}

Condition bundle:
{condition_info}
";

pub const GUIDELINE_RECOMMENDATION: &str = "\
Write one guideline recommendation for the patient condition below, using only the guideline excerpts provided.

The condition comes with the encounters and medications already associated with it. Keep the recommendation specific to that situation and name the guideline it comes from.
Answer only through the provided tool.

Patient condition:
{patient_condition_text}

Guideline excerpts:
{guideline_text}
";

pub const CASE_SUMMARY_SYSTEM: &str = "\
You prepare a concise case summary for a clinician.

You receive the patient's demographics and, for each condition, its related encounters, medications and a guideline recommendation.

- Use the patient's name and age as given.
- `overall_assessment` pulls together all conditions, encounters, medications and recommendations.
- Each condition gets a short `summary`: its current state, encounters that show progress or problems, the medications managing it and whether they follow the guideline, and the recommendations to act on next.
- Be medically accurate, brief and plain-spoken.

Answer only through the provided tool.
";

pub const CASE_SUMMARY_USER: &str = "\
Patient demographics:
{demographic_info}

Conditions and recommendations:
{condition_guideline_info}

Produce the case summary.
";

/// Substitutes `{key}` placeholders
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

pub fn condition_bundle_messages(patient_json: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(render(
        CONDITION_BUNDLE,
        &[("patient_info", patient_json)],
    ))]
}

pub fn guideline_query_messages(demographics: &str, bundle_json: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(render(
        GUIDELINE_QUERIES,
        &[("patient_info", demographics), ("condition_info", bundle_json)],
    ))]
}

pub fn guideline_recommendation_messages(
    demographics: &str,
    bundle_json: &str,
    guideline_text: &str,
) -> Vec<ChatMessage> {
    let condition_text = format!("{demographics}\n\n{bundle_json}");
    vec![ChatMessage::user(render(
        GUIDELINE_RECOMMENDATION,
        &[
            ("patient_condition_text", condition_text.as_str()),
            ("guideline_text", guideline_text),
        ],
    ))]
}

pub fn case_summary_messages(demographics: &str, condition_guideline_info: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CASE_SUMMARY_SYSTEM),
        ChatMessage::user(render(
            CASE_SUMMARY_USER,
            &[
                ("demographic_info", demographics),
                ("condition_guideline_info", condition_guideline_info),
            ],
        )),
    ]
}
