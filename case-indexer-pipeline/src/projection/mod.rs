//! Projection builder.
//!
//! Derives the flat [`SearchableProjection`] from a validated case document.
//! The derivation is a pure function of the document: absent nested values
//! render as empty text or empty lists, never as errors.

pub mod text;

use case_indexer_shared::{CaseDocument, ProjectionValue, SearchableProjection};

use text::{flatten, join_labels, join_text, render_fishbone, render_five_whys, scalar_text};

/// Build the searchable projection of a case.
pub fn build_projection(case: &CaseDocument) -> SearchableProjection {
    let phases = &case.phases;
    let team = &phases.d1_d2.data;
    let narrative = &phases.d3.data;
    let analysis = &phases.d5.data;

    SearchableProjection {
        problem_description: scalar_text(&team.problem_description),
        team_members: flatten(std::iter::once(&team.team_members)),
        what_happened: scalar_text(&narrative.what_happened),
        why_problem: scalar_text(&narrative.why_problem),
        when: scalar_text(&narrative.when),
        where_: scalar_text(&narrative.where_),
        who: scalar_text(&narrative.who),
        how_identified: scalar_text(&narrative.how_identified),
        impact: scalar_text(&narrative.impact),
        immediate_actions_text: join_labels(&phases.d4.data.actions, "action"),
        permanent_actions_text: join_labels(&phases.d6.data.actions, "action"),
        investigation_tasks_text: join_labels(&analysis.investigation_tasks, "task"),
        factors_text: join_labels(&analysis.factors, "factor"),
        fishbone_text: render_fishbone(&analysis.fishbone),
        five_whys_text: render_five_whys(&analysis.five_whys),
        evidence_descriptions: join_text(case.evidence.iter().map(|e| scalar_text(&e.description))),
        evidence_tags: flatten(case.evidence.iter().map(|e| &e.tags)),
        ai_summary: case
            .ai
            .as_ref()
            .map(|ai| ai.summary.clone())
            .unwrap_or_default(),
    }
}

/// Concatenate the projection's text into the embedding input.
///
/// Fields are taken in projection order; list fields contribute one line per
/// entry. Only projection text is embedded, never raw case JSON.
pub fn embedding_input(projection: &SearchableProjection) -> String {
    join_text(projection.fields().into_iter().map(|(_, value)| match value {
        ProjectionValue::Text(text) => text.to_string(),
        ProjectionValue::List(items) => join_text(items),
    }))
}
