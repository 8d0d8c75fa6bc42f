//! Skill Q&A: pairing generated questions with missing skills and folding
//! the answers back into a single text block for resume generation.

use std::collections::HashMap;

use tracing::warn;

use crate::session::SkillPrompt;

pub fn field_id(index: usize) -> String {
    format!("skill-{index}")
}

/// The templated question used when generation fails.
pub fn fallback_question(skill: &str) -> String {
    format!("What experience do you have with {skill}?")
}

/// One templated question per skill.
pub fn fallback_prompts(skills: &[String]) -> Vec<SkillPrompt> {
    skills
        .iter()
        .enumerate()
        .map(|(index, skill)| SkillPrompt {
            field_id: field_id(index),
            skill: skill.clone(),
            question: fallback_question(skill),
        })
        .collect()
}

/// Pairs generated questions with skills by position.
///
/// On a count mismatch the longer side is truncated and a warning logged.
/// An empty pairing (no usable questions at all) falls back to the
/// templated questions so the user always has something to answer.
pub fn pair_prompts(skills: &[String], questions: Vec<String>) -> Vec<SkillPrompt> {
    if questions.len() != skills.len() {
        warn!(
            questions = questions.len(),
            skills = skills.len(),
            "generated question count differs from missing skills; truncating"
        );
    }

    let prompts: Vec<SkillPrompt> = skills
        .iter()
        .zip(questions)
        .enumerate()
        .filter(|(_, (_, question))| !question.trim().is_empty())
        .map(|(index, (skill, question))| SkillPrompt {
            field_id: field_id(index),
            skill: skill.clone(),
            question: question.trim().to_string(),
        })
        .collect();

    if prompts.is_empty() && !skills.is_empty() {
        warn!("no usable generated questions; using templated questions");
        return fallback_prompts(skills);
    }
    prompts
}

/// `"<skill>: <answer>"` for every non-empty answer, in display order,
/// separated by blank lines.
pub fn combine_answers(prompts: &[SkillPrompt], answers: &HashMap<String, String>) -> String {
    prompts
        .iter()
        .filter_map(|prompt| {
            let answer = answers.get(&prompt.field_id)?.trim();
            (!answer.is_empty()).then(|| format!("{}: {}", prompt.skill, answer))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
