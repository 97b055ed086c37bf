//! Picks one annotation out of the candidates a query returns.
//!
//! Adding every spotted entity would swamp a document with foreign text, so
//! the candidate whose surface form carries the heaviest corpus token wins.

use crate::client::Annotation;
use std::collections::HashMap;

/// Relative margin within which two token weights count as a near-tie.
pub const WEIGHT_TIE_MARGIN: f64 = 0.05;

/// Selects the annotation backed by the heaviest token in `weights`.
///
/// A lone candidate is accepted as-is. Otherwise each whitespace token of
/// each surface form competes: a clearly heavier token displaces the
/// incumbent, and a near-tie (within `margin`, relative) is broken by
/// support, then by similarity score. Candidates whose surface forms carry
/// no weighted token at all never win.
#[must_use]
pub fn pick_annotation<'a>(
    annotations: &'a [Annotation],
    weights: &HashMap<String, f64>,
    margin: f64,
) -> Option<&'a Annotation> {
    if annotations.len() <= 1 {
        return annotations.first();
    }

    let mut max_weight = 0.0f64;
    let mut best: Option<&Annotation> = None;
    for annotation in annotations {
        for token in annotation.surface_form.split_whitespace() {
            let Some(&weight) = weights.get(token) else {
                continue;
            };
            if max_weight == 0.0 || weight > max_weight * (1.0 + margin) {
                max_weight = weight;
                best = Some(annotation);
            } else if (weight - max_weight).abs() / max_weight <= margin {
                if let Some(current) = best {
                    if annotation.support > current.support
                        || (annotation.support == current.support
                            && annotation.similarity > current.similarity)
                    {
                        max_weight = weight;
                        best = Some(annotation);
                    }
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(surface: &str, support: i64, similarity: f64) -> Annotation {
        Annotation {
            uri: format!("http://dbpedia.org/resource/{}", surface.replace(' ', "_")),
            surface_form: surface.to_string(),
            types: Vec::new(),
            support,
            similarity,
        }
    }

    fn weights(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|&(t, w)| (t.to_string(), w)).collect()
    }

    #[test]
    fn a_lone_candidate_is_accepted_without_weights() {
        let candidates = vec![annotation("brass", 3, 0.2)];
        let chosen = pick_annotation(&candidates, &weights(&[]), WEIGHT_TIE_MARGIN);
        assert_eq!(chosen, Some(&candidates[0]));
        assert_eq!(pick_annotation(&[], &weights(&[]), WEIGHT_TIE_MARGIN), None);
    }

    #[test]
    fn unweighted_surface_forms_never_win() {
        let candidates = vec![annotation("brass", 3, 0.2), annotation("zinc", 9, 0.9)];
        assert_eq!(
            pick_annotation(&candidates, &weights(&[("steam", 1.0)]), WEIGHT_TIE_MARGIN),
            None
        );
    }

    #[test]
    fn a_clearly_heavier_token_displaces_the_incumbent() {
        let candidates = vec![
            annotation("clay", 10, 0.9),
            annotation("steam", 5, 0.1),
            annotation("engine", 9, 0.5),
        ];
        let w = weights(&[("clay", 0.2), ("steam", 0.9), ("engine", 0.88)]);
        // clay adopted first; steam clearly heavier; engine near-ties steam
        // and wins on support.
        let chosen = pick_annotation(&candidates, &w, WEIGHT_TIE_MARGIN).unwrap();
        assert_eq!(chosen.surface_form, "engine");
    }

    #[test]
    fn near_ties_with_equal_support_fall_to_similarity() {
        let candidates = vec![annotation("brass", 7, 0.3), annotation("bronze", 7, 0.8)];
        let w = weights(&[("brass", 0.5), ("bronze", 0.5)]);
        let chosen = pick_annotation(&candidates, &w, WEIGHT_TIE_MARGIN).unwrap();
        assert_eq!(chosen.surface_form, "bronze");
    }

    #[test]
    fn a_lighter_token_outside_the_margin_changes_nothing() {
        let candidates = vec![annotation("steam", 1, 0.1), annotation("clay", 99, 0.99)];
        let w = weights(&[("steam", 0.9), ("clay", 0.3)]);
        let chosen = pick_annotation(&candidates, &w, WEIGHT_TIE_MARGIN).unwrap();
        assert_eq!(chosen.surface_form, "steam");
    }

    #[test]
    fn multiword_surface_forms_compete_token_by_token() {
        let candidates = vec![
            annotation("beam engine", 4, 0.6),
            annotation("water wheel", 2, 0.4),
        ];
        let w = weights(&[("engine", 0.7), ("water", 0.2), ("wheel", 0.1)]);
        let chosen = pick_annotation(&candidates, &w, WEIGHT_TIE_MARGIN).unwrap();
        assert_eq!(chosen.surface_form, "beam engine");
    }
}
