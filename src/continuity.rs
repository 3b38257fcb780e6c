use crate::assembler::ExtractOptions;
use crate::types::{Scene, Snippet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub const DEFAULT_MIN_OVERLAP: f64 = 0.5;
pub const DEFAULT_ID_LENGTH: usize = 4;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub trait SnippetIdSource {
    fn next_id(&mut self) -> String;
}

/// Draws ids uniformly from the 62-symbol alphanumeric alphabet.
pub struct RandomIdSource {
    rng: StdRng,
    length: usize,
}

impl RandomIdSource {
    pub fn new(length: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, length }
    }

    pub fn from_options(options: &ExtractOptions) -> Self {
        Self::new(options.snippet_id_length, options.seed)
    }
}

impl Default for RandomIdSource {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH, None)
    }
}

impl SnippetIdSource for RandomIdSource {
    fn next_id(&mut self) -> String {
        (0..self.length)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

fn id_set<'a>(ids: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    ids.into_iter()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_lowercase())
        .collect()
}

/// Jaccard similarity of two beat-id sets, `None` when they share nothing.
pub fn overlap_score(new_ids: &HashSet<String>, old_ids: &HashSet<String>) -> Option<f64> {
    let intersection = new_ids.intersection(old_ids).count();
    if intersection == 0 {
        return None;
    }
    let union = new_ids.len() + old_ids.len() - intersection;
    Some(intersection as f64 / union as f64)
}

/// Id of the prior snippet whose beats best overlap `new_beat_ids`, if it clears `min_overlap`.
pub fn find_existing_snippet_id<'a, 'n>(
    new_beat_ids: impl IntoIterator<Item = &'n str>,
    existing: impl IntoIterator<Item = &'a Snippet>,
    min_overlap: f64,
) -> Option<&'a str> {
    let new_set = id_set(new_beat_ids);
    if new_set.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;
    for snippet in existing {
        let old_set = id_set(snippet.beat_ids());
        let Some(score) = overlap_score(&new_set, &old_set) else {
            continue;
        };
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((snippet.id.as_str(), score));
        }
    }

    best.filter(|(_, score)| *score >= min_overlap)
        .map(|(id, _)| id)
}

/// Rewrites snippet ids in `scenes` to the ids of matching snippets in `previous`.
pub fn reconcile(scenes: &mut [Scene], previous: &[Scene], min_overlap: f64) -> usize {
    let candidates: Vec<&Snippet> = previous.iter().flat_map(|s| s.snippets()).collect();
    if candidates.is_empty() {
        return 0;
    }

    let mut reused = 0;
    for snippet in scenes
        .iter_mut()
        .flat_map(|s| s.blocks.iter_mut())
        .flat_map(|b| b.snippets.iter_mut())
    {
        let found = find_existing_snippet_id(
            snippet.beats.iter().map(|b| b.id()),
            candidates.iter().copied(),
            min_overlap,
        );
        if let Some(id) = found {
            snippet.id = id.to_string();
            reused += 1;
        }
    }
    reused
}
