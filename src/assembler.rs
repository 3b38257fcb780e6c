use crate::ast::{BraceKind, ExpressionClause, SourceLine};
use crate::continuity::{self, RandomIdSource, SnippetIdSource};
use crate::error::{DinkError, Diagnostic, Severity};
use crate::parser;
use crate::tags::TagCascade;
use crate::types::{
    ActionLine, Beat, BeatCommon, Block, DialogueLine, Extraction, NonDialogueLine, Origin, Scene,
    Snippet,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::mem;

const MERGE_COMMENT: &str = "MERGE";
const MAX_ID_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub verbose: bool,
    pub min_overlap_score: f64,
    pub snippet_id_length: usize,
    pub unique_snippet_ids: bool,
    pub seed: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            min_overlap_score: continuity::DEFAULT_MIN_OVERLAP,
            snippet_id_length: continuity::DEFAULT_ID_LENGTH,
            unique_snippet_ids: false,
            seed: None,
        }
    }
}

impl ExtractOptions {
    pub fn from_json(json: &str) -> Result<Self, DinkError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), DinkError> {
        if !(0.0..=1.0).contains(&self.min_overlap_score) {
            return Err(DinkError::InvalidOptions(format!(
                "min_overlap_score must be within 0..=1, got {}",
                self.min_overlap_score
            )));
        }
        if self.snippet_id_length == 0 {
            return Err(DinkError::InvalidOptions(
                "snippet_id_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One level of `{ ... }` nesting and the comments written just before it opened.
struct BraceNode {
    parent: Option<usize>,
    comments: Vec<String>,
}

pub struct Extractor {
    options: ExtractOptions,
    ids: Box<dyn SnippetIdSource>,
    issued_ids: HashSet<String>,

    scenes: Vec<Scene>,
    non_dialogue_lines: Vec<NonDialogueLine>,
    diagnostics: Vec<Diagnostic>,

    scene: Option<Scene>,
    block: Option<Block>,
    snippet: Option<Snippet>,
    comments: Vec<String>,

    braces: Vec<BraceNode>,
    brace_top: Option<usize>,
    brace_depth: usize,

    group_level: usize,
    group_ordinal: u32,
    group_members: u32,
    in_options: bool,

    tags: TagCascade,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        let ids = RandomIdSource::from_options(&options);
        Self::with_id_source(options, Box::new(ids))
    }

    pub fn with_id_source(options: ExtractOptions, ids: Box<dyn SnippetIdSource>) -> Self {
        Self {
            options,
            ids,
            issued_ids: HashSet::new(),
            scenes: Vec::new(),
            non_dialogue_lines: Vec::new(),
            diagnostics: Vec::new(),
            scene: None,
            block: None,
            snippet: None,
            comments: Vec::new(),
            braces: Vec::new(),
            brace_top: None,
            brace_depth: 0,
            group_level: 0,
            group_ordinal: 0,
            group_members: 0,
            in_options: false,
            tags: TagCascade::new(),
        }
    }

    pub fn extract_text(self, text: &str, source_path: &str, previous: Option<&[Scene]>) -> Extraction {
        let lines = parser::preprocess(text, source_path);
        self.extract(lines, previous)
    }

    pub fn extract(mut self, lines: Vec<SourceLine>, previous: Option<&[Scene]>) -> Extraction {
        for line in lines {
            self.handle_line(&line.text, line.origin);
        }
        self.commit_scene();

        let mut scenes = self.scenes;
        if let Some(previous) = previous {
            let reused =
                continuity::reconcile(&mut scenes, previous, self.options.min_overlap_score);
            if self.options.verbose {
                tracing::debug!(reused, "reused snippet ids from previous extraction");
            }
        }

        Extraction {
            scenes,
            non_dialogue_lines: self.non_dialogue_lines,
            diagnostics: self.diagnostics,
        }
    }

    fn handle_line(&mut self, raw: &str, origin: Origin) {
        let (line, trailing) = parser::split_trailing_comment(raw.trim());
        if let Some(comment) = trailing {
            self.comments.push(comment.to_string());
        }
        if line.is_empty() {
            return;
        }

        if let Some(tokens) = parser::parse_tag_line(line) {
            let scope = self.tags.route(tokens);
            self.trace(|| format!("tag line routed to {:?}: {}", scope, line));
            return;
        }

        if parser::is_script_statement(line) {
            return;
        }

        self.tags.mark_content();

        match parser::brace_kind(line) {
            Some(BraceKind::Opening) => self.open_brace(line),
            Some(BraceKind::Closing) => self.close_brace(),
            None if parser::is_flow_breaking(line) => self.break_flow(line),
            None => {}
        }

        match parser::parse_expression_clause(line) {
            Some(ExpressionClause::Bare(_)) => {
                self.snippet_boundary();
                return;
            }
            Some(ExpressionClause::WithContent { .. }) if self.tags.is_active() => {
                self.report(Diagnostic::error(
                    format!("line starts with an expression but has content after the colon: {}", line),
                    origin.clone(),
                ));
            }
            _ => {}
        }

        if let Some(id) = parser::parse_knot(line) {
            self.begin_scene(id, origin);
            return;
        }

        if let Some(id) = parser::parse_stitch(line) {
            self.begin_block(id, origin);
            return;
        }

        if let Some(comment) = parser::parse_comment(line) {
            self.comments.push(comment.to_string());
            return;
        }

        if self.tags.is_active() {
            if let Some(label) = parser::parse_clause_label(line) {
                self.comments.push(label.to_string());
                return;
            }
        }

        if self.handle_beat(line, &origin) {
            return;
        }

        if let Some(tagged) = parser::parse_tagged_line(line) {
            let mut tags = tagged.tags;
            self.tags.apply(&mut tags);
            self.trace(|| format!("non-dialogue line {} at {}", tagged.id, origin));
            self.non_dialogue_lines.push(NonDialogueLine {
                id: tagged.id,
                tags,
                origin,
            });
        }

        self.comments.clear();
    }

    /// Returns true when the line became a beat.
    fn handle_beat(&mut self, line: &str, origin: &Origin) -> bool {
        if let Some(shape) = parser::parse_dialogue(line) {
            if !self.tags.is_active() {
                self.report(Diagnostic::warning(
                    format!("dialogue line outside a #dink-tagged section: {}", line),
                    origin.clone(),
                ));
                return false;
            }
            let beat = Beat::Line(DialogueLine {
                common: BeatCommon {
                    id: shape.id,
                    tags: shape.tags,
                    origin: origin.clone(),
                    ..Default::default()
                },
                speaker_id: shape.speaker_id,
                qualifier: shape.qualifier,
                direction: shape.direction,
                text: shape.text,
            });
            return self.push_beat(beat);
        }

        if !self.tags.is_active() {
            return false;
        }

        match parser::parse_action(line) {
            Some(shape) => {
                let beat = Beat::Action(ActionLine {
                    common: BeatCommon {
                        id: shape.id,
                        tags: shape.tags,
                        origin: origin.clone(),
                        ..Default::default()
                    },
                    r#type: None,
                    text: shape.text,
                });
                self.push_beat(beat)
            }
            None => false,
        }
    }

    fn push_beat(&mut self, mut beat: Beat) -> bool {
        let group = (self.group_level > 0).then_some(self.group_ordinal);
        let comments = mem::take(&mut self.comments);
        let Some(snippet) = self.snippet.as_mut() else {
            // No scene yet: leave the line to the non-dialogue pass.
            self.comments = comments;
            return false;
        };

        let common = beat.common_mut();
        common.comments = comments;
        self.tags.apply(&mut common.tags);
        let missing_id = common.id.is_empty();

        if group.is_some() {
            snippet.group = group;
        }
        if self.options.verbose {
            tracing::debug!("parsed beat: {}", beat);
        }
        if missing_id {
            let message = format!("beat is missing a line id: {}", beat.text());
            let origin = beat.origin().clone();
            snippet.beats.push(beat);
            self.report(Diagnostic::warning(message, origin));
        } else {
            snippet.beats.push(beat);
        }
        true
    }

    fn open_brace(&mut self, line: &str) {
        let node = BraceNode {
            parent: self.brace_top,
            comments: mem::take(&mut self.comments),
        };
        self.braces.push(node);
        self.brace_top = Some(self.braces.len() - 1);
        self.brace_depth += 1;

        if parser::is_group_opener(line) && self.group_level == 0 {
            self.group_level = self.brace_depth;
            self.group_ordinal += 1;
            self.group_members = 0;
            self.trace(|| format!("group {} opened at depth {}", self.group_ordinal, self.brace_depth));
        }
        self.snippet_boundary();
    }

    fn close_brace(&mut self) {
        self.brace_depth = self.brace_depth.saturating_sub(1);
        let group_closed = self.group_level > 0 && self.brace_depth < self.group_level;
        if group_closed {
            self.group_level = 0;
            self.in_options = true;
            self.comments.push(MERGE_COMMENT.to_string());
            self.trace(|| format!("group {} closed", self.group_ordinal));
        }

        if let Some(top) = self.brace_top {
            self.brace_top = self.braces[top].parent;
            self.braces.truncate(top);
        }
        self.snippet_boundary();

        if group_closed {
            self.finish_group();
        }
    }

    fn break_flow(&mut self, line: &str) {
        if self.tags.is_active() && parser::is_flow_breaking_dialogue(line) {
            let saved = mem::take(&mut self.comments);
            self.snippet_boundary();
            self.comments = saved;
            return;
        }

        if let Some(text) = parser::parse_option(line) {
            self.comments.push(format!("OPTION \"{}\"", text));
            self.in_options = true;
        } else if parser::is_gather(line) && self.in_options {
            self.comments.push(MERGE_COMMENT.to_string());
            self.in_options = false;
        } else {
            self.in_options = false;
        }
        self.snippet_boundary();
    }

    /// Comments of the open brace levels, innermost first.
    fn brace_comments(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut cursor = self.brace_top;
        while let Some(idx) = cursor {
            let node = &self.braces[idx];
            out.extend(node.comments.iter().cloned());
            cursor = node.parent;
        }
        out
    }

    fn finish_group(&mut self) {
        let ordinal = self.group_ordinal;
        let count = self.group_members;
        if let Some(block) = self.block.as_mut() {
            for snippet in block.snippets.iter_mut().filter(|s| s.group == Some(ordinal)) {
                snippet.group_count = Some(count);
            }
        }
    }

    fn next_snippet_id(&mut self) -> String {
        let mut id = self.ids.next_id();
        if self.options.unique_snippet_ids {
            let mut attempts = 1;
            while self.issued_ids.contains(&id) && attempts < MAX_ID_ATTEMPTS {
                id = self.ids.next_id();
                attempts += 1;
            }
        }
        self.issued_ids.insert(id.clone());
        id
    }

    fn fresh_snippet(&mut self, comments: Vec<String>) -> Snippet {
        Snippet {
            id: self.next_snippet_id(),
            comments,
            brace_comments: self.brace_comments(),
            ..Default::default()
        }
    }

    fn snippet_boundary(&mut self) {
        if self.block.is_none() {
            self.comments.clear();
            return;
        }
        let mut comments = match self.snippet.take() {
            Some(snippet) if !snippet.beats.is_empty() => {
                self.commit_snippet(snippet);
                Vec::new()
            }
            Some(snippet) => snippet.comments,
            None => Vec::new(),
        };
        comments.append(&mut self.comments);
        self.snippet = Some(self.fresh_snippet(comments));
    }

    fn commit_snippet(&mut self, mut snippet: Snippet) {
        let Some(block) = self.block.as_mut() else {
            return;
        };
        if snippet.beats.is_empty() {
            return;
        }
        snippet.origin = snippet.beats[0].origin().clone();
        if snippet.group.is_some() {
            snippet.group_index = Some(self.group_members);
            self.group_members += 1;
        }
        block.snippets.push(snippet);
    }

    fn commit_block(&mut self) {
        if let Some(snippet) = self.snippet.take() {
            self.commit_snippet(snippet);
        }
        let Some(block) = self.block.take() else {
            return;
        };
        if block.snippets.is_empty() {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.blocks.push(block);
        }
    }

    fn commit_scene(&mut self) {
        self.commit_block();
        if let Some(scene) = self.scene.take() {
            if !scene.blocks.is_empty() {
                self.scenes.push(scene);
            }
        }
    }

    fn begin_scene(&mut self, id: &str, origin: Origin) {
        self.commit_scene();
        self.tags.begin_scene();
        self.trace(|| format!("scene: {}", id));

        self.scene = Some(Scene {
            id: id.to_string(),
            origin: origin.clone(),
            ..Default::default()
        });
        self.block = Some(Block {
            id: String::new(),
            comments: mem::take(&mut self.comments),
            origin,
            ..Default::default()
        });
        self.snippet = Some(self.fresh_snippet(Vec::new()));
    }

    fn begin_block(&mut self, id: &str, origin: Origin) {
        self.commit_block();
        self.tags.begin_block();
        self.trace(|| format!("block: {}", id));

        if self.scene.is_none() {
            // Stitch before any knot: nothing can hold it.
            self.comments.clear();
            return;
        }
        self.block = Some(Block {
            id: id.to_string(),
            comments: mem::take(&mut self.comments),
            origin,
            ..Default::default()
        });
        self.snippet = Some(self.fresh_snippet(Vec::new()));
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error => tracing::error!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.options.verbose {
            tracing::debug!("{}", message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Sequential(u32);

    impl SnippetIdSource for Sequential {
        fn next_id(&mut self) -> String {
            self.0 += 1;
            format!("S{}", self.0)
        }
    }

    fn run(text: &str) -> Extraction {
        Extractor::with_id_source(ExtractOptions::default(), Box::new(Sequential(0)))
            .extract_text(text, "test.ink", None)
    }

    fn beat_texts(snippet: &Snippet) -> Vec<&str> {
        snippet.beats.iter().map(|b| b.text()).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        let out = run("");
        assert!(out.scenes.is_empty());
        assert!(out.non_dialogue_lines.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn simple_scene_block_and_line() {
        let out = run("=== KNOT ===\n#dink\n= STITCH\nCHARACTER: Hello world #id:line1");
        assert_eq!(out.scenes.len(), 1);
        let scene = &out.scenes[0];
        assert_eq!(scene.id, "KNOT");
        assert_eq!(scene.blocks.len(), 1);
        let block = &scene.blocks[0];
        assert_eq!(block.id, "STITCH");
        assert_eq!(block.snippets.len(), 1);
        let snippet = &block.snippets[0];
        assert_eq!(snippet.beats.len(), 1);
        let line = snippet.beats[0].as_line().unwrap();
        assert_eq!(line.speaker_id, "CHARACTER");
        assert_eq!(line.text, "Hello world");
        assert_eq!(line.common.id, "line1");
        assert_eq!(line.common.origin, Origin::new("test.ink", 4));
        assert_eq!(snippet.origin.line_number, 4);
    }

    #[test]
    fn clause_labels_become_comments_and_dash_dialogue_splits() {
        let text = "=== KNOT\n#dink\n2:\n(calculation):\nvariable>2:\n(myknotname):\nFRED: Hello world.\n- FRED: Hello world with dash.";
        let out = run(text);
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 2);
        assert_eq!(beat_texts(snippets[0]), vec!["Hello world."]);
        assert_eq!(
            snippets[0].beats[0].comments(),
            &["2", "(calculation)", "variable>2", "(myknotname)"]
        );
        assert_eq!(beat_texts(snippets[1]), vec!["Hello world with dash."]);
    }

    #[test]
    fn expression_clauses_break_snippets_and_flag_trailing_content() {
        let text = "=== KNOT\n#dink\nA: one #id:a\n- x > 2:\nA: two #id:b\n- y: oops\nA: three #id:c";
        let out = run(text);
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 3);
        assert_eq!(beat_texts(snippets[0]), vec!["one"]);
        assert_eq!(beat_texts(snippets[1]), vec!["two"]);
        assert_eq!(beat_texts(snippets[2]), vec!["three"]);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn comments_attach_to_beats_blocks_and_trailing() {
        let text = "// before knot\n=== KNOT\n#dink\n// about fred\nFRED: Hi #id:a // quietly\n// before stitch\n= S2\nFRED: Bye #id:b";
        let out = run(text);
        let scene = &out.scenes[0];
        assert_eq!(scene.blocks[0].comments, vec!["before knot"]);
        assert_eq!(
            scene.blocks[0].snippets[0].beats[0].comments(),
            &["about fred", "quietly"]
        );
        assert_eq!(scene.blocks[1].comments, vec!["before stitch"]);
    }

    #[test]
    fn unclaimed_comments_are_dropped_after_content() {
        let text = "=== KNOT\n#dink\n// lost\nJust prose.\nFRED: Hi #id:a";
        let out = run(text);
        assert!(out.scenes[0].blocks[0].snippets[0].beats[0].comments().is_empty());
    }

    #[test]
    fn options_and_gathers_queue_synthetic_comments() {
        let text = "=== KNOT\n#dink\nFRED: Pick one. #id:a\n* [Left]\n  FRED: Left it is. #id:b\n* [Right] #id:opt\n  FRED: Right. #id:c\n-\nFRED: Done. #id:d";
        let out = run(text);
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 4);
        assert_eq!(snippets[1].comments, vec!["OPTION \"Left\""]);
        assert_eq!(snippets[2].comments, vec!["OPTION \"Right\""]);
        assert_eq!(snippets[3].comments, vec!["MERGE"]);
        assert_eq!(out.non_dialogue_lines.len(), 1);
        assert_eq!(out.non_dialogue_lines[0].id, "opt");
    }

    #[test]
    fn brace_comments_are_inherited_by_nested_snippets() {
        let text = "=== KNOT\n#dink\n// outer\n{ x > 1\n// inner\n{ y\nFRED: Deep. #id:a\n}\nFRED: Shallow. #id:b\n}\nFRED: Out. #id:c";
        let out = run(text);
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].brace_comments, vec!["inner", "outer"]);
        assert_eq!(snippets[1].brace_comments, vec!["outer"]);
        assert!(snippets[2].brace_comments.is_empty());
    }

    #[test]
    fn repeated_alternative_group_numbers_members() {
        let text = "=== KNOT\n#dink\n{ shuffle:\n- FRED: One. #id:a\n- FRED: Two. #id:b\n}\nFRED: After. #id:c";
        let out = run(text);
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].group, Some(1));
        assert_eq!(snippets[0].group_index, Some(0));
        assert_eq!(snippets[1].group_index, Some(1));
        assert_eq!(snippets[0].group_count, Some(2));
        assert_eq!(snippets[1].group_count, Some(2));
        assert_eq!(snippets[2].group, None);
        assert_eq!(snippets[2].comments, vec!["MERGE"]);
    }

    #[test]
    fn tag_cascade_applies_nearest_scope_first() {
        let text = "#ws:final #loc\n=== KNOT\n#dink #audio\n= S\n#ws:draft\nFRED: Hi #id:a\nSome narration #id:n1";
        let out = run(text);
        let beat = &out.scenes[0].blocks[0].snippets[0].beats[0];
        assert_eq!(beat.tags(), &["ws:draft", "audio", "loc"]);
        assert!(out.non_dialogue_lines.is_empty());
        let action = out.scenes[0].beats().nth(1).unwrap().as_action().unwrap();
        assert_eq!(action.common.id, "n1");
        assert_eq!(action.text, "Some narration");
    }

    #[test]
    fn dialogue_outside_annotation_warns_and_becomes_non_dialogue() {
        let text = "=== KNOT\nFRED: Not annotated. #id:x1\nPlain prose #id:p1 #ws:draft";
        let out = run(text);
        assert!(out.scenes.is_empty());
        let ids: Vec<&str> = out.non_dialogue_lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "p1"]);
        assert_eq!(out.non_dialogue_lines[1].tags, vec!["ws:draft"]);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn empty_containers_are_discarded() {
        let text = "=== EMPTY\n= NOTHING\n=== KNOT\n#dink\n= EMPTY_STITCH\n= FULL\nFRED: Hi #id:a";
        let out = run(text);
        assert_eq!(out.scenes.len(), 1);
        assert_eq!(out.scenes[0].id, "KNOT");
        assert_eq!(out.scenes[0].blocks.len(), 1);
        assert_eq!(out.scenes[0].blocks[0].id, "FULL");
    }

    #[test]
    fn missing_line_id_is_reported() {
        let out = run("=== KNOT\n#dink\nFRED: No id here.");
        assert_eq!(out.scenes[0].blocks[0].snippets[0].beats.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("missing a line id"));
    }

    #[test]
    fn script_statements_do_not_lock_tag_scopes() {
        let text = "INCLUDE other.ink\nVAR x = 1\n#ws:final\n=== KNOT\n#dink\nFRED: Hi #id:a";
        let out = run(text);
        assert_eq!(out.scenes[0].blocks[0].snippets[0].beats[0].tags(), &["ws:final"]);
    }

    #[test]
    fn unique_ids_redraw_on_collision() {
        struct Repeating(Vec<&'static str>);
        impl SnippetIdSource for Repeating {
            fn next_id(&mut self) -> String {
                if self.0.len() > 1 {
                    self.0.remove(0).to_string()
                } else {
                    self.0[0].to_string()
                }
            }
        }
        let options = ExtractOptions {
            unique_snippet_ids: true,
            ..Default::default()
        };
        let ids = Repeating(vec!["AAAA", "AAAA", "BBBB", "CCCC"]);
        let out = Extractor::with_id_source(options, Box::new(ids))
            .extract_text("=== K\n#dink\nA: one #id:a\n- B: two #id:b", "t.ink", None);
        let ids: Vec<&str> = out.snippets().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["AAAA", "BBBB"]);
    }

    #[test]
    fn id_tag_on_tag_line_is_not_inherited() {
        let out = run("=== K\n#dink #id:scene1\nFRED: Hi #id:a\nFRED: Yo");
        let beats: Vec<&Beat> = out.beats().collect();
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[0].id(), "a");
        assert!(beats[0].tags().is_empty());
        assert_eq!(beats[1].id(), "");
        assert!(beats[1].tags().is_empty());
    }

    #[test]
    fn dash_dialogue_keeps_pending_comments_on_its_beat() {
        let out = run("=== K\n#dink\nFRED: first #id:a\n// note\n- FRED: hi #id:b");
        let snippets: Vec<&Snippet> = out.snippets().collect();
        assert_eq!(snippets.len(), 2);
        assert!(snippets[1].comments.is_empty());
        assert_eq!(snippets[1].beats[0].comments(), &["note"]);
    }

    #[test]
    fn dash_dialogue_outside_annotation_moves_comments_to_snippet() {
        let mut extractor =
            Extractor::with_id_source(ExtractOptions::default(), Box::new(Sequential(0)));
        for (idx, line) in ["=== K", "// note", "- FRED: hi #id:b"].iter().enumerate() {
            extractor.handle_line(line, Origin::new("t.ink", idx + 1));
        }
        let snippet = extractor.snippet.as_ref().unwrap();
        assert_eq!(snippet.comments, vec!["note"]);
        assert!(snippet.beats.is_empty());
        assert!(extractor.comments.is_empty());
    }

    #[test]
    fn prose_ending_in_colon_is_not_a_clause_label() {
        let out = run("=== K\n#dink\n// lost\nThe sign reads:\nFRED: Hi #id:a");
        let beat = out.beats().next().unwrap();
        assert!(beat.comments().is_empty());
    }

    #[test]
    fn options_validate_and_load_from_json() {
        let options = ExtractOptions::from_json(r#"{"min_overlap_score": 0.75, "seed": 3}"#).unwrap();
        assert_eq!(options.min_overlap_score, 0.75);
        assert_eq!(options.snippet_id_length, 4);
        assert_eq!(options.seed, Some(3));
        assert!(ExtractOptions::from_json(r#"{"min_overlap_score": 2.0}"#).is_err());
        assert!(ExtractOptions::from_json(r#"{"snippet_id_length": 0}"#).is_err());
    }
}
