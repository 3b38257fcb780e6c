use crate::parser::ID_PREFIX;

/// Reserved tag that switches the annotation grammar on.
pub const ANNOTATION_TAG: &str = "dink";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScope {
    Document,
    Scene,
    Block,
}

/// Document, scene and block tag scopes; a scope locks once its level has seen content.
#[derive(Debug, Default)]
pub struct TagCascade {
    document: Vec<String>,
    scene: Vec<String>,
    block: Vec<String>,
    document_seen: bool,
    scene_seen: bool,
    block_seen: bool,
    document_active: bool,
    active: bool,
}

impl TagCascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stores the tokens of a tag-only line and returns the scope that took them.
    pub fn route(&mut self, tokens: Vec<String>) -> Option<TagScope> {
        let (dink, tokens): (Vec<String>, Vec<String>) = tokens
            .into_iter()
            .filter(|t| !t.starts_with(ID_PREFIX))
            .partition(|t| t == ANNOTATION_TAG);

        let scope = if !self.document_seen {
            Some(TagScope::Document)
        } else if !self.scene_seen {
            Some(TagScope::Scene)
        } else if !self.block_seen {
            Some(TagScope::Block)
        } else {
            None
        };

        if !dink.is_empty() {
            self.active = true;
            if scope == Some(TagScope::Document) {
                self.document_active = true;
            }
        }

        let target = match scope? {
            TagScope::Document => &mut self.document,
            TagScope::Scene => &mut self.scene,
            TagScope::Block => &mut self.block,
        };
        target.extend(tokens);
        scope
    }

    pub fn mark_content(&mut self) {
        self.document_seen = true;
        self.scene_seen = true;
        self.block_seen = true;
    }

    pub fn begin_scene(&mut self) {
        self.scene.clear();
        self.block.clear();
        self.scene_seen = false;
        self.block_seen = false;
        self.active = self.document_active;
    }

    pub fn begin_block(&mut self) {
        self.block.clear();
        self.block_seen = false;
    }

    pub fn scope(&self, scope: TagScope) -> &[String] {
        match scope {
            TagScope::Document => &self.document,
            TagScope::Scene => &self.scene,
            TagScope::Block => &self.block,
        }
    }

    /// Appends inherited tags, block scope first.
    pub fn apply(&self, tags: &mut Vec<String>) {
        for source in [&self.block, &self.scene, &self.document] {
            for tag in source {
                if should_inherit(tags, tag) {
                    tags.push(tag.clone());
                }
            }
        }
    }
}

fn namespace(tag: &str) -> Option<&str> {
    tag.find(':').map(|idx| &tag[..=idx])
}

fn should_inherit(existing: &[String], tag: &str) -> bool {
    match namespace(tag) {
        Some(ns) => !existing.iter().any(|t| t.starts_with(ns)),
        None => !existing.iter().any(|t| t == tag),
    }
}
