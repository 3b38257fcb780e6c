use crate::types::Origin;

/// One logical line after block comments are removed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub text: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceKind {
    Opening,
    Closing,
}

/// `SPEAKER (qualifier): (direction) text #tags`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogueShape {
    pub speaker_id: String,
    pub qualifier: Option<String>,
    pub direction: Option<String>,
    pub text: String,
    pub id: String,
    pub tags: Vec<String>,
}

/// Free text followed by at least one tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionShape {
    pub text: String,
    pub id: String,
    pub tags: Vec<String>,
}

/// `- clause:` with or without something after the colon.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionClause {
    Bare(String),
    WithContent { clause: String, rest: String },
}

/// Id and remaining tags pulled from a line outside the annotation grammar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaggedLine {
    pub id: String,
    pub tags: Vec<String>,
}
