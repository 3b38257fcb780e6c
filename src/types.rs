use crate::error::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an entity came from: the logical source path and a 1-based line number.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub source_path: String,
    pub line_number: usize,
}

impl Origin {
    pub fn new(source_path: impl Into<String>, line_number: usize) -> Self {
        Self {
            source_path: source_path.into(),
            line_number,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_path, self.line_number)
    }
}

/// Fields shared by every beat variant.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BeatCommon {
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub origin: Origin,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DialogueLine {
    #[serde(flatten)]
    pub common: BeatCommon,
    pub speaker_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qualifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub direction: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ActionLine {
    #[serde(flatten)]
    pub common: BeatCommon,
    // Reserved: nothing in the annotation grammar populates it yet.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub r#type: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "beat", rename_all = "lowercase")]
pub enum Beat {
    Line(DialogueLine),
    Action(ActionLine),
}

impl Beat {
    pub fn common(&self) -> &BeatCommon {
        match self {
            Beat::Line(line) => &line.common,
            Beat::Action(action) => &action.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut BeatCommon {
        match self {
            Beat::Line(line) => &mut line.common,
            Beat::Action(action) => &mut action.common,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn text(&self) -> &str {
        match self {
            Beat::Line(line) => &line.text,
            Beat::Action(action) => &action.text,
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.common().tags
    }

    pub fn comments(&self) -> &[String] {
        &self.common().comments
    }

    pub fn origin(&self) -> &Origin {
        &self.common().origin
    }

    /// Tags belonging to any of the given namespaces (`ws` matches `ws` and `ws:draft`).
    pub fn tags_for(&self, namespaces: &[&str]) -> Vec<&str> {
        tags_for(&self.common().tags, namespaces)
    }

    pub fn as_line(&self) -> Option<&DialogueLine> {
        match self {
            Beat::Line(line) => Some(line),
            Beat::Action(_) => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionLine> {
        match self {
            Beat::Action(action) => Some(action),
            Beat::Line(_) => None,
        }
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.id())?;
        match self {
            Beat::Line(line) => {
                write!(f, "Line | Speaker: {}", line.speaker_id)?;
                if let Some(q) = &line.qualifier {
                    write!(f, " | Qualifier: {}", q)?;
                }
                if let Some(d) = &line.direction {
                    write!(f, " | Direction: {}", d)?;
                }
            }
            Beat::Action(action) => {
                write!(f, "Action")?;
                if let Some(t) = &action.r#type {
                    write!(f, " | Type: {}", t)?;
                }
            }
        }
        write!(f, " | Text: \"{}\"", self.text())?;
        if !self.tags().is_empty() {
            write!(f, " | Tags:")?;
            for tag in self.tags() {
                write!(f, " #{}", tag)?;
            }
        }
        if !self.comments().is_empty() {
            write!(f, " | Comments:")?;
            for comment in self.comments() {
                write!(f, " '{}'", comment)?;
            }
        }
        Ok(())
    }
}

/// Consecutive beats sharing one authoring context.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Snippet {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub brace_comments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_count: Option<u32>,
    #[serde(default)]
    pub origin: Origin,
    pub beats: Vec<Beat>,
}

impl Snippet {
    pub fn beat_ids(&self) -> impl Iterator<Item = &str> {
        self.beats.iter().map(|b| b.id())
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snippet:{} Beats:{}", self.id, self.beats.len())?;
        if let (Some(group), Some(index)) = (self.group, self.group_index) {
            write!(f, " Group:{}#{}", group, index)?;
        }
        for beat in &self.beats {
            write!(f, "\n    {}", beat)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Block {
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub origin: Origin,
    pub snippets: Vec<Snippet>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block:{} Snippets:{}", self.id, self.snippets.len())?;
        for snippet in &self.snippets {
            for line in snippet.to_string().lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Scene {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub origin: Origin,
    pub blocks: Vec<Block>,
}

impl Scene {
    pub fn snippets(&self) -> impl Iterator<Item = &Snippet> {
        self.blocks.iter().flat_map(|b| b.snippets.iter())
    }

    pub fn beats(&self) -> impl Iterator<Item = &Beat> {
        self.snippets().flat_map(|s| s.beats.iter())
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene:{} Blocks:{}", self.id, self.blocks.len())?;
        for block in &self.blocks {
            for line in block.to_string().lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

/// A line outside the annotation grammar that still declares an `#id:` tag.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NonDialogueLine {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub origin: Origin,
}

impl NonDialogueLine {
    pub fn tags_for(&self, namespaces: &[&str]) -> Vec<&str> {
        tags_for(&self.tags, namespaces)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Extraction {
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub non_dialogue_lines: Vec<NonDialogueLine>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty() && self.non_dialogue_lines.is_empty()
    }

    pub fn snippets(&self) -> impl Iterator<Item = &Snippet> {
        self.scenes.iter().flat_map(|s| s.snippets())
    }

    pub fn beats(&self) -> impl Iterator<Item = &Beat> {
        self.scenes.iter().flat_map(|s| s.beats())
    }

    pub fn beat_ids(&self) -> Vec<&str> {
        self.beats().map(|b| b.id()).filter(|id| !id.is_empty()).collect()
    }
}

fn tags_for<'a>(tags: &'a [String], namespaces: &[&str]) -> Vec<&'a str> {
    tags.iter()
        .map(|t| t.as_str())
        .filter(|tag| {
            let ns = tag.split_once(':').map_or(*tag, |(ns, _)| ns);
            namespaces.contains(&ns)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, tags: &[&str]) -> Beat {
        Beat::Line(DialogueLine {
            common: BeatCommon {
                id: id.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            speaker_id: "FRED".to_string(),
            text: "Hello".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn tags_for_matches_namespace_and_bare_tag() {
        let beat = line("a1", &["ws:draft", "loc", "audio:none", "wsx:no"]);
        assert_eq!(beat.tags_for(&["ws"]), vec!["ws:draft"]);
        assert_eq!(beat.tags_for(&["loc", "audio"]), vec!["loc", "audio:none"]);
        assert!(beat.tags_for(&["missing"]).is_empty());
    }

    #[test]
    fn beat_serializes_with_variant_tag_and_flattened_fields() {
        let beat = line("a1", &["ws:draft"]);
        let value = serde_json::to_value(&beat).unwrap();
        assert_eq!(value["beat"], "line");
        assert_eq!(value["id"], "a1");
        assert_eq!(value["speaker_id"], "FRED");
        assert!(value.get("qualifier").is_none());

        let back: Beat = serde_json::from_value(value).unwrap();
        assert_eq!(back, beat);
    }

    #[test]
    fn display_dump_lists_beats_under_snippet() {
        let snippet = Snippet {
            id: "Ab12".to_string(),
            beats: vec![line("a1", &["loc"])],
            ..Default::default()
        };
        let dump = snippet.to_string();
        assert!(dump.starts_with("Snippet:Ab12 Beats:1"));
        assert!(dump.contains("[a1] Line | Speaker: FRED | Text: \"Hello\" | Tags: #loc"));
    }
}
