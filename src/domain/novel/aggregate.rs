//! Novel Context - 人物名册聚合
//!
//! 小说分章处理时逐章登记人物出场，最后叠加全书的共现关系。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::analysis::RelationshipAnalysis;

/// 人物之间的一条关系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLink {
    pub character: String,
    pub relationship: String,
    pub strength: u32,
}

/// 单个人物的统计
///
/// 不变量:
/// - chapters_appeared 升序且不重复
/// - first/last_appearance_chapter 与 chapters_appeared 首尾一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub mentions_count: u32,
    pub chapters_appeared: Vec<u32>,
    pub first_appearance_chapter: Option<u32>,
    pub last_appearance_chapter: Option<u32>,
    pub relationships: Vec<CharacterLink>,
}

impl CharacterProfile {
    fn new(name: String) -> Self {
        Self {
            name,
            mentions_count: 0,
            chapters_appeared: Vec::new(),
            first_appearance_chapter: None,
            last_appearance_chapter: None,
            relationships: Vec::new(),
        }
    }

    fn record_appearance(&mut self, chapter_number: u32, mentions: u32) {
        self.mentions_count += mentions;
        if let Err(pos) = self.chapters_appeared.binary_search(&chapter_number) {
            self.chapters_appeared.insert(pos, chapter_number);
        }
        self.first_appearance_chapter = self.chapters_appeared.first().copied();
        self.last_appearance_chapter = self.chapters_appeared.last().copied();
    }
}

/// 人物名册（按首次登记顺序）
#[derive(Debug, Clone, Default)]
pub struct CharacterRoster {
    profiles: Vec<CharacterProfile>,
    index: HashMap<String, usize>,
}

impl CharacterRoster {
    pub fn new() -> Self {
        Self::default()
    }

    fn profile_mut(&mut self, name: &str) -> &mut CharacterProfile {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.profiles.push(CharacterProfile::new(name.to_string()));
                let idx = self.profiles.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.profiles[idx]
    }

    /// 登记某章出现的人物，提及次数按章节正文中的出现次数累计
    pub fn record_chapter(&mut self, chapter_number: u32, names: &[String], body: &str) {
        for name in names {
            let mentions = body.matches(name.as_str()).count().max(1) as u32;
            self.profile_mut(name).record_appearance(chapter_number, mentions);
        }
    }

    /// 叠加共现关系，双向写入
    pub fn apply_relationships(&mut self, analysis: &RelationshipAnalysis) {
        for edge in &analysis.relationships {
            let relationship = edge.tier.as_str().to_string();
            self.profile_mut(&edge.source).relationships.push(CharacterLink {
                character: edge.target.clone(),
                relationship: relationship.clone(),
                strength: edge.strength,
            });
            self.profile_mut(&edge.target).relationships.push(CharacterLink {
                character: edge.source.clone(),
                relationship,
                strength: edge.strength,
            });
        }
    }

    /// 已登记的人物名（登记顺序）
    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn into_profiles(self) -> Vec<CharacterProfile> {
        self.profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::RelationshipExtractor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_record_chapters() {
        let mut roster = CharacterRoster::new();
        roster.record_chapter(2, &names(&["Alice", "Bob"]), "Alice and Bob. Alice again.");
        roster.record_chapter(1, &names(&["Alice"]), "Alice alone.");
        roster.record_chapter(2, &names(&["Alice"]), "Alice");

        let profiles = roster.into_profiles();
        assert_eq!(profiles.len(), 2);

        let alice = &profiles[0];
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.mentions_count, 4);
        assert_eq!(alice.chapters_appeared, vec![1, 2]);
        assert_eq!(alice.first_appearance_chapter, Some(1));
        assert_eq!(alice.last_appearance_chapter, Some(2));

        let bob = &profiles[1];
        assert_eq!(bob.mentions_count, 1);
        assert_eq!(bob.chapters_appeared, vec![2]);
    }

    #[test]
    fn test_apply_relationships_both_directions() {
        let text = "Alice met Bob. Bob thanked Alice. Alice and Bob left.";
        let cast = names(&["Alice", "Bob"]);
        let analysis = RelationshipExtractor::default().extract(text, &cast);

        let mut roster = CharacterRoster::new();
        roster.record_chapter(1, &cast, text);
        roster.apply_relationships(&analysis);

        let profiles = roster.into_profiles();
        assert_eq!(profiles[0].relationships.len(), 1);
        assert_eq!(profiles[0].relationships[0].character, "Bob");
        assert_eq!(profiles[0].relationships[0].relationship, "acquainted");
        assert_eq!(profiles[0].relationships[0].strength, 3);
        assert_eq!(profiles[1].relationships[0].character, "Alice");
    }
}
