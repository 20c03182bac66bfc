//! 人物关系提取
//!
//! 基于句内共现：同一句子里出现的两个人物记一次共现，
//! 共现超过一次的组合成为关系边。
//! 名字匹配是小写子串包含，"Al" 会匹配 "Always"，这是已知的高估。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::language::LanguageSupport;

static RE_SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence end regex"));

/// 关系强度分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipTier {
    VeryClose,
    Close,
    Acquainted,
    MentionedTogether,
}

impl RelationshipTier {
    /// 由共现次数推断：>10 / >5 / >2 / 其余
    pub fn from_strength(strength: u32) -> Self {
        if strength > 10 {
            RelationshipTier::VeryClose
        } else if strength > 5 {
            RelationshipTier::Close
        } else if strength > 2 {
            RelationshipTier::Acquainted
        } else {
            RelationshipTier::MentionedTogether
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipTier::VeryClose => "very_close",
            RelationshipTier::Close => "close",
            RelationshipTier::Acquainted => "acquainted",
            RelationshipTier::MentionedTogether => "mentioned_together",
        }
    }
}

/// 关系边，(source, target) 为排序后的无序对
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source: String,
    pub target: String,
    pub strength: u32,
    #[serde(rename = "relationship_type")]
    pub tier: RelationshipTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// 关系网络（可直接用于前端可视化）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl NetworkGraph {
    /// 某个节点的所有邻居及权重
    pub fn neighbors(&self, id: &str) -> Vec<(&str, u32)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == id {
                    Some((edge.target.as_str(), edge.weight))
                } else if edge.target == id {
                    Some((edge.source.as_str(), edge.weight))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipAnalysis {
    pub relationships: Vec<RelationshipEdge>,
    pub network: NetworkGraph,
}

/// 关系提取器
#[derive(Debug, Clone, Default)]
pub struct RelationshipExtractor {
    language: LanguageSupport,
}

impl RelationshipExtractor {
    pub fn new(language: LanguageSupport) -> Self {
        Self { language }
    }

    /// 分句：有模型用模型，否则按 `[.!?]+` 切分
    pub fn sentences(&self, text: &str) -> Vec<String> {
        match &self.language {
            LanguageSupport::Model(model) => model.sentences(text),
            LanguageSupport::Basic => split_sentences(text),
        }
    }

    /// 分析人物关系
    pub fn extract(&self, text: &str, names: &[String]) -> RelationshipAnalysis {
        if names.is_empty() {
            return RelationshipAnalysis::default();
        }

        let lowered: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();

        // 保持首次出现顺序
        let mut order: Vec<(String, String)> = Vec::new();
        let mut counts: HashMap<(String, String), u32> = HashMap::new();

        for sentence in self.sentences(text) {
            let sentence = sentence.to_lowercase();
            let present: Vec<&String> = names
                .iter()
                .zip(&lowered)
                .filter(|(_, lower)| sentence.contains(lower.as_str()))
                .map(|(name, _)| name)
                .collect();

            for (i, first) in present.iter().enumerate() {
                for second in &present[i + 1..] {
                    if first == second {
                        continue;
                    }
                    let key = if first <= second {
                        ((*first).clone(), (*second).clone())
                    } else {
                        ((*second).clone(), (*first).clone())
                    };
                    let count = counts.entry(key.clone()).or_insert_with(|| {
                        order.push(key);
                        0
                    });
                    *count += 1;
                }
            }
        }

        let relationships: Vec<RelationshipEdge> = order
            .into_iter()
            .filter_map(|key| {
                let strength = counts.get(&key).copied().unwrap_or_default();
                (strength > 1).then(|| RelationshipEdge {
                    source: key.0,
                    target: key.1,
                    strength,
                    tier: RelationshipTier::from_strength(strength),
                })
            })
            .collect();

        let network = NetworkGraph {
            nodes: names
                .iter()
                .map(|name| NetworkNode {
                    id: name.clone(),
                    label: name.clone(),
                })
                .collect(),
            edges: relationships
                .iter()
                .map(|rel| NetworkEdge {
                    source: rel.source.clone(),
                    target: rel.target.clone(),
                    weight: rel.strength,
                })
                .collect(),
        };

        RelationshipAnalysis {
            relationships,
            network,
        }
    }
}

/// 基础分句
pub fn split_sentences(text: &str) -> Vec<String> {
    RE_SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::language::{LinguisticModel, NamedEntity, Token};
    use std::sync::Arc;

    /// 按行分句的模型
    struct LineModel;

    impl LinguisticModel for LineModel {
        fn entities(&self, _text: &str) -> Vec<NamedEntity> {
            Vec::new()
        }

        fn sentences(&self, text: &str) -> Vec<String> {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        }

        fn tokens(&self, _text: &str) -> Vec<Token> {
            Vec::new()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_names_empty_graph() {
        let analysis = RelationshipExtractor::default().extract("Alice and Bob.", &[]);
        assert!(analysis.relationships.is_empty());
        assert!(analysis.network.nodes.is_empty());
        assert!(analysis.network.edges.is_empty());
    }

    #[test]
    fn test_two_cooccurrences_mentioned_together() {
        let text = "Alice met Bob. Bob thanked Alice. Carol left.";
        let analysis =
            RelationshipExtractor::default().extract(text, &names(&["Alice", "Bob", "Carol"]));

        assert_eq!(analysis.relationships.len(), 1);
        let edge = &analysis.relationships[0];
        assert_eq!(edge.source, "Alice");
        assert_eq!(edge.target, "Bob");
        assert_eq!(edge.strength, 2);
        assert_eq!(edge.tier, RelationshipTier::MentionedTogether);

        // Carol 没有边但仍是节点
        assert_eq!(analysis.network.nodes.len(), 3);
        assert_eq!(analysis.network.nodes[2].id, "Carol");
        assert_eq!(analysis.network.edges.len(), 1);
    }

    #[test]
    fn test_three_cooccurrences_acquainted() {
        let text = "Alice met Bob. Bob thanked Alice! Alice and Bob walked?";
        let analysis = RelationshipExtractor::default().extract(text, &names(&["Bob", "Alice"]));

        let edge = &analysis.relationships[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("Alice", "Bob"));
        assert_eq!(edge.tier, RelationshipTier::Acquainted);
    }

    #[test]
    fn test_single_cooccurrence_dropped() {
        let text = "Alice met Bob. Alice slept.";
        let analysis = RelationshipExtractor::default().extract(text, &names(&["Alice", "Bob"]));
        assert!(analysis.relationships.is_empty());
        assert_eq!(analysis.network.nodes.len(), 2);
    }

    #[test]
    fn test_tier_cut_points() {
        assert_eq!(RelationshipTier::from_strength(2), RelationshipTier::MentionedTogether);
        assert_eq!(RelationshipTier::from_strength(3), RelationshipTier::Acquainted);
        assert_eq!(RelationshipTier::from_strength(5), RelationshipTier::Acquainted);
        assert_eq!(RelationshipTier::from_strength(6), RelationshipTier::Close);
        assert_eq!(RelationshipTier::from_strength(10), RelationshipTier::Close);
        assert_eq!(RelationshipTier::from_strength(11), RelationshipTier::VeryClose);
    }

    #[test]
    fn test_substring_match_overcounts() {
        // "Al" 被 "Always" 命中
        let text = "Always Bob. Always Bob.";
        let analysis = RelationshipExtractor::default().extract(text, &names(&["Al", "Bob"]));
        assert_eq!(analysis.relationships.len(), 1);
        assert_eq!(analysis.relationships[0].strength, 2);
    }

    #[test]
    fn test_duplicate_names_not_paired_with_themselves() {
        let text = "Alice. Alice.";
        let analysis = RelationshipExtractor::default().extract(text, &names(&["Alice", "Alice"]));
        assert!(analysis.relationships.is_empty());
        assert_eq!(analysis.network.nodes.len(), 2);
    }

    #[test]
    fn test_edges_keep_first_seen_order() {
        let text = "Cid and Dan. Cid and Dan. Amy and Ben. Amy and Ben.";
        let analysis = RelationshipExtractor::default()
            .extract(text, &names(&["Amy", "Ben", "Cid", "Dan"]));
        let pairs: Vec<(&str, &str)> = analysis
            .relationships
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Cid", "Dan"), ("Amy", "Ben")]);
    }

    #[test]
    fn test_neighbors() {
        let text = "Alice met Bob. Bob thanked Alice.";
        let analysis = RelationshipExtractor::default().extract(text, &names(&["Alice", "Bob"]));
        assert_eq!(analysis.network.neighbors("Alice"), vec![("Bob", 2)]);
        assert!(analysis.network.neighbors("Nobody").is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two!! Three?... ");
        assert_eq!(sentences, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_edge_serializes_relationship_type() {
        let edge = RelationshipEdge {
            source: "A".into(),
            target: "B".into(),
            strength: 4,
            tier: RelationshipTier::Acquainted,
        };
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["relationship_type"], "acquainted");
    }

    #[test]
    fn test_model_sentences_drive_weights() {
        // 句号不断句，换行才断句
        let text = "Alice left. Bob stayed. Carol too.\nAlice. Bob.\nAlice waved. Carol.";
        let people = names(&["Alice", "Bob", "Carol"]);

        let model = RelationshipExtractor::new(LanguageSupport::with_model(Arc::new(LineModel)));
        assert_eq!(model.sentences(text).len(), 3);

        let analysis = model.extract(text, &people);
        let weights: Vec<(&str, &str, u32)> = analysis
            .relationships
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str(), r.strength))
            .collect();
        assert_eq!(weights, vec![("Alice", "Bob", 2), ("Alice", "Carol", 2)]);
        assert!(analysis
            .relationships
            .iter()
            .all(|r| r.tier == RelationshipTier::MentionedTogether));
        assert_eq!(analysis.network.edges.len(), 2);

        // 基础分句下每句只有一个名字
        let basic = RelationshipExtractor::default().extract(text, &people);
        assert!(basic.relationships.is_empty());
    }
}
