//! 词频排序
//!
//! 所有按频率排序的地方（实体、关键词）共用同一规则：
//! 频率降序，频率相同时按首次出现的位置升序。

use std::collections::HashMap;

/// 按频率排序，返回 (词, 次数)
pub fn rank_by_frequency<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    // word -> (count, first_seen)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, item) in items.into_iter().enumerate() {
        let entry = counts.entry(item.into()).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first_seen))| (word, count, first_seen))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(word, count, _)| (word, count))
        .collect()
}

/// 取频率最高的前 `limit` 个
pub fn most_common<I, S>(items: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ranked = rank_by_frequency(items);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_by_count_desc() {
        let ranked = rank_by_frequency(["b", "a", "b", "c", "b", "a"]);
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 3),
                ("a".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_ties_broken_by_first_occurrence() {
        let ranked = rank_by_frequency(["zeta", "alpha", "mid", "alpha", "zeta", "mid"]);
        let words: Vec<&str> = ranked.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_most_common_truncates() {
        let ranked = most_common(["a", "b", "c", "a"], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, "a");
        assert_eq!(ranked[1].0, "b");
    }

    #[test]
    fn test_empty_input() {
        let ranked = rank_by_frequency(Vec::<String>::new());
        assert!(ranked.is_empty());
    }
}
