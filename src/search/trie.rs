//! A character trie over note titles with a side map for exact hashtag
//! lookup, plus the staleness contract the registry builds on.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::flat::FlatNotepad;
use crate::model::InternalRef;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    refs: Vec<InternalRef>,
}

/// Search index for one notepad: title-prefix search through the trie,
/// exact-match search through the hashtag map.
///
/// Title keys and queries are lowercased on the way in, mirroring the
/// case-insensitive title match on [`crate::model::Note::search`]. Hashtag
/// keys are exact, stored as written.
#[derive(Debug, Clone)]
pub struct Trie {
    root: TrieNode,
    hashtags: HashMap<String, Vec<InternalRef>>,
    size: usize,
    built_at: DateTime<Utc>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
            hashtags: HashMap::new(),
            size: 0,
            built_at: Utc::now(),
        }
    }

    /// Builds a whole index from a flat projection: one title entry per
    /// note plus one hashtag entry per extracted tag.
    pub fn from_flat(flat: &FlatNotepad) -> Self {
        let mut trie = Trie::new();
        for (internal_ref, note) in &flat.notes {
            trie.add(&note.title, internal_ref.clone());
            for tag in note.get_hashtags() {
                trie.add(&tag, internal_ref.clone());
            }
        }
        trie
    }

    /// Inserts a key/ref pair.
    ///
    /// `#`-prefixed keys land in the hashtag map, ordered and
    /// deduplicated (re-inserting the same ref is a no-op). Anything else
    /// is walked into the trie character by character, and the insertion
    /// counter advances unconditionally — duplicate title inserts are
    /// counted, not collapsed.
    pub fn add(&mut self, key: &str, internal_ref: InternalRef) {
        if key.starts_with('#') {
            let bucket = self.hashtags.entry(key.to_string()).or_default();
            if !bucket.contains(&internal_ref) {
                bucket.push(internal_ref);
            }
            return;
        }

        let mut node = &mut self.root;
        for ch in key.to_lowercase().chars() {
            node = node.children.entry(ch).or_default();
        }
        node.refs.push(internal_ref);
        self.size += 1;
    }

    /// Answers a query with a deduplicated set of note refs.
    ///
    /// `#`-prefixed queries are exact hashtag lookups — no prefix
    /// matching. Other queries are prefix matches: descend the trie and
    /// collect the reached node's whole subtree. A missing path is an
    /// empty result, never an error; the empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<InternalRef> {
        if query.starts_with('#') {
            return self.hashtags.get(query).cloned().unwrap_or_default();
        }

        let mut node = &self.root;
        for ch in query.to_lowercase().chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        collect_subtree(node, &mut seen, &mut results);
        results
    }

    /// Number of title insertions this index holds. Not the number of
    /// distinct notes: duplicate inserts count.
    pub fn size(&self) -> usize {
        self.size
    }

    /// When this index was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Whether this index must be rebuilt before querying.
    ///
    /// Stale when the index's own build stamp is strictly ahead of the
    /// supplied one, or when the supplied note count drifts from the
    /// title-insertion count. The comparison direction is deliberate;
    /// do not invert it.
    pub fn should_reindex(&self, last_modified: DateTime<Utc>, note_count: usize) -> bool {
        self.built_at > last_modified || note_count != self.size
    }
}

fn collect_subtree(node: &TrieNode, seen: &mut HashSet<InternalRef>, results: &mut Vec<InternalRef>) {
    for internal_ref in &node.refs {
        if seen.insert(internal_ref.clone()) {
            results.push(internal_ref.clone());
        }
    }
    for child in node.children.values() {
        collect_subtree(child, seen, results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn r(s: &str) -> InternalRef {
        s.to_string()
    }

    #[test]
    fn test_prefix_search_collects_subtree() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        trie.add("car", r("ref2"));

        let mut both = trie.search("ca");
        both.sort();
        assert_eq!(both, vec!["ref1", "ref2"]);
        assert_eq!(trie.search("cat"), vec!["ref1"]);
    }

    #[test]
    fn test_missing_path_is_empty_not_an_error() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        assert!(trie.search("dog").is_empty());
        assert!(trie.search("cats").is_empty());
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        trie.add("dog", r("ref2"));
        let mut all = trie.search("");
        all.sort();
        assert_eq!(all, vec!["ref1", "ref2"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut trie = Trie::new();
        trie.add("Cat Pictures", r("ref1"));
        assert_eq!(trie.search("cat"), vec!["ref1"]);
        assert_eq!(trie.search("CAT"), vec!["ref1"]);
    }

    #[test]
    fn test_results_are_deduplicated() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        trie.add("cat", r("ref1"));
        assert_eq!(trie.search("cat"), vec!["ref1"]);
        // But the insertion counter is not.
        assert_eq!(trie.size(), 2);
    }

    #[test]
    fn test_hashtags_are_exact_match_only() {
        let mut trie = Trie::new();
        trie.add("#todo", r("refA"));
        assert_eq!(trie.search("#todo"), vec!["refA"]);
        assert!(trie.search("#tod").is_empty());
        assert!(trie.search("#todos").is_empty());
    }

    #[test]
    fn test_hashtag_reinsert_is_a_noop() {
        let mut trie = Trie::new();
        trie.add("#todo", r("refA"));
        trie.add("#todo", r("refA"));
        trie.add("#todo", r("refB"));
        assert_eq!(trie.search("#todo"), vec!["refA", "refB"]);
        // Hashtag inserts never advance the title counter.
        assert_eq!(trie.size(), 0);
    }

    #[test]
    fn test_should_reindex_on_count_drift() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        let later = trie.built_at() + Duration::seconds(5);
        assert!(!trie.should_reindex(later, 1));
        assert!(trie.should_reindex(later, 2));
        assert!(trie.should_reindex(later, 0));
    }

    #[test]
    fn test_should_reindex_when_build_stamp_is_ahead() {
        let mut trie = Trie::new();
        trie.add("cat", r("ref1"));
        let earlier = trie.built_at() - Duration::seconds(5);
        assert!(trie.should_reindex(earlier, 1));
    }
}
