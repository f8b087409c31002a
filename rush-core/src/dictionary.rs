use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, Node>,
    is_word: bool,
}

/// Prefix-tree membership index over the word list. Built once at startup,
/// read-only afterwards; exact full-word matches only.
#[derive(Debug)]
pub struct Dictionary {
    root: Node,
    len: usize,
}

impl Dictionary {
    /// Build from a newline-separated word list; empty lines are skipped.
    pub fn new(word_list: &str) -> Self {
        let mut dict = Self {
            root: Node::default(),
            len: 0,
        };
        for line in word_list.lines() {
            let word = line.trim();
            if !word.is_empty() {
                dict.insert(word);
            }
        }
        dict
    }

    fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        if !node.is_word {
            node.is_word = true;
            self.len += 1;
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        let mut node = &self.root;
        for ch in word.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.is_word
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Normalization applied to submitted answers before any lookup: strip
/// whitespace, lowercase, fold ё into е (the word list spells both as е).
pub fn normalize_answer(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dictionary() -> Dictionary {
        Dictionary::new("кот\nкоторый\nмост\n\nслово\n")
    }

    #[test]
    fn test_inserted_words_are_members() {
        let dict = test_dictionary();
        assert!(dict.contains("кот"));
        assert!(dict.contains("который"));
        assert!(dict.contains("слово"));
        assert_eq!(dict.len(), 4);
    }

    #[test]
    fn test_prefixes_are_not_members() {
        let dict = test_dictionary();
        // "кото" is a prefix of "который" but was never inserted itself
        assert!(!dict.contains("кото"));
        assert!(!dict.contains("мос"));
        assert!(!dict.contains("словом"));
        assert!(!dict.contains("дом"));
    }

    #[test]
    fn test_empty_string_is_never_a_member() {
        assert!(!test_dictionary().contains(""));
        assert!(!Dictionary::new("").contains(""));
    }

    #[test]
    fn test_duplicate_words_counted_once() {
        let dict = Dictionary::new("кот\nкот\nкот");
        assert_eq!(dict.len(), 1);
        assert!(dict.contains("кот"));
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("Ёжик"), "ежик");
        assert_eq!(normalize_answer("при мер"), "пример");
        assert_eq!(normalize_answer("СЛОВО"), "слово");
        assert_eq!(normalize_answer(""), "");
    }
}
