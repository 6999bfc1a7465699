//! Alias normalization for entity tokens.

/// Phrase → canonical token table, owned by the matcher.
///
/// Phrases are matched greedily, longest first, over the token stream.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(Vec<String>, String)>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in aliases for common assets, teams and places.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (phrase, canonical) in DEFAULT_ALIASES {
            table.add(phrase.split_whitespace(), canonical);
        }
        table
    }

    /// Map a token phrase to a canonical token. Re-adding a phrase replaces it.
    pub fn add<I, S>(&mut self, tokens: I, canonical: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrase: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if phrase.is_empty() {
            return;
        }
        let canonical = canonical.trim().to_lowercase();
        self.entries.retain(|(existing, _)| existing != &phrase);
        self.entries.push((phrase, canonical));
        self.entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every aliased phrase in `tokens` with its canonical form.
    #[must_use]
    pub fn normalize(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        'outer: while i < tokens.len() {
            for (phrase, canonical) in &self.entries {
                let end = i + phrase.len();
                if end <= tokens.len() && tokens[i..end] == phrase[..] {
                    out.push(canonical.clone());
                    i = end;
                    continue 'outer;
                }
            }
            out.push(tokens[i].clone());
            i += 1;
        }
        out
    }
}

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("xbt", "bitcoin"),
    ("eth", "ethereum"),
    ("ether", "ethereum"),
    ("sol", "solana"),
    ("doge", "dogecoin"),
    ("xrp", "ripple"),
    ("federal reserve", "fed"),
    ("united states", "usa"),
    ("us", "usa"),
    ("u s", "usa"),
    ("united kingdom", "uk"),
    ("gop", "republican"),
    ("republicans", "republican"),
    ("democrats", "democrat"),
    ("dem", "democrat"),
    ("dems", "democrat"),
    ("potus", "president"),
    ("los angeles lakers", "lakers"),
    ("la lakers", "lakers"),
    ("boston celtics", "celtics"),
    ("golden state warriors", "warriors"),
    ("golden state", "warriors"),
    ("gsw", "warriors"),
    ("new york knicks", "knicks"),
    ("ny knicks", "knicks"),
    ("kansas city chiefs", "chiefs"),
    ("kc chiefs", "chiefs"),
    ("philadelphia eagles", "eagles"),
    ("philly", "philadelphia"),
    ("san francisco 49ers", "49ers"),
    ("sf 49ers", "49ers"),
    ("niners", "49ers"),
    ("new england patriots", "patriots"),
    ("pats", "patriots"),
    ("dallas cowboys", "cowboys"),
    ("new york yankees", "yankees"),
    ("ny yankees", "yankees"),
    ("los angeles dodgers", "dodgers"),
    ("la dodgers", "dodgers"),
    ("man utd", "manchester united"),
    ("man united", "manchester united"),
    ("man city", "manchester city"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn longest_phrase_wins() {
        let table = AliasTable::with_defaults();
        let out = table.normalize(&tokens("golden state warriors vs la lakers"));
        assert_eq!(out, tokens("warriors vs lakers"));
    }

    #[test]
    fn runtime_alias_extends_table() {
        let mut table = AliasTable::new();
        table.add(["the", "king"], "lebron");
        assert_eq!(table.normalize(&tokens("the king scores")), tokens("lebron scores"));
    }

    #[test]
    fn re_adding_a_phrase_replaces_canonical() {
        let mut table = AliasTable::new();
        table.add(["btc"], "bitcoin");
        table.add(["btc"], "xbt");
        assert_eq!(table.len(), 1);
        assert_eq!(table.normalize(&tokens("btc")), tokens("xbt"));
    }
}
